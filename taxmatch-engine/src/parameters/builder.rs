//! Parameter builder
//!
//! Computes a candidate's stored probabilities for its signature by asking a
//! [`ParameterAnalyser`] for each compiled slot. Every value is clamped into
//! `[floor, 1 - floor]` so no branch of the inference ever has zero mass.
//! Slots the corpus cannot support degrade to defaults and are reported,
//! never failing the build.

use crate::error::{BuildError, InferenceError};
use crate::model::Classifier;
use crate::network::{CompiledNetwork, Slot};
use crate::parameters::{ParameterStore, Parameters};
use crate::services::{Observation, ParameterAnalyser};
use std::sync::Arc;
use taxmatch_common::config::BuilderConfig;
use tracing::{debug, info, warn};

/// Parameters for one candidate plus the slots that fell back to defaults
#[derive(Debug, Clone)]
pub struct BuiltParameters {
    pub parameters: Parameters,
    pub degraded: Vec<BuildError>,
}

/// Outcome of a batch build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub built: usize,
    pub degraded: Vec<BuildError>,
}

pub struct ParameterBuilder {
    network: Arc<CompiledNetwork>,
    analyser: Arc<dyn ParameterAnalyser>,
    floor: f64,
    default_probability: f64,
}

impl ParameterBuilder {
    pub fn new(
        network: Arc<CompiledNetwork>,
        analyser: Arc<dyn ParameterAnalyser>,
        config: &BuilderConfig,
    ) -> Self {
        Self {
            network,
            analyser,
            floor: config.epistemic_floor,
            default_probability: config.default_probability,
        }
    }

    fn clamp(&self, p: f64) -> f64 {
        if p.is_nan() {
            return self.floor;
        }
        p.clamp(self.floor, 1.0 - self.floor)
    }

    /// Build the parameters for a candidate's own signature
    pub fn build(&self, candidate: &dyn Classifier) -> Result<BuiltParameters, InferenceError> {
        let compiled = self.network.get(candidate.signature())?;
        let schema = self.network.schema();
        let mut degraded = Vec::new();

        let vector: Vec<f64> = compiled
            .slots()
            .iter()
            .map(|slot| {
                let estimate = match *slot {
                    Slot::Prior => self.analyser.compute_prior(candidate),
                    Slot::Conditional {
                        observable,
                        given,
                        positive,
                    } => {
                        let condition = match given {
                            Some(parent) => Observation::Value {
                                observable: parent,
                                positive,
                            },
                            None => Observation::Hypothesis { positive },
                        };
                        self.analyser.compute_conditional(
                            candidate,
                            Observation::Value {
                                observable,
                                positive: true,
                            },
                            &[condition],
                        )
                    }
                    Slot::PresenceGiven {
                        observable,
                        present,
                    } => self.analyser.compute_conditional(
                        candidate,
                        Observation::Value {
                            observable,
                            positive: true,
                        },
                        &[Observation::Present {
                            observable: present,
                        }],
                    ),
                    Slot::PresenceLink {
                        present,
                        given_present,
                    } => self.analyser.compute_conditional(
                        candidate,
                        Observation::Present {
                            observable: present,
                        },
                        &[Observation::Present {
                            observable: given_present,
                        }],
                    ),
                    Slot::Presence {
                        present,
                        given,
                        positive,
                    } => self.analyser.compute_conditional(
                        candidate,
                        Observation::Present {
                            observable: present,
                        },
                        &[Observation::Value {
                            observable: given,
                            positive,
                        }],
                    ),
                };

                match estimate {
                    Some(p) => self.clamp(p),
                    None => {
                        let (error, fallback) = match slot {
                            Slot::Prior => (
                                BuildError::MissingPrior(candidate.id().to_string()),
                                self.floor,
                            ),
                            _ => (
                                BuildError::InsufficientCorpus {
                                    candidate: candidate.id().to_string(),
                                    slot: slot.describe(schema),
                                },
                                self.clamp(self.default_probability),
                            ),
                        };
                        warn!(candidate = %candidate.id(), fallback, "{}", error);
                        degraded.push(error);
                        fallback
                    }
                }
            })
            .collect();

        debug!(
            candidate = %candidate.id(),
            signature = %compiled.signature(),
            slots = vector.len(),
            "Built parameters"
        );

        Ok(BuiltParameters {
            parameters: Parameters::load(compiled, vector)?,
            degraded,
        })
    }

    /// Build every candidate's parameters into a persistable store
    pub fn build_all<'a, I>(&self, candidates: I) -> Result<(ParameterStore, BuildReport), InferenceError>
    where
        I: IntoIterator<Item = &'a Arc<dyn Classifier>>,
    {
        let mut store = ParameterStore::new();
        let mut report = BuildReport::default();

        for candidate in candidates {
            let built = self.build(candidate.as_ref())?;
            store.insert(candidate.id(), &built.parameters);
            report.built += 1;
            report.degraded.extend(built.degraded);
        }

        info!(
            built = report.built,
            degraded = report.degraded.len(),
            "Parameter build complete"
        );
        Ok((store, report))
    }
}
