//! Per-candidate probability tables
//!
//! The stored vector holds only the independent probabilities: the prior,
//! then each compiled node's slots in node order. Effective conditionals and
//! complements are derived by `build()` and never persisted.

use crate::error::InferenceError;
use crate::network::{CompiledSignature, Edge, Signature};
use serde::Serialize;

/// Effective conditionals of one node given its effective parent's state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeParameters {
    /// p(x | π)
    pub given_parent: f64,
    /// p(x | ¬π)
    pub given_not_parent: f64,
    /// p(¬x | π)
    pub not_given_parent: f64,
    /// p(¬x | ¬π)
    pub not_given_not_parent: f64,
}

impl NodeParameters {
    fn new(given_parent: f64, given_not_parent: f64) -> Self {
        Self {
            given_parent,
            given_not_parent,
            not_given_parent: 1.0 - given_parent,
            not_given_not_parent: 1.0 - given_not_parent,
        }
    }

    /// p(x = state | π = parent)
    pub fn p(&self, state: bool, parent: bool) -> f64 {
        match (state, parent) {
            (true, true) => self.given_parent,
            (true, false) => self.given_not_parent,
            (false, true) => self.not_given_parent,
            (false, false) => self.not_given_not_parent,
        }
    }
}

/// Immutable parameter table for one candidate signature
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    signature: Signature,
    stored: Vec<f64>,
    nodes: Vec<NodeParameters>,
}

impl Parameters {
    /// Rebuild from a persisted vector
    pub fn load(compiled: &CompiledSignature, vector: Vec<f64>) -> Result<Self, InferenceError> {
        if vector.len() != compiled.stored_len() {
            return Err(InferenceError::ParameterLength {
                signature: compiled.signature().to_string(),
                expected: compiled.stored_len(),
                actual: vector.len(),
            });
        }
        validate(compiled.signature(), &vector)?;
        let nodes = Self::build(compiled, &vector);
        Ok(Self {
            signature: compiled.signature(),
            stored: vector,
            nodes,
        })
    }

    /// Flat vector suitable for persistence; `load` reverses it exactly
    pub fn store(&self) -> Vec<f64> {
        self.stored.clone()
    }

    fn build(compiled: &CompiledSignature, stored: &[f64]) -> Vec<NodeParameters> {
        compiled
            .nodes()
            .iter()
            .map(|node| {
                let slots = &stored[node.offset..node.offset + node.width];
                match node.edge {
                    Edge::Direct | Edge::Rerooted { .. } => NodeParameters::new(slots[0], slots[1]),
                    Edge::Derived { .. } => {
                        // p(x|a1+) · Π p(aj+|aj+1+), then split on the parent's state
                        let split = slots.len() - 2;
                        let chain: f64 = slots[..split].iter().product();
                        NodeParameters::new(chain * slots[split], chain * slots[split + 1])
                    }
                }
            })
            .collect()
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn prior(&self) -> f64 {
        self.stored[0]
    }

    pub fn nodes(&self) -> &[NodeParameters] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &NodeParameters {
        &self.nodes[index]
    }
}

/// Every stored entry must be a probability strictly inside (0, 1)
pub fn validate(signature: Signature, vector: &[f64]) -> Result<(), InferenceError> {
    match vector
        .iter()
        .position(|p| !p.is_finite() || *p <= 0.0 || *p >= 1.0)
    {
        Some(position) => Err(InferenceError::InvalidProbability {
            signature: signature.to_string(),
            position,
            value: vector[position],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CompiledNetwork, ObservableDef, SchemaBuilder};

    fn network() -> CompiledNetwork {
        let schema = SchemaBuilder::new()
            .hypothesis(ObservableDef::required("taxonId"))
            .observable(ObservableDef::optional("kingdom"))
            .observable(ObservableDef::optional("phylum").depends_on("kingdom"))
            .observable(ObservableDef::optional("class").depends_on("phylum"))
            .build()
            .unwrap();
        CompiledNetwork::compile(schema)
    }

    #[test]
    fn test_length_checked() {
        let network = network();
        let compiled = network.get("TTT".parse().unwrap()).unwrap();
        let result = Parameters::load(compiled, vec![0.5; 3]);
        assert_eq!(
            result.unwrap_err(),
            InferenceError::ParameterLength {
                signature: "TTT".to_string(),
                expected: 7,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let network = network();
        let compiled = network.get("TTT".parse().unwrap()).unwrap();

        let zeroes = Parameters::load(compiled, vec![0.0; 7]).unwrap_err();
        assert!(matches!(
            zeroes,
            InferenceError::InvalidProbability { position: 0, .. }
        ));

        let mut overflow = vec![0.5; 7];
        overflow[4] = 1.7;
        assert_eq!(
            Parameters::load(compiled, overflow).unwrap_err(),
            InferenceError::InvalidProbability {
                signature: "TTT".to_string(),
                position: 4,
                value: 1.7,
            }
        );

        let mut nan = vec![0.5; 7];
        nan[2] = f64::NAN;
        assert!(matches!(
            Parameters::load(compiled, nan).unwrap_err(),
            InferenceError::InvalidProbability { position: 2, .. }
        ));
    }

    #[test]
    fn test_complements_sum_to_one() {
        let network = network();
        let compiled = network.get("TTT".parse().unwrap()).unwrap();
        let parameters =
            Parameters::load(compiled, vec![0.01, 0.9, 0.1, 0.8, 0.3, 0.7, 0.25]).unwrap();
        for node in parameters.nodes() {
            assert!((node.p(true, true) + node.p(false, true) - 1.0).abs() < 1e-12);
            assert!((node.p(true, false) + node.p(false, false) - 1.0).abs() < 1e-12);
        }
        assert_eq!(parameters.prior(), 0.01);
    }

    #[test]
    fn test_derived_chain() {
        let network = network();
        // kingdom and class present, phylum absent
        let compiled = network.get("TFT".parse().unwrap()).unwrap();
        // prior, kingdom (2), class: p(class|phylum+), p(phylum+|kingdom), p(phylum+|¬kingdom)
        let parameters =
            Parameters::load(compiled, vec![0.1, 0.9, 0.2, 0.5, 0.8, 0.4]).unwrap();
        let class = parameters.node(1);
        assert!((class.given_parent - 0.4).abs() < 1e-12);
        assert!((class.given_not_parent - 0.2).abs() < 1e-12);
        assert!((class.not_given_parent - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_store_load_round_trip() {
        let network = network();
        let compiled = network.get("TFT".parse().unwrap()).unwrap();
        let original =
            Parameters::load(compiled, vec![0.1, 0.9, 0.2, 0.5, 0.8, 0.4]).unwrap();
        let reloaded = Parameters::load(compiled, original.store()).unwrap();
        assert_eq!(reloaded, original);
    }
}
