//! Generic evaluator over compiled signatures
//!
//! For each node `x` with effective parent `π`:
//!
//! ```text
//! λx(v) = Σ_{s ∈ {t,f}} p(x=s | π=v) · e_x(s) · Π_{children c} λc(s)
//! ```
//!
//! where `e_x(s)` is 1 for unknown evidence. Nodes are stored parents first,
//! so one reverse pass computes every `λ` for both parent states. The
//! evidence mass under the hypothesis state `h` is the product of the roots'
//! `λ(h)`.

use crate::error::InferenceError;
use crate::inference::Evidence;
use crate::network::{CompiledNetwork, Schema};
use crate::parameters::Parameters;
use crate::trace::{Trace, TraceLevel};
use serde::Serialize;
use std::sync::Arc;

/// Result of one inference call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inference {
    pub prior: f64,
    pub posterior: f64,
    pub evidence_mass: f64,
}

/// Stateless; shared by every matching thread
#[derive(Debug, Clone)]
pub struct Inferencer {
    network: Arc<CompiledNetwork>,
}

impl Inferencer {
    pub fn new(network: Arc<CompiledNetwork>) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &Arc<CompiledNetwork> {
        &self.network
    }

    pub fn schema(&self) -> &Schema {
        self.network.schema()
    }

    pub fn probability(
        &self,
        evidence: &Evidence,
        parameters: &Parameters,
        mut trace: Option<&mut Trace>,
    ) -> Result<Inference, InferenceError> {
        let signature = parameters.signature();
        let compiled = self.network.get(signature)?;
        if parameters.nodes().len() != compiled.nodes().len() {
            return Err(InferenceError::SignatureMismatch {
                signature: compiled.signature().to_string(),
                parameters: signature.to_string(),
            });
        }
        let schema = self.network.schema();
        let prior = parameters.prior();

        if let Some(t) = trace.as_deref_mut() {
            t.push(TraceLevel::Summary, "inference");
            t.add(TraceLevel::Summary, "signature", signature.to_string());
            t.add(TraceLevel::Summary, "prior", prior);
        }

        // lambda[i][0] is λ(parent true), lambda[i][1] is λ(parent false)
        let nodes = compiled.nodes();
        let mut lambda = vec![[1.0f64; 2]; nodes.len()];
        for index in (0..nodes.len()).rev() {
            let node = &nodes[index];
            let table = parameters.node(index);
            let e = evidence.get(node.observable);
            let below = |state: usize| -> f64 {
                node.children.iter().map(|c| lambda[*c][state]).product()
            };
            let (below_t, below_f) = (below(0), below(1));

            let mut terms = [[0.0f64; 2]; 2];
            for (v, parent) in [true, false].into_iter().enumerate() {
                terms[v][0] = table.p(true, parent) * e.weight(true) * below_t;
                terms[v][1] = table.p(false, parent) * e.weight(false) * below_f;
                lambda[index][v] = terms[v][0] + terms[v][1];
            }

            if let Some(t) = trace.as_deref_mut() {
                let name = &schema.observable(node.observable).name;
                let parent_name = node
                    .parent
                    .map(|p| schema.observable(nodes[p].observable).name.as_str())
                    .unwrap_or(schema.hypothesis().name.as_str());
                t.push(TraceLevel::Info, name);
                t.add(TraceLevel::Debug, "parent", parent_name);
                t.add(TraceLevel::Debug, "evidence", e.to_string());
                t.add(TraceLevel::Debug, "p", table.given_parent);
                t.add(TraceLevel::Debug, "pn", table.given_not_parent);
                t.add(TraceLevel::Info, "c", terms[0][0]);
                t.add(TraceLevel::Info, "nc", terms[0][1]);
                t.add(TraceLevel::Info, "cn", terms[1][0]);
                t.add(TraceLevel::Info, "ncn", terms[1][1]);
                t.add_with(TraceLevel::Trace, "formula", || {
                    format!(
                        "c = p({x}|{p})·e·Πλ = {a}·{w}·{b}; nc = p(¬{x}|{p})·e·Πλ = {c}·{v}·{d}",
                        x = name,
                        p = parent_name,
                        a = table.given_parent,
                        w = e.weight(true),
                        b = below_t,
                        c = table.not_given_parent,
                        v = e.weight(false),
                        d = below_f,
                    )
                });
                t.pop();
            }
        }

        let mass_true: f64 = compiled.roots().iter().map(|r| lambda[*r][0]).product();
        let mass_false: f64 = compiled.roots().iter().map(|r| lambda[*r][1]).product();
        let evidence_mass = prior * mass_true + (1.0 - prior) * mass_false;
        if evidence_mass.is_nan() || evidence_mass <= 0.0 {
            if let Some(t) = trace.as_deref_mut() {
                t.pop();
            }
            return Err(InferenceError::DegenerateEvidence(signature.to_string()));
        }
        let posterior = (prior * mass_true / evidence_mass).clamp(0.0, 1.0);

        if let Some(t) = trace.as_deref_mut() {
            t.add(TraceLevel::Info, "massTrue", mass_true);
            t.add(TraceLevel::Info, "massFalse", mass_false);
            t.add(TraceLevel::Summary, "evidenceMass", evidence_mass);
            t.add(TraceLevel::Summary, "posterior", posterior);
            t.pop();
        }

        Ok(Inference {
            prior,
            posterior,
            evidence_mass,
        })
    }
}
