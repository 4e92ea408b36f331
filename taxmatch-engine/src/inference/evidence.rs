//! Query/candidate comparison

use crate::model::{Classification, Classifier};
use crate::network::{ObservableId, Schema};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceValue {
    /// No opinion: one side has no value
    Unknown,
    Matches,
    Mismatches,
}

impl EvidenceValue {
    /// Likelihood factor for the observable being in `state`
    pub fn weight(&self, state: bool) -> f64 {
        match (self, state) {
            (EvidenceValue::Unknown, _) => 1.0,
            (EvidenceValue::Matches, true) | (EvidenceValue::Mismatches, false) => 1.0,
            _ => 0.0,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != EvidenceValue::Unknown
    }

    fn as_str(&self) -> &'static str {
        match self {
            EvidenceValue::Unknown => "unknown",
            EvidenceValue::Matches => "matches",
            EvidenceValue::Mismatches => "mismatches",
        }
    }
}

impl fmt::Display for EvidenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-observable evidence for one query/candidate pair
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    values: Vec<EvidenceValue>,
}

impl Evidence {
    /// Everything unknown
    pub fn unknown(schema: &Schema) -> Self {
        Self {
            values: vec![EvidenceValue::Unknown; schema.len()],
        }
    }

    /// Compare a normalised query against a candidate
    ///
    /// Many-valued observables test the query's base value for membership in
    /// the candidate's values.
    pub fn compute(schema: &Schema, query: &Classification, candidate: &dyn Classifier) -> Self {
        let mut evidence = Self::unknown(schema);
        for observable in schema.iter().skip(1) {
            let Some(wanted) = query.get(observable.id) else {
                continue;
            };
            let values = candidate.values(observable.id);
            if values.is_empty() {
                continue;
            }
            let matches = if observable.is_many() {
                values.iter().any(|v| v == wanted)
            } else {
                values[0] == wanted
            };
            evidence.set(
                observable.id,
                if matches {
                    EvidenceValue::Matches
                } else {
                    EvidenceValue::Mismatches
                },
            );
        }
        evidence
    }

    pub fn get(&self, observable: ObservableId) -> EvidenceValue {
        self.values
            .get(observable.index())
            .copied()
            .unwrap_or(EvidenceValue::Unknown)
    }

    pub fn set(&mut self, observable: ObservableId, value: EvidenceValue) {
        if let Some(slot) = self.values.get_mut(observable.index()) {
            *slot = value;
        }
    }

    pub fn known(&self) -> usize {
        self.values.iter().filter(|v| v.is_known()).count()
    }
}
