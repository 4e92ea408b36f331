//! Persisted parameter vectors, keyed by candidate id

use crate::error::InferenceError;
use crate::network::{CompiledNetwork, Signature};
use crate::parameters::Parameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// One candidate's stored vector and the signature it was built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredParameters {
    pub signature: Signature,
    pub vector: Vec<f64>,
}

impl StoredParameters {
    pub fn from_parameters(parameters: &Parameters) -> Self {
        Self {
            signature: parameters.signature(),
            vector: parameters.store(),
        }
    }

    /// Rebuild full parameters against the compiled network
    pub fn restore(&self, network: &CompiledNetwork) -> Result<Parameters, InferenceError> {
        let compiled = network.get(self.signature)?;
        Parameters::load(compiled, self.vector.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterStore {
    entries: BTreeMap<String, StoredParameters>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, parameters: &Parameters) {
        self.entries
            .insert(id.to_string(), StoredParameters::from_parameters(parameters));
    }

    pub fn get(&self, id: &str) -> Option<&StoredParameters> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoredParameters)> {
        self.entries.iter()
    }

    pub fn load(path: &Path) -> taxmatch_common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let store: ParameterStore = serde_json::from_str(&content)?;
        info!(entries = store.len(), "Loaded parameter store from {}", path.display());
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> taxmatch_common::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(entries = self.len(), "Saved parameter store to {}", path.display());
        Ok(())
    }
}
