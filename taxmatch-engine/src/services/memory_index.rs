//! In-memory reference index
//!
//! Loads a JSON array of taxon records and serves as both the candidate
//! [`Searcher`] and the corpus [`ParameterAnalyser`]. Retrieval tries the
//! exact normalised name, then the phonetic key, then Jaro-Winkler
//! similarity against records of the same genus.

use crate::error::SearchError;
use crate::model::{Classification, Classifier};
use crate::network::{ObservableId, Schema, Signature, TaxonTerms};
use crate::parameters::table::validate;
use crate::parameters::{ParameterStore, Parameters};
use crate::services::analyser::parse_name;
use crate::services::soundex::taxon_soundex;
use crate::services::{Observation, ParameterAnalyser, Searcher};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use taxmatch_common::{Rank, TaxonomicStatus};
use tracing::{debug, info, warn};

/// Minimum Jaro-Winkler similarity for a fuzzy name hit
pub const FUZZY_THRESHOLD: f64 = 0.92;

/// A field value in the corpus: one string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    fn into_vec(self) -> Vec<String> {
        match self {
            FieldValue::One(value) => vec![value],
            FieldValue::Many(values) => values,
        }
    }
}

/// One corpus record as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonEntry {
    pub taxon_id: String,

    #[serde(default)]
    pub taxonomic_status: TaxonomicStatus,

    #[serde(default, rename = "acceptedNameUsageID")]
    pub accepted_name_usage_id: Option<String>,

    #[serde(default, rename = "parentNameUsageID")]
    pub parent_name_usage_id: Option<String>,

    /// Relative frequency used for the prior
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Observable values keyed by observable name
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug)]
pub struct TaxonRecord {
    id: String,
    display_name: Option<String>,
    status: TaxonomicStatus,
    accepted_id: Option<String>,
    parent_id: Option<String>,
    weight: f64,
    values: Vec<Vec<String>>,
    signature: Signature,
    stored: Option<Vec<f64>>,
    parameters: OnceCell<Arc<Parameters>>,
}

impl TaxonRecord {
    fn from_entry(schema: &Schema, terms: &TaxonTerms, entry: TaxonEntry) -> Result<Self, SearchError> {
        let corrupt = |reason: &str| SearchError::CorruptRecord {
            id: entry.taxon_id.clone(),
            reason: reason.to_string(),
        };
        if entry.weight.is_nan() || entry.weight < 0.0 {
            return Err(corrupt("weight must be non-negative"));
        }

        let mut values = vec![Vec::new(); schema.len()];
        let push = |values: &mut Vec<Vec<String>>, id: ObservableId, raw: &str| {
            if let Some(v) = schema.observable(id).normalizer.normalize(raw) {
                if !values[id.index()].contains(&v) {
                    values[id.index()].push(v);
                }
            }
        };

        push(&mut values, terms.taxon_id, &entry.taxon_id);
        let mut display_name = None;
        for (name, value) in &entry.fields {
            let Some(id) = schema.find(name) else {
                continue;
            };
            for raw in value.clone().into_vec() {
                if id == terms.scientific_name && display_name.is_none() {
                    display_name = Some(raw.trim().to_string());
                }
                push(&mut values, id, &raw);
            }
        }

        let name = display_name
            .clone()
            .ok_or_else(|| corrupt("missing scientificName"))?;

        // Name parts the corpus left implicit
        if let Ok(parsed) = parse_name(&name) {
            let rank = values[terms.taxon_rank.index()]
                .first()
                .and_then(|r| r.parse::<Rank>().ok());
            let genus_or_below = rank.map_or(!parsed.is_uninomial(), |r| !r.is_coarser_than(Rank::Genus));
            if genus_or_below && values[terms.genus.index()].is_empty() {
                if let Some(genus) = &parsed.genus {
                    push(&mut values, terms.genus, genus.as_str());
                }
            }
            if values[terms.specific_epithet.index()].is_empty() {
                if let Some(epithet) = &parsed.specific_epithet {
                    push(&mut values, terms.specific_epithet, epithet.as_str());
                }
            }
            if values[terms.infraspecific_epithet.index()].is_empty() {
                if let Some(epithet) = &parsed.infraspecific_epithet {
                    push(&mut values, terms.infraspecific_epithet, epithet.as_str());
                }
            }
            if values[terms.soundex_scientific_name.index()].is_empty() {
                push(
                    &mut values,
                    terms.soundex_scientific_name,
                    taxon_soundex(&parsed.canonical).as_str(),
                );
            }
        }
        if values[terms.soundex_scientific_name.index()].is_empty() {
            push(&mut values, terms.soundex_scientific_name, taxon_soundex(&name).as_str());
        }

        let signature = schema.signature_of(|id| !values[id.index()].is_empty());
        Ok(Self {
            id: entry.taxon_id,
            display_name,
            status: entry.taxonomic_status,
            accepted_id: entry.accepted_name_usage_id,
            parent_id: entry.parent_name_usage_id,
            weight: entry.weight,
            values,
            signature,
            stored: None,
            parameters: OnceCell::new(),
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl Classifier for TaxonRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self, observable: ObservableId) -> &[String] {
        self.values
            .get(observable.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn status(&self) -> TaxonomicStatus {
        self.status
    }

    fn accepted_id(&self) -> Option<&str> {
        self.accepted_id.as_deref()
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn signature(&self) -> Signature {
        self.signature
    }

    fn parameter_cache(&self) -> &OnceCell<Arc<Parameters>> {
        &self.parameters
    }

    fn stored_parameters(&self) -> Option<&[f64]> {
        self.stored.as_deref()
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

#[derive(Debug)]
pub struct MemoryIndex {
    terms: TaxonTerms,
    many: Vec<bool>,
    records: Vec<Arc<TaxonRecord>>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
    by_soundex: HashMap<String, Vec<usize>>,
    by_genus: HashMap<String, Vec<usize>>,
    total_weight: f64,
}

impl MemoryIndex {
    pub fn from_entries(
        schema: &Schema,
        entries: Vec<TaxonEntry>,
        store: Option<&ParameterStore>,
    ) -> Result<Self, SearchError> {
        let terms = TaxonTerms::resolve(schema)
            .map_err(|e| SearchError::Unavailable(format!("schema lacks taxon terms: {}", e)))?;

        let mut index = Self {
            terms,
            many: schema.iter().map(|o| o.is_many()).collect(),
            records: Vec::with_capacity(entries.len()),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            by_soundex: HashMap::new(),
            by_genus: HashMap::new(),
            total_weight: 0.0,
        };

        for entry in entries {
            let mut record = TaxonRecord::from_entry(schema, &terms, entry)?;
            if index.by_id.contains_key(&record.id) {
                return Err(SearchError::CorruptRecord {
                    id: record.id,
                    reason: "duplicate taxonId".to_string(),
                });
            }

            if let Some(stored) = store.and_then(|s| s.get(&record.id)) {
                if stored.signature != record.signature {
                    warn!(
                        candidate = %record.id,
                        stored = %stored.signature,
                        actual = %record.signature,
                        "Ignoring stored parameters built for another signature"
                    );
                } else if let Err(e) = validate(stored.signature, &stored.vector) {
                    warn!(candidate = %record.id, error = %e, "Ignoring invalid stored parameters");
                } else {
                    record.stored = Some(stored.vector.clone());
                }
            }

            let position = index.records.len();
            index.by_id.insert(record.id.clone(), position);
            for (map, observable) in [
                (&mut index.by_name, terms.scientific_name),
                (&mut index.by_soundex, terms.soundex_scientific_name),
                (&mut index.by_genus, terms.genus),
            ] {
                if let Some(key) = record.value(observable) {
                    map.entry(key.to_string()).or_default().push(position);
                }
            }
            index.total_weight += record.weight;
            index.records.push(Arc::new(record));
        }

        info!(records = index.records.len(), "Built in-memory taxon index");
        Ok(index)
    }

    /// Load a JSON array of [`TaxonEntry`] records
    pub fn load(schema: &Schema, path: &Path, store: Option<&ParameterStore>) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<TaxonEntry> = serde_json::from_str(&content).map_err(|e| {
            SearchError::Unavailable(format!("cannot parse corpus {}: {}", path.display(), e))
        })?;
        info!(entries = entries.len(), "Loaded corpus from {}", path.display());
        Self::from_entries(schema, entries, store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, for batch parameter builds
    pub fn classifiers(&self) -> Vec<Arc<dyn Classifier>> {
        self.records
            .iter()
            .map(|r| r.clone() as Arc<dyn Classifier>)
            .collect()
    }

    fn fuzzy(&self, name: &str, genus: &str) -> Vec<usize> {
        let Some(members) = self.by_genus.get(genus) else {
            return Vec::new();
        };
        members
            .iter()
            .copied()
            .filter(|i| {
                self.records[*i]
                    .value(self.terms.scientific_name)
                    .is_some_and(|candidate| strsim::jaro_winkler(name, candidate) >= FUZZY_THRESHOLD)
            })
            .collect()
    }

    fn observed(&self, record: &TaxonRecord, candidate: &dyn Classifier, observation: Observation) -> bool {
        match observation {
            Observation::Hypothesis { positive } => (record.id == candidate.id()) == positive,
            Observation::Value {
                observable,
                positive,
            } => {
                let Some(wanted) = candidate.value(observable) else {
                    return false;
                };
                let values = record.values(observable);
                if values.is_empty() {
                    return false;
                }
                let equal = if self.many[observable.index()] {
                    values.iter().any(|v| v == wanted)
                } else {
                    values[0] == wanted
                };
                equal == positive
            }
            Observation::Present { observable } => record.has(observable),
        }
    }
}

fn extend_unique(hits: &mut Vec<usize>, positions: &[usize]) {
    for p in positions {
        if !hits.contains(p) {
            hits.push(*p);
        }
    }
}

impl Searcher for MemoryIndex {
    fn search(&self, query: &Classification) -> Result<Vec<Arc<dyn Classifier>>, SearchError> {
        let terms = &self.terms;
        let mut hits: Vec<usize> = Vec::new();

        if let Some(name) = query.get(terms.scientific_name) {
            if let Some(positions) = self.by_name.get(name) {
                extend_unique(&mut hits, positions);
            }
        }
        if let Some(key) = query.get(terms.soundex_scientific_name) {
            if let Some(positions) = self.by_soundex.get(key) {
                extend_unique(&mut hits, positions);
            }
        }
        if hits.is_empty() {
            if let (Some(name), Some(genus)) = (query.get(terms.scientific_name), query.get(terms.genus)) {
                extend_unique(&mut hits, &self.fuzzy(name, genus));
            }
        }

        debug!(
            name = query.get(terms.scientific_name).unwrap_or_default(),
            hits = hits.len(),
            "Index search"
        );
        Ok(hits
            .into_iter()
            .map(|i| self.records[i].clone() as Arc<dyn Classifier>)
            .collect())
    }

    fn get(&self, id: &str) -> Result<Option<Arc<dyn Classifier>>, SearchError> {
        Ok(self
            .by_id
            .get(id)
            .map(|i| self.records[*i].clone() as Arc<dyn Classifier>))
    }
}

impl ParameterAnalyser for MemoryIndex {
    fn compute_prior(&self, candidate: &dyn Classifier) -> Option<f64> {
        let record = &self.records[*self.by_id.get(candidate.id())?];
        if self.total_weight <= 0.0 {
            return None;
        }
        Some(record.weight / self.total_weight)
    }

    fn compute_conditional(
        &self,
        candidate: &dyn Classifier,
        event: Observation,
        given: &[Observation],
    ) -> Option<f64> {
        let mut conditioned = 0.0;
        let mut joint = 0.0;
        for record in &self.records {
            if given.iter().all(|g| self.observed(record, candidate, *g)) {
                conditioned += record.weight;
                if self.observed(record, candidate, event) {
                    joint += record.weight;
                }
            }
        }
        if conditioned <= 0.0 {
            return None;
        }
        Some(joint / conditioned)
    }
}
