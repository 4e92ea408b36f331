//! Query-side record

use crate::error::SchemaError;
use crate::network::{ObservableId, Schema, Signature};
use serde::Serialize;
use std::collections::BTreeMap;
use taxmatch_common::{Issue, IssueSet, Rank};

/// A query being matched
///
/// Holds zero, one or many values per observable, the issues accumulated
/// during analysis and relaxation, and hints gathered from ambiguous results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    values: BTreeMap<ObservableId, Vec<String>>,
    issues: IssueSet,
    hints: BTreeMap<ObservableId, Vec<String>>,
    implied_rank: Option<Rank>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (observable name, value) pairs
    pub fn from_pairs<'a, I>(schema: &Schema, pairs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut classification = Self::new();
        for (name, value) in pairs {
            classification.add(schema.require(name)?, value);
        }
        Ok(classification)
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, observable: ObservableId, value: &str) -> Self {
        self.add(observable, value);
        self
    }

    /// Replace all values of an observable
    pub fn set(&mut self, observable: ObservableId, value: &str) {
        self.values.insert(observable, vec![value.to_string()]);
    }

    /// Append a value, ignoring duplicates
    pub fn add(&mut self, observable: ObservableId, value: &str) {
        let values = self.values.entry(observable).or_default();
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    pub fn get(&self, observable: ObservableId) -> Option<&str> {
        self.values(observable).first().map(String::as_str)
    }

    pub fn values(&self, observable: ObservableId) -> &[String] {
        self.values.get(&observable).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, observable: ObservableId) -> bool {
        !self.values(observable).is_empty()
    }

    pub fn remove(&mut self, observable: ObservableId) -> Vec<String> {
        self.values.remove(&observable).unwrap_or_default()
    }

    /// Observables with at least one value
    pub fn observables(&self) -> impl Iterator<Item = ObservableId> + '_ {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(id, _)| *id)
    }

    pub fn issues(&self) -> &IssueSet {
        &self.issues
    }

    pub fn add_issue(&mut self, issue: Issue) -> bool {
        self.issues.insert(issue)
    }

    pub fn hints(&self, observable: ObservableId) -> &[String] {
        self.hints.get(&observable).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_hint(&mut self, observable: ObservableId, value: &str) {
        let hints = self.hints.entry(observable).or_default();
        if !hints.iter().any(|h| h == value) {
            hints.push(value.to_string());
        }
    }

    pub fn has_hints(&self) -> bool {
        self.hints.values().any(|h| !h.is_empty())
    }

    /// Rank the name implies, as recorded by analysis
    pub fn implied_rank(&self) -> Option<Rank> {
        self.implied_rank
    }

    pub fn set_implied_rank(&mut self, rank: Option<Rank>) {
        self.implied_rank = rank;
    }

    /// Apply each observable's normaliser; values that normalise to nothing are dropped
    pub fn normalize(&self, schema: &Schema) -> Classification {
        let mut normalized = Classification {
            values: BTreeMap::new(),
            issues: self.issues.clone(),
            hints: self.hints.clone(),
            implied_rank: self.implied_rank,
        };
        for (id, values) in &self.values {
            let normalizer = schema.observable(*id).normalizer;
            for value in values {
                if let Some(v) = normalizer.normalize(value) {
                    normalized.add(*id, &v);
                }
            }
        }
        normalized
    }

    pub fn signature(&self, schema: &Schema) -> Signature {
        schema.signature_of(|id| self.has(id))
    }

    /// Values keyed by observable name
    pub fn named_values(&self, schema: &Schema) -> BTreeMap<String, Vec<String>> {
        named(schema, &self.values)
    }

    /// Hints keyed by observable name
    pub fn named_hints(&self, schema: &Schema) -> BTreeMap<String, Vec<String>> {
        named(schema, &self.hints)
    }
}

fn named(
    schema: &Schema,
    map: &BTreeMap<ObservableId, Vec<String>>,
) -> BTreeMap<String, Vec<String>> {
    map.iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(id, v)| (schema.observable(*id).name.clone(), v.clone()))
        .collect()
}

/// Serialisable view of a classification
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationView {
    pub values: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IssueSet::is_empty")]
    pub issues: IssueSet,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub hints: BTreeMap<String, Vec<String>>,
}

impl ClassificationView {
    pub fn new(classification: &Classification, schema: &Schema) -> Self {
        Self {
            values: classification.named_values(schema),
            issues: classification.issues.clone(),
            hints: classification.named_hints(schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::taxonomic_schema;

    #[test]
    fn test_add_ignores_duplicates() {
        let schema = taxonomic_schema().unwrap();
        let vernacular = schema.require("vernacularName").unwrap();
        let mut query = Classification::new();
        query.add(vernacular, "silver wattle");
        query.add(vernacular, "mimosa");
        query.add(vernacular, "silver wattle");
        assert_eq!(query.values(vernacular).len(), 2);
        assert_eq!(query.get(vernacular), Some("silver wattle"));
    }

    #[test]
    fn test_normalize_and_signature() {
        let schema = taxonomic_schema().unwrap();
        let name = schema.require("scientificName").unwrap();
        let kingdom = schema.require("kingdom").unwrap();
        let family = schema.require("family").unwrap();

        let query = Classification::new()
            .with(name, "  Acacia   dealbata ")
            .with(kingdom, "Plantae")
            .with(family, "   ");
        let normalized = query.normalize(&schema);

        assert_eq!(normalized.get(name), Some("acacia dealbata"));
        assert_eq!(normalized.get(kingdom), Some("plantae"));
        assert!(!normalized.has(family));

        let signature = normalized.signature(&schema);
        assert_eq!(signature.count_present(), 1);
        assert!(schema.is_present(kingdom, signature));
    }

    #[test]
    fn test_hints_deduplicated() {
        let schema = taxonomic_schema().unwrap();
        let kingdom = schema.require("kingdom").unwrap();
        let mut query = Classification::new();
        assert!(!query.has_hints());
        query.add_hint(kingdom, "plantae");
        query.add_hint(kingdom, "animalia");
        query.add_hint(kingdom, "plantae");
        assert_eq!(query.hints(kingdom), &["plantae".to_string(), "animalia".to_string()]);
        assert_eq!(query.named_hints(&schema).len(), 1);
    }
}
