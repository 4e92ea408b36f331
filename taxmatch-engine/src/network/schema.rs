//! Observable schema
//!
//! A schema declares the observable fields of the dependency network, their
//! normalisers and multiplicities, and the single conditioning parent of each
//! observable. One observable is the hypothesis ("this candidate is the
//! intended taxon"); observables without a parent hang off the hypothesis.
//!
//! Schemas are built once at startup and never mutated.

use crate::error::SchemaError;
use crate::network::signature::Signature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use taxmatch_common::{Issue, NomenclaturalCode, Rank};

/// Most optional observables a schema may declare (signature table is 2^n)
pub const MAX_OPTIONAL: usize = 16;

/// Index of an observable within its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservableId(pub(crate) usize);

impl ObservableId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Value type of an observable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservableType {
    Identifier,
    Text,
    Rank,
    Code,
    Phonetic,
}

/// How many values an observable carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    Required,
    Optional,
    Many,
}

/// Value normaliser applied identically to queries and indexed records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalizer {
    /// Trimmed, otherwise verbatim
    Exact,
    /// Trimmed, inner whitespace collapsed, case-folded
    Lenient,
    /// Parsed as a rank; unparseable values fall back to `Lenient`
    Rank,
    /// Parsed as a nomenclatural code; unparseable values fall back to `Lenient`
    Code,
}

impl Normalizer {
    /// Normalise a raw value; empty values normalise to `None`
    pub fn normalize(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = match self {
            Normalizer::Exact => trimmed.to_string(),
            Normalizer::Lenient => lenient(trimmed),
            Normalizer::Rank => match trimmed.parse::<Rank>() {
                Ok(rank) => rank.as_str().to_string(),
                Err(_) => lenient(trimmed),
            },
            Normalizer::Code => match trimmed.parse::<NomenclaturalCode>() {
                Ok(code) => code.as_str().to_string(),
                Err(_) => lenient(trimmed),
            },
        };
        Some(normalized)
    }
}

fn lenient(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A named, typed field participating in the network
#[derive(Debug, Clone, Serialize)]
pub struct Observable {
    pub id: ObservableId,
    pub name: String,
    pub kind: ObservableType,
    pub multiplicity: Multiplicity,
    pub normalizer: Normalizer,
    /// Conditioning parent; `None` means the hypothesis (or this is the hypothesis)
    pub parent: Option<ObservableId>,
    /// Computed by analysis rather than supplied by the caller
    pub derived: bool,
    /// Issue recorded when relaxation drops this observable
    pub relaxation_issue: Option<Issue>,
    /// Position in the signature bitmask, for optional observables
    pub signature_slot: Option<usize>,
}

impl Observable {
    pub fn is_optional(&self) -> bool {
        self.multiplicity != Multiplicity::Required
    }

    pub fn is_many(&self) -> bool {
        self.multiplicity == Multiplicity::Many
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Declaration of an observable, consumed by [`SchemaBuilder`]
#[derive(Debug, Clone)]
pub struct ObservableDef {
    name: String,
    kind: ObservableType,
    multiplicity: Multiplicity,
    normalizer: Normalizer,
    parents: Vec<String>,
    derived: bool,
    relaxation_issue: Option<Issue>,
}

impl ObservableDef {
    pub fn new(name: &str, multiplicity: Multiplicity) -> Self {
        Self {
            name: name.to_string(),
            kind: ObservableType::Text,
            multiplicity,
            normalizer: Normalizer::Lenient,
            parents: Vec::new(),
            derived: false,
            relaxation_issue: None,
        }
    }

    pub fn required(name: &str) -> Self {
        Self::new(name, Multiplicity::Required)
    }

    pub fn optional(name: &str) -> Self {
        Self::new(name, Multiplicity::Optional)
    }

    pub fn many(name: &str) -> Self {
        Self::new(name, Multiplicity::Many)
    }

    pub fn kind(mut self, kind: ObservableType) -> Self {
        self.kind = kind;
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn depends_on(mut self, parent: &str) -> Self {
        self.parents.push(parent.to_string());
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn relaxed_as(mut self, issue: Issue) -> Self {
        self.relaxation_issue = Some(issue);
        self
    }
}

/// Builds and validates a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    hypothesis: Option<ObservableDef>,
    defs: Vec<ObservableDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the hypothesis observable (an identifier)
    pub fn hypothesis(mut self, def: ObservableDef) -> Self {
        self.hypothesis = Some(def);
        self
    }

    pub fn observable(mut self, def: ObservableDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let hypothesis = self.hypothesis.ok_or(SchemaError::MissingHypothesis)?;
        if !hypothesis.parents.is_empty() {
            return Err(SchemaError::HypothesisWithParent(hypothesis.name));
        }

        let mut defs = Vec::with_capacity(self.defs.len() + 1);
        defs.push(ObservableDef {
            multiplicity: Multiplicity::Required,
            ..hypothesis
        });
        defs.extend(self.defs);

        let mut by_name = HashMap::new();
        for (index, def) in defs.iter().enumerate() {
            if by_name.insert(def.name.clone(), ObservableId(index)).is_some() {
                return Err(SchemaError::DuplicateObservable(def.name.clone()));
            }
        }

        let optional_count = defs
            .iter()
            .filter(|d| d.multiplicity != Multiplicity::Required)
            .count();
        if optional_count > MAX_OPTIONAL {
            return Err(SchemaError::TooManyOptional {
                count: optional_count,
                limit: MAX_OPTIONAL,
            });
        }

        let mut observables = Vec::with_capacity(defs.len());
        let mut optional = Vec::new();
        for (index, def) in defs.into_iter().enumerate() {
            if def.parents.len() > 1 {
                return Err(SchemaError::MultipleParents(def.name));
            }
            let parent = match def.parents.first() {
                Some(parent_name) => Some(*by_name.get(parent_name).ok_or_else(|| {
                    SchemaError::UnknownParent {
                        child: def.name.clone(),
                        parent: parent_name.clone(),
                    }
                })?),
                None => None,
            };
            // Depending on the hypothesis is the same as having no parent
            let parent = parent.filter(|p| p.0 != 0);

            let signature_slot = if def.multiplicity != Multiplicity::Required {
                optional.push(ObservableId(index));
                Some(optional.len() - 1)
            } else {
                None
            };

            observables.push(Observable {
                id: ObservableId(index),
                name: def.name,
                kind: def.kind,
                multiplicity: def.multiplicity,
                normalizer: def.normalizer,
                parent,
                derived: def.derived,
                relaxation_issue: def.relaxation_issue,
                signature_slot,
            });
        }

        let mut children = vec![Vec::new(); observables.len()];
        let mut roots = Vec::new();
        for observable in observables.iter().skip(1) {
            match observable.parent {
                Some(parent) => children[parent.0].push(observable.id),
                None => roots.push(observable.id),
            }
        }

        // With a single parent per observable, a cycle is a parent chain that never
        // reaches the hypothesis; such observables are unreachable from the roots.
        let topological = topological_order(&roots, &children);
        if topological.len() != observables.len() - 1 {
            let reached: Vec<bool> = {
                let mut seen = vec![false; observables.len()];
                for id in &topological {
                    seen[id.0] = true;
                }
                seen
            };
            let stuck = observables
                .iter()
                .skip(1)
                .find(|o| !reached[o.id.0])
                .map(|o| o.name.clone())
                .unwrap_or_default();
            return Err(SchemaError::Cycle(stuck));
        }

        Ok(Schema {
            observables,
            by_name,
            optional,
            children,
            roots,
            topological,
        })
    }
}

fn topological_order(roots: &[ObservableId], children: &[Vec<ObservableId>]) -> Vec<ObservableId> {
    let mut order = Vec::new();
    let mut stack: Vec<ObservableId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        for child in children[id.0].iter().rev() {
            stack.push(*child);
        }
    }
    order
}

/// Validated observable network
#[derive(Debug, Clone)]
pub struct Schema {
    observables: Vec<Observable>,
    by_name: HashMap<String, ObservableId>,
    optional: Vec<ObservableId>,
    children: Vec<Vec<ObservableId>>,
    roots: Vec<ObservableId>,
    topological: Vec<ObservableId>,
}

impl Schema {
    pub fn hypothesis(&self) -> &Observable {
        &self.observables[0]
    }

    pub fn observable(&self, id: ObservableId) -> &Observable {
        &self.observables[id.0]
    }

    pub fn find(&self, name: &str) -> Option<ObservableId> {
        self.by_name.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<ObservableId, SchemaError> {
        self.find(name)
            .ok_or_else(|| SchemaError::UnknownObservable(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.observables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observable> {
        self.observables.iter()
    }

    /// Observables other than the hypothesis, parents before children
    pub fn topological(&self) -> &[ObservableId] {
        &self.topological
    }

    /// Optional observables in signature bit order
    pub fn optional(&self) -> &[ObservableId] {
        &self.optional
    }

    /// Observables hanging directly off the hypothesis
    pub fn roots(&self) -> &[ObservableId] {
        &self.roots
    }

    pub fn children(&self, id: ObservableId) -> &[ObservableId] {
        &self.children[id.0]
    }

    /// Signature of a record given a presence test per observable
    pub fn signature_of<F>(&self, mut present: F) -> Signature
    where
        F: FnMut(ObservableId) -> bool,
    {
        let mut mask = 0u32;
        for (bit, id) in self.optional.iter().enumerate() {
            if present(*id) {
                mask |= 1 << bit;
            }
        }
        Signature::new(mask, self.optional.len())
    }

    /// Whether an observable is populated under a signature
    pub fn is_present(&self, id: ObservableId, signature: Signature) -> bool {
        match self.observables[id.0].signature_slot {
            Some(slot) => signature.bit(slot),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SchemaBuilder {
        SchemaBuilder::new()
            .hypothesis(ObservableDef::required("taxonId").kind(ObservableType::Identifier))
            .observable(ObservableDef::optional("kingdom"))
            .observable(ObservableDef::optional("phylum").depends_on("kingdom"))
            .observable(ObservableDef::required("scientificName"))
    }

    #[test]
    fn test_build_small_schema() {
        let schema = small().build().unwrap();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.optional().len(), 2);
        assert_eq!(schema.roots().len(), 2);

        let kingdom = schema.require("kingdom").unwrap();
        let phylum = schema.require("phylum").unwrap();
        assert_eq!(schema.observable(phylum).parent, Some(kingdom));
        assert_eq!(schema.children(kingdom), &[phylum]);
    }

    #[test]
    fn test_topological_order_puts_parents_first() {
        let schema = SchemaBuilder::new()
            .hypothesis(ObservableDef::required("taxonId"))
            .observable(ObservableDef::optional("class").depends_on("phylum"))
            .observable(ObservableDef::optional("phylum").depends_on("kingdom"))
            .observable(ObservableDef::optional("kingdom"))
            .build()
            .unwrap();
        let names: Vec<&str> = schema
            .topological()
            .iter()
            .map(|id| schema.observable(*id).name.as_str())
            .collect();
        assert_eq!(names, vec!["kingdom", "phylum", "class"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = small().observable(ObservableDef::optional("kingdom")).build();
        assert_eq!(
            result.unwrap_err(),
            SchemaError::DuplicateObservable("kingdom".to_string())
        );
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let result = small()
            .observable(ObservableDef::optional("genus").depends_on("family"))
            .build();
        assert!(matches!(result, Err(SchemaError::UnknownParent { .. })));
    }

    #[test]
    fn test_multiple_parents_rejected() {
        let result = small()
            .observable(
                ObservableDef::optional("genus")
                    .depends_on("kingdom")
                    .depends_on("phylum"),
            )
            .build();
        assert_eq!(
            result.unwrap_err(),
            SchemaError::MultipleParents("genus".to_string())
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let result = SchemaBuilder::new()
            .hypothesis(ObservableDef::required("taxonId"))
            .observable(ObservableDef::optional("a").depends_on("b"))
            .observable(ObservableDef::optional("b").depends_on("a"))
            .build();
        assert!(matches!(result, Err(SchemaError::Cycle(_))));
    }

    #[test]
    fn test_missing_hypothesis_rejected() {
        let result = SchemaBuilder::new()
            .observable(ObservableDef::optional("a"))
            .build();
        assert_eq!(result.unwrap_err(), SchemaError::MissingHypothesis);
    }

    #[test]
    fn test_signature_of() {
        let schema = small().build().unwrap();
        let phylum = schema.require("phylum").unwrap();
        let signature = schema.signature_of(|id| id == phylum);
        assert_eq!(signature.to_string(), "FT");
        assert!(schema.is_present(phylum, signature));
        assert!(!schema.is_present(schema.require("kingdom").unwrap(), signature));
        assert!(schema.is_present(schema.require("scientificName").unwrap(), signature));
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(Normalizer::Lenient.normalize("  Acacia   Dealbata "), Some("acacia dealbata".to_string()));
        assert_eq!(Normalizer::Exact.normalize(" Link "), Some("Link".to_string()));
        assert_eq!(Normalizer::Rank.normalize("sp."), Some("species".to_string()));
        assert_eq!(Normalizer::Code.normalize("ICZN"), Some("ZOOLOGICAL".to_string()));
        assert_eq!(Normalizer::Lenient.normalize("   "), None);
    }
}
