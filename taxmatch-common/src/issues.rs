//! Match issue vocabulary
//!
//! Issues are machine-readable flags explaining how a match deviates from an
//! exact match of the query. The vocabulary is closed; new flags are added
//! here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named issue flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issue {
    /// Order was dropped from the query during relaxation
    RemovedOrder,
    /// Family was dropped from the query during relaxation
    RemovedFamily,
    /// Phylum was dropped from the query during relaxation
    RemovedPhylum,
    /// Class was dropped from the query during relaxation
    RemovedClass,
    /// Kingdom was dropped from the query during relaxation
    RemovedKingdom,
    /// Authorship was dropped from the query during relaxation
    RemovedAuthorship,
    /// Rank was dropped from the query during relaxation
    RemovedRank,
    /// Nomenclatural code was dropped from the query during relaxation
    RemovedCode,
    /// The match is at a coarser rank than the query implied
    HigherOrderMatch,
    /// Authorship was split from the supplied name
    CanonicalName,
    /// Several unrelated candidates share the name and cannot be separated
    UnresolvedHomonym,
    /// Several candidates matched but resolve to the same accepted taxon
    MultipleMatches,
    /// The matched name is misapplied
    MisappliedName,
    /// The matched name is partially misapplied
    PartiallyMisappliedName,
    /// The matched name is excluded
    ExcludedName,
    /// The matched name is partially excluded
    PartiallyExcludedName,
    /// The name exists both as an accepted name and as a synonym
    AcceptedAndSynonym,
    /// The matched synonym points at the parent or child of another candidate
    ParentChildSynonym,
    /// The matched name differs from the supplied name by spelling
    MisspelledScientificName,
    /// The supplied name was an indeterminate species (`sp.`)
    IndeterminateSpecies,
    /// The supplied name carried a `cf.` qualifier
    ConferSpeciesName,
    /// The supplied name carried an `aff.` qualifier
    AffinitySpeciesName,
    /// Synonym links loop back on themselves
    SynonymLoop,
    /// A synonym's accepted record could not be found
    AcceptedNotFound,
    /// No candidate could be matched
    NoMatch,
}

impl Issue {
    /// Stable upper snake case name, as serialised
    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::RemovedOrder => "REMOVED_ORDER",
            Issue::RemovedFamily => "REMOVED_FAMILY",
            Issue::RemovedPhylum => "REMOVED_PHYLUM",
            Issue::RemovedClass => "REMOVED_CLASS",
            Issue::RemovedKingdom => "REMOVED_KINGDOM",
            Issue::RemovedAuthorship => "REMOVED_AUTHORSHIP",
            Issue::RemovedRank => "REMOVED_RANK",
            Issue::RemovedCode => "REMOVED_CODE",
            Issue::HigherOrderMatch => "HIGHER_ORDER_MATCH",
            Issue::CanonicalName => "CANONICAL_NAME",
            Issue::UnresolvedHomonym => "UNRESOLVED_HOMONYM",
            Issue::MultipleMatches => "MULTIPLE_MATCHES",
            Issue::MisappliedName => "MISAPPLIED_NAME",
            Issue::PartiallyMisappliedName => "PARTIALLY_MISAPPLIED_NAME",
            Issue::ExcludedName => "EXCLUDED_NAME",
            Issue::PartiallyExcludedName => "PARTIALLY_EXCLUDED_NAME",
            Issue::AcceptedAndSynonym => "ACCEPTED_AND_SYNONYM",
            Issue::ParentChildSynonym => "PARENT_CHILD_SYNONYM",
            Issue::MisspelledScientificName => "MISSPELLED_SCIENTIFIC_NAME",
            Issue::IndeterminateSpecies => "INDETERMINATE_SPECIES",
            Issue::ConferSpeciesName => "CONFER_SPECIES_NAME",
            Issue::AffinitySpeciesName => "AFFINITY_SPECIES_NAME",
            Issue::SynonymLoop => "SYNONYM_LOOP",
            Issue::AcceptedNotFound => "ACCEPTED_NOT_FOUND",
            Issue::NoMatch => "NO_MATCH",
        }
    }

    /// True for the flags recorded by a relaxation step
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Issue::RemovedOrder
                | Issue::RemovedFamily
                | Issue::RemovedPhylum
                | Issue::RemovedClass
                | Issue::RemovedKingdom
                | Issue::RemovedAuthorship
                | Issue::RemovedRank
                | Issue::RemovedCode
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered set of issues
///
/// Duplicates are ignored on insert. Equality ignores order; iteration and
/// serialisation preserve the order in which issues were first added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueSet {
    issues: Vec<Issue>,
}

impl IssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue; returns false if it was already present
    pub fn insert(&mut self, issue: Issue) -> bool {
        if self.issues.contains(&issue) {
            return false;
        }
        self.issues.push(issue);
        true
    }

    pub fn contains(&self, issue: Issue) -> bool {
        self.issues.contains(&issue)
    }

    pub fn remove(&mut self, issue: Issue) -> bool {
        let before = self.issues.len();
        self.issues.retain(|i| *i != issue);
        before != self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    /// Merge another set, keeping this set's order first
    pub fn merge(&mut self, other: &IssueSet) {
        for issue in other.iter() {
            self.insert(*issue);
        }
    }

    /// Number of relaxation flags present
    pub fn removal_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_removal()).count()
    }
}

impl PartialEq for IssueSet {
    fn eq(&self, other: &Self) -> bool {
        self.issues.len() == other.issues.len()
            && self.issues.iter().all(|i| other.issues.contains(i))
    }
}

impl Eq for IssueSet {}

impl FromIterator<Issue> for IssueSet {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        let mut set = IssueSet::new();
        for issue in iter {
            set.insert(issue);
        }
        set
    }
}

impl Extend<Issue> for IssueSet {
    fn extend<T: IntoIterator<Item = Issue>>(&mut self, iter: T) {
        for issue in iter {
            self.insert(issue);
        }
    }
}

impl fmt::Display for IssueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.issues.iter().map(|i| i.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
