//! Taxonomic status and nomenclatural code vocabularies

use crate::issues::Issue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a name record within the reference taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaxonomicStatus {
    #[default]
    Accepted,
    Synonym,
    HomotypicSynonym,
    HeterotypicSynonym,
    ProParteSynonym,
    Misapplied,
    PartiallyMisapplied,
    Excluded,
    PartiallyExcluded,
    Unknown,
}

impl TaxonomicStatus {
    /// Accepted names terminate synonym resolution
    pub fn is_accepted(&self) -> bool {
        matches!(self, TaxonomicStatus::Accepted | TaxonomicStatus::Excluded)
    }

    /// Plain synonyms (nomenclatural or taxonomic)
    pub fn is_synonym(&self) -> bool {
        matches!(
            self,
            TaxonomicStatus::Synonym
                | TaxonomicStatus::HomotypicSynonym
                | TaxonomicStatus::HeterotypicSynonym
                | TaxonomicStatus::ProParteSynonym
        )
    }

    pub fn is_misapplied(&self) -> bool {
        matches!(
            self,
            TaxonomicStatus::Misapplied | TaxonomicStatus::PartiallyMisapplied
        )
    }

    /// Issue flag a match on a name with this status carries
    pub fn issue(&self) -> Option<Issue> {
        match self {
            TaxonomicStatus::Misapplied => Some(Issue::MisappliedName),
            TaxonomicStatus::PartiallyMisapplied => Some(Issue::PartiallyMisappliedName),
            TaxonomicStatus::Excluded => Some(Issue::ExcludedName),
            TaxonomicStatus::PartiallyExcluded => Some(Issue::PartiallyExcludedName),
            _ => None,
        }
    }
}

impl FromStr for TaxonomicStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        let status = match normalised.as_str() {
            "accepted" | "valid" => TaxonomicStatus::Accepted,
            "synonym" => TaxonomicStatus::Synonym,
            "homotypicsynonym" | "objectivesynonym" => TaxonomicStatus::HomotypicSynonym,
            "heterotypicsynonym" | "subjectivesynonym" => TaxonomicStatus::HeterotypicSynonym,
            "propartesynonym" => TaxonomicStatus::ProParteSynonym,
            "misapplied" => TaxonomicStatus::Misapplied,
            "partiallymisapplied" => TaxonomicStatus::PartiallyMisapplied,
            "excluded" => TaxonomicStatus::Excluded,
            "partiallyexcluded" => TaxonomicStatus::PartiallyExcluded,
            "unknown" | "" => TaxonomicStatus::Unknown,
            _ => return Err(format!("unknown taxonomic status: {}", s)),
        };
        Ok(status)
    }
}

/// Nomenclatural code governing a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NomenclaturalCode {
    Botanical,
    Zoological,
    Bacterial,
    Viral,
    Cultivars,
}

impl NomenclaturalCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NomenclaturalCode::Botanical => "BOTANICAL",
            NomenclaturalCode::Zoological => "ZOOLOGICAL",
            NomenclaturalCode::Bacterial => "BACTERIAL",
            NomenclaturalCode::Viral => "VIRAL",
            NomenclaturalCode::Cultivars => "CULTIVARS",
        }
    }
}

impl fmt::Display for NomenclaturalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NomenclaturalCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BOTANICAL" | "ICN" | "ICBN" | "ICNAFP" => Ok(NomenclaturalCode::Botanical),
            "ZOOLOGICAL" | "ICZN" => Ok(NomenclaturalCode::Zoological),
            "BACTERIAL" | "ICNB" | "ICNP" => Ok(NomenclaturalCode::Bacterial),
            "VIRAL" | "ICTV" | "ICVCN" => Ok(NomenclaturalCode::Viral),
            "CULTIVARS" | "ICNCP" => Ok(NomenclaturalCode::Cultivars),
            _ => Err(format!("unknown nomenclatural code: {}", s)),
        }
    }
}
