//! Taxonomic ranks
//!
//! Ranks are ordered from coarsest (domain) to finest (cultivar). `Unranked`
//! sits outside the ordering and never compares as coarser or finer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxonomic rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Domain,
    Kingdom,
    Subkingdom,
    Phylum,
    Subphylum,
    Class,
    Subclass,
    Order,
    Suborder,
    Family,
    Subfamily,
    Tribe,
    Genus,
    Subgenus,
    Section,
    Series,
    Species,
    Subspecies,
    Variety,
    Form,
    Cultivar,
    Unranked,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Domain => "domain",
            Rank::Kingdom => "kingdom",
            Rank::Subkingdom => "subkingdom",
            Rank::Phylum => "phylum",
            Rank::Subphylum => "subphylum",
            Rank::Class => "class",
            Rank::Subclass => "subclass",
            Rank::Order => "order",
            Rank::Suborder => "suborder",
            Rank::Family => "family",
            Rank::Subfamily => "subfamily",
            Rank::Tribe => "tribe",
            Rank::Genus => "genus",
            Rank::Subgenus => "subgenus",
            Rank::Section => "section",
            Rank::Series => "series",
            Rank::Species => "species",
            Rank::Subspecies => "subspecies",
            Rank::Variety => "variety",
            Rank::Form => "form",
            Rank::Cultivar => "cultivar",
            Rank::Unranked => "unranked",
        }
    }

    /// Look up an abbreviated rank marker as written inside a name
    ///
    /// Accepts an optional trailing period: `sp`, `sp.`, `spp.`, `subsp.`,
    /// `ssp.`, `var.`, `f.`, `cv.`, `gen.`, `fam.`, `sect.`, `ser.`.
    pub fn from_marker(token: &str) -> Option<Rank> {
        let token = token.trim().trim_end_matches('.').to_lowercase();
        match token.as_str() {
            "sp" | "spp" | "spec" | "species" => Some(Rank::Species),
            "ssp" | "subsp" | "subspecies" => Some(Rank::Subspecies),
            "var" | "variety" => Some(Rank::Variety),
            "f" | "fm" | "forma" => Some(Rank::Form),
            "cv" | "cultivar" => Some(Rank::Cultivar),
            "gen" | "genus" => Some(Rank::Genus),
            "subgen" | "subg" => Some(Rank::Subgenus),
            "sect" | "section" => Some(Rank::Section),
            "ser" | "series" => Some(Rank::Series),
            "fam" | "family" => Some(Rank::Family),
            _ => None,
        }
    }

    /// True when `self` is strictly coarser than `other` (both ranked)
    pub fn is_coarser_than(&self, other: Rank) -> bool {
        if *self == Rank::Unranked || other == Rank::Unranked {
            return false;
        }
        *self < other
    }

    /// True for ranks that appear as a Linnaean higher-classification field
    pub fn is_linnaean(&self) -> bool {
        matches!(
            self,
            Rank::Kingdom | Rank::Phylum | Rank::Class | Rank::Order | Rank::Family | Rank::Genus
        )
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let rank = match lower.as_str() {
            "domain" | "superkingdom" => Rank::Domain,
            "kingdom" | "regnum" => Rank::Kingdom,
            "subkingdom" => Rank::Subkingdom,
            "phylum" | "division" => Rank::Phylum,
            "subphylum" | "subdivision" => Rank::Subphylum,
            "class" | "classis" => Rank::Class,
            "subclass" => Rank::Subclass,
            "order" | "ordo" => Rank::Order,
            "suborder" => Rank::Suborder,
            "family" | "familia" => Rank::Family,
            "subfamily" => Rank::Subfamily,
            "tribe" => Rank::Tribe,
            "genus" => Rank::Genus,
            "subgenus" => Rank::Subgenus,
            "section" => Rank::Section,
            "series" => Rank::Series,
            "species" => Rank::Species,
            "subspecies" => Rank::Subspecies,
            "variety" | "varietas" => Rank::Variety,
            "form" | "forma" => Rank::Form,
            "cultivar" => Rank::Cultivar,
            "unranked" | "" => Rank::Unranked,
            other => return Rank::from_marker(other).ok_or_else(|| format!("unknown rank: {}", s)),
        };
        Ok(rank)
    }
}
