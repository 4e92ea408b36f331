//! Query analysis
//!
//! The [`Analyser`] prepares a raw query before matching and may annotate
//! the result afterwards. [`NameAnalyser`] is the reference implementation:
//! it splits a scientific name into its parts, strips qualifiers and
//! authorship, and computes the phonetic key.

use crate::error::MatchInputError;
use crate::model::{Classification, Match};
use crate::network::TaxonTerms;
use crate::services::soundex::taxon_soundex;
use taxmatch_common::{Issue, Rank};
use tracing::debug;

pub trait Analyser: Send + Sync {
    /// Derive fields and pre-tag issues on a raw query
    fn analyse(&self, query: Classification) -> Result<Classification, MatchInputError>;

    /// Annotate a finished match
    fn after_match(&self, _result: &mut Match) {}
}

/// A name broken into its parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedName {
    /// Name without qualifiers or authorship
    pub canonical: String,
    pub genus: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    /// Rank implied by the structure of the name
    pub rank: Option<Rank>,
    pub authorship: Option<String>,
    pub qualifiers: Vec<Issue>,
}

impl ParsedName {
    pub fn is_uninomial(&self) -> bool {
        self.specific_epithet.is_none()
    }
}

/// Record identifiers are single tokens carrying a digit, ':' or '/'
pub fn looks_like_identifier(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && !name.contains(char::is_whitespace)
        && name.contains(|c: char| c.is_ascii_digit() || c == ':' || c == '/')
}

/// Epithets are lowercase words; in an all-caps name any plain word is one
fn is_epithet(token: &str, shouting: bool) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_lowercase() || (shouting && c.is_alphabetic()))
        && token.chars().all(|c| c.is_alphabetic() || c == '-')
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

/// Suffixes of family-group and higher uninomials
fn is_suprageneric(name: &str) -> bool {
    let lower = name.to_lowercase();
    ["aceae", "idae", "ales", "inae", "oidea", "phyta", "mycota"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

pub fn parse_name(name: &str) -> Result<ParsedName, MatchInputError> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(MatchInputError::EmptyName);
    }
    if tokens.iter().all(|t| Rank::from_marker(t).is_some()) {
        return Err(MatchInputError::BareRankMarker(name.trim().to_string()));
    }
    let first = tokens[0];
    if !first.starts_with(char::is_alphabetic) {
        return Err(MatchInputError::Unparseable(name.trim().to_string()));
    }
    let shouting = is_all_caps(first);

    let mut parsed = ParsedName {
        genus: Some(first.to_string()),
        ..Default::default()
    };
    let mut canonical = vec![first];
    let mut marker: Option<(&str, Rank)> = None;

    let mut index = 1;
    while index < tokens.len() {
        let token = tokens[index];
        let bare = token.trim_end_matches('.').to_lowercase();
        match bare.as_str() {
            "cf" => parsed.qualifiers.push(Issue::ConferSpeciesName),
            "aff" => parsed.qualifiers.push(Issue::AffinitySpeciesName),
            "×" | "x" => {}
            _ => {
                let rank = Rank::from_marker(token);
                if rank == Some(Rank::Species) {
                    if parsed.specific_epithet.is_none() {
                        parsed.qualifiers.push(Issue::IndeterminateSpecies);
                        parsed.rank = Some(Rank::Genus);
                        break;
                    }
                } else if let (Some(rank), true) = (rank, parsed.specific_epithet.is_some()) {
                    marker = Some((token, rank));
                } else if is_epithet(token, shouting) && parsed.infraspecific_epithet.is_none() {
                    if parsed.specific_epithet.is_none() {
                        parsed.specific_epithet = Some(token.to_string());
                        parsed.rank = Some(Rank::Species);
                    } else {
                        if let Some((written, _)) = marker {
                            canonical.push(written);
                        }
                        parsed.infraspecific_epithet = Some(token.to_string());
                        parsed.rank = Some(marker.map(|(_, r)| r).unwrap_or(Rank::Subspecies));
                    }
                    canonical.push(token);
                } else {
                    parsed.authorship = Some(tokens[index..].join(" "));
                    break;
                }
            }
        }
        index += 1;
    }

    parsed.canonical = canonical.join(" ");
    Ok(parsed)
}

/// Reference analyser for the default taxonomic network
#[derive(Debug, Clone)]
pub struct NameAnalyser {
    terms: TaxonTerms,
}

impl NameAnalyser {
    pub fn new(terms: TaxonTerms) -> Self {
        Self { terms }
    }
}

impl Analyser for NameAnalyser {
    fn analyse(&self, mut query: Classification) -> Result<Classification, MatchInputError> {
        let terms = &self.terms;
        let Some(raw) = query.get(terms.scientific_name).map(str::to_string) else {
            if query.has(terms.taxon_id) {
                return Ok(query);
            }
            return Err(MatchInputError::EmptyName);
        };
        if looks_like_identifier(&raw) {
            debug!(name = %raw, "Name looks like an identifier, skipping parse");
            return Ok(query);
        }

        let parsed = parse_name(&raw)?;
        for qualifier in &parsed.qualifiers {
            query.add_issue(*qualifier);
        }
        if let Some(authorship) = &parsed.authorship {
            query.add_issue(Issue::CanonicalName);
            if !query.has(terms.scientific_name_authorship) {
                query.set(terms.scientific_name_authorship, authorship);
            }
        }
        if parsed.canonical != raw.split_whitespace().collect::<Vec<_>>().join(" ") {
            query.set(terms.scientific_name, &parsed.canonical);
        }

        let explicit_rank = query
            .get(terms.taxon_rank)
            .and_then(|r| r.parse::<Rank>().ok());
        let above_genus = explicit_rank.is_some_and(|r| r.is_coarser_than(Rank::Genus));
        if let Some(genus) = &parsed.genus {
            let genus_like = !parsed.is_uninomial() || (!above_genus && !is_suprageneric(genus));
            if genus_like && !query.has(terms.genus) {
                query.set(terms.genus, genus);
            }
        }
        if let Some(epithet) = &parsed.specific_epithet {
            if !query.has(terms.specific_epithet) {
                query.set(terms.specific_epithet, epithet);
            }
        }
        if let Some(epithet) = &parsed.infraspecific_epithet {
            if !query.has(terms.infraspecific_epithet) {
                query.set(terms.infraspecific_epithet, epithet);
            }
        }

        query.set(terms.soundex_scientific_name, &taxon_soundex(&parsed.canonical));
        query.set_implied_rank(parsed.rank.or(explicit_rank));
        Ok(query)
    }

    fn after_match(&self, result: &mut Match) {
        let Some(implied) = result.query().implied_rank() else {
            return;
        };
        let matched_rank = result
            .matched()
            .and_then(|m| m.value(self.terms.taxon_rank))
            .and_then(|r| r.parse::<Rank>().ok());
        if let Some(rank) = matched_rank {
            if rank.is_coarser_than(implied) {
                debug!(implied = %implied, matched = %rank, "Match is above the implied rank");
                result.add_issue(Issue::HigherOrderMatch);
            }
        }
    }
}
