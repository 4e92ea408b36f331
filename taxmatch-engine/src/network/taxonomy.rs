//! Default taxonomic network
//!
//! Higher classification hangs off kingdom; family and the epithets hang off
//! genus; the full name is conditioned on its phonetic key.

use crate::error::SchemaError;
use crate::network::schema::{
    Normalizer, ObservableDef, ObservableId, ObservableType, Schema, SchemaBuilder,
};
use taxmatch_common::Issue;

pub const TAXON_ID: &str = "taxonId";
pub const TAXON_RANK: &str = "taxonRank";
pub const KINGDOM: &str = "kingdom";
pub const NOMENCLATURAL_CODE: &str = "nomenclaturalCode";
pub const PHYLUM: &str = "phylum";
pub const CLASS: &str = "class";
pub const ORDER: &str = "order";
pub const GENUS: &str = "genus";
pub const FAMILY: &str = "family";
pub const SPECIFIC_EPITHET: &str = "specificEpithet";
pub const INFRASPECIFIC_EPITHET: &str = "infraspecificEpithet";
pub const SOUNDEX_SCIENTIFIC_NAME: &str = "soundexScientificName";
pub const SCIENTIFIC_NAME: &str = "scientificName";
pub const SCIENTIFIC_NAME_AUTHORSHIP: &str = "scientificNameAuthorship";
pub const VERNACULAR_NAME: &str = "vernacularName";

/// Build the default taxonomic schema
pub fn taxonomic_schema() -> Result<Schema, SchemaError> {
    SchemaBuilder::new()
        .hypothesis(
            ObservableDef::required(TAXON_ID)
                .kind(ObservableType::Identifier)
                .normalizer(Normalizer::Exact),
        )
        .observable(
            ObservableDef::optional(TAXON_RANK)
                .kind(ObservableType::Rank)
                .normalizer(Normalizer::Rank)
                .relaxed_as(Issue::RemovedRank),
        )
        .observable(ObservableDef::optional(KINGDOM).relaxed_as(Issue::RemovedKingdom))
        .observable(
            ObservableDef::optional(NOMENCLATURAL_CODE)
                .kind(ObservableType::Code)
                .normalizer(Normalizer::Code)
                .depends_on(KINGDOM)
                .relaxed_as(Issue::RemovedCode),
        )
        .observable(
            ObservableDef::optional(PHYLUM)
                .depends_on(KINGDOM)
                .relaxed_as(Issue::RemovedPhylum),
        )
        .observable(
            ObservableDef::optional(CLASS)
                .depends_on(PHYLUM)
                .relaxed_as(Issue::RemovedClass),
        )
        .observable(
            ObservableDef::optional(ORDER)
                .depends_on(CLASS)
                .relaxed_as(Issue::RemovedOrder),
        )
        .observable(ObservableDef::optional(GENUS))
        .observable(
            ObservableDef::optional(FAMILY)
                .depends_on(GENUS)
                .relaxed_as(Issue::RemovedFamily),
        )
        .observable(ObservableDef::optional(SPECIFIC_EPITHET).depends_on(GENUS))
        .observable(ObservableDef::optional(INFRASPECIFIC_EPITHET).depends_on(SPECIFIC_EPITHET))
        .observable(
            ObservableDef::required(SOUNDEX_SCIENTIFIC_NAME)
                .kind(ObservableType::Phonetic)
                .normalizer(Normalizer::Exact)
                .derived(),
        )
        .observable(ObservableDef::required(SCIENTIFIC_NAME).depends_on(SOUNDEX_SCIENTIFIC_NAME))
        .observable(
            ObservableDef::optional(SCIENTIFIC_NAME_AUTHORSHIP)
                .normalizer(Normalizer::Lenient)
                .depends_on(SCIENTIFIC_NAME)
                .relaxed_as(Issue::RemovedAuthorship),
        )
        .observable(ObservableDef::many(VERNACULAR_NAME))
        .build()
}

/// Resolved ids of the observables the matcher and reference services use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonTerms {
    pub taxon_id: ObservableId,
    pub taxon_rank: ObservableId,
    pub kingdom: ObservableId,
    pub nomenclatural_code: ObservableId,
    pub phylum: ObservableId,
    pub class: ObservableId,
    pub order: ObservableId,
    pub family: ObservableId,
    pub genus: ObservableId,
    pub specific_epithet: ObservableId,
    pub infraspecific_epithet: ObservableId,
    pub soundex_scientific_name: ObservableId,
    pub scientific_name: ObservableId,
    pub scientific_name_authorship: ObservableId,
}

impl TaxonTerms {
    pub fn resolve(schema: &Schema) -> Result<Self, SchemaError> {
        Ok(Self {
            taxon_id: schema.require(TAXON_ID)?,
            taxon_rank: schema.require(TAXON_RANK)?,
            kingdom: schema.require(KINGDOM)?,
            nomenclatural_code: schema.require(NOMENCLATURAL_CODE)?,
            phylum: schema.require(PHYLUM)?,
            class: schema.require(CLASS)?,
            order: schema.require(ORDER)?,
            family: schema.require(FAMILY)?,
            genus: schema.require(GENUS)?,
            specific_epithet: schema.require(SPECIFIC_EPITHET)?,
            infraspecific_epithet: schema.require(INFRASPECIFIC_EPITHET)?,
            soundex_scientific_name: schema.require(SOUNDEX_SCIENTIFIC_NAME)?,
            scientific_name: schema.require(SCIENTIFIC_NAME)?,
            scientific_name_authorship: schema.require(SCIENTIFIC_NAME_AUTHORSHIP)?,
        })
    }
}
