//! Fixture corpus
//!
//! A small reference classification: two kingdoms, the genus homonym
//! *Agathis* (a conifer and a wasp), two *Acacia* species and one synonym.

use serde_json::json;
use std::sync::Arc;
use taxmatch_common::config::BuilderConfig;
use taxmatch_engine::model::Classification;
use taxmatch_engine::network::{taxonomic_schema, CompiledNetwork, TaxonTerms};
use taxmatch_engine::parameters::ParameterStore;
use taxmatch_engine::services::{MemoryIndex, NameAnalyser, TaxonEntry};
use taxmatch_engine::{ClassificationMatcher, MatcherSettings};

pub fn reference_corpus() -> Vec<TaxonEntry> {
    serde_json::from_value(json!([
        {
            "taxonId": "k1",
            "scientificName": "Plantae",
            "taxonRank": "kingdom",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL"
        },
        {
            "taxonId": "k2",
            "scientificName": "Animalia",
            "taxonRank": "kingdom",
            "kingdom": "Animalia",
            "nomenclaturalCode": "ZOOLOGICAL"
        },
        {
            "taxonId": "f1",
            "scientificName": "Fabaceae",
            "taxonRank": "family",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "phylum": "Charophyta",
            "class": "Equisetopsida",
            "order": "Fabales",
            "family": "Fabaceae",
            "parentNameUsageID": "k1"
        },
        {
            "taxonId": "g1",
            "scientificName": "Acacia",
            "taxonRank": "genus",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "phylum": "Charophyta",
            "class": "Equisetopsida",
            "order": "Fabales",
            "family": "Fabaceae",
            "parentNameUsageID": "f1"
        },
        {
            "taxonId": "s1",
            "scientificName": "Acacia dealbata",
            "scientificNameAuthorship": "Link",
            "taxonRank": "species",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "phylum": "Charophyta",
            "class": "Equisetopsida",
            "order": "Fabales",
            "family": "Fabaceae",
            "vernacularName": ["Silver Wattle"],
            "parentNameUsageID": "g1"
        },
        {
            "taxonId": "s2",
            "scientificName": "Acacia baileyana",
            "scientificNameAuthorship": "F.Muell.",
            "taxonRank": "species",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "phylum": "Charophyta",
            "class": "Equisetopsida",
            "order": "Fabales",
            "family": "Fabaceae",
            "vernacularName": ["Cootamundra Wattle"],
            "parentNameUsageID": "g1"
        },
        {
            "taxonId": "sy1",
            "scientificName": "Racosperma dealbatum",
            "taxonRank": "species",
            "taxonomicStatus": "synonym",
            "acceptedNameUsageID": "s1",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "family": "Fabaceae"
        },
        {
            "taxonId": "f2",
            "scientificName": "Araucariaceae",
            "taxonRank": "family",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "phylum": "Tracheophyta",
            "class": "Pinopsida",
            "order": "Pinales",
            "family": "Araucariaceae",
            "parentNameUsageID": "k1"
        },
        {
            "taxonId": "g2",
            "scientificName": "Agathis",
            "taxonRank": "genus",
            "kingdom": "Plantae",
            "nomenclaturalCode": "BOTANICAL",
            "phylum": "Tracheophyta",
            "class": "Pinopsida",
            "order": "Pinales",
            "family": "Araucariaceae",
            "parentNameUsageID": "f2"
        },
        {
            "taxonId": "f3",
            "scientificName": "Braconidae",
            "taxonRank": "family",
            "kingdom": "Animalia",
            "nomenclaturalCode": "ZOOLOGICAL",
            "phylum": "Arthropoda",
            "class": "Insecta",
            "order": "Hymenoptera",
            "family": "Braconidae",
            "parentNameUsageID": "k2"
        },
        {
            "taxonId": "g3",
            "scientificName": "Agathis",
            "taxonRank": "genus",
            "kingdom": "Animalia",
            "nomenclaturalCode": "ZOOLOGICAL",
            "phylum": "Arthropoda",
            "class": "Insecta",
            "order": "Hymenoptera",
            "family": "Braconidae",
            "parentNameUsageID": "f3"
        }
    ]))
    .expect("fixture corpus deserialises")
}

/// Reference corpus plus duplicated names, a synonym loop, misapplied and
/// excluded names, and synonyms whose accepted record is missing
pub fn ambiguous_corpus() -> Vec<TaxonEntry> {
    let mut entries = reference_corpus();
    let extra: Vec<TaxonEntry> = serde_json::from_value(json!([
        {
            "taxonId": "sy2",
            "scientificName": "Acacia dealbata",
            "taxonRank": "species",
            "taxonomicStatus": "synonym",
            "acceptedNameUsageID": "s1",
            "kingdom": "Plantae",
            "family": "Fabaceae"
        },
        {
            "taxonId": "sy3",
            "scientificName": "Acacia baileyana",
            "taxonRank": "species",
            "taxonomicStatus": "heterotypicSynonym",
            "acceptedNameUsageID": "s1",
            "kingdom": "Plantae",
            "family": "Fabaceae"
        },
        {
            "taxonId": "l1",
            "scientificName": "Loopus primus",
            "taxonRank": "species",
            "taxonomicStatus": "synonym",
            "acceptedNameUsageID": "l2",
            "kingdom": "Plantae"
        },
        {
            "taxonId": "l2",
            "scientificName": "Loopus secundus",
            "taxonRank": "species",
            "taxonomicStatus": "synonym",
            "acceptedNameUsageID": "l1",
            "kingdom": "Plantae"
        },
        {
            "taxonId": "m1",
            "scientificName": "Acacia misapplica",
            "taxonRank": "species",
            "taxonomicStatus": "misapplied",
            "acceptedNameUsageID": "s2",
            "kingdom": "Plantae"
        },
        {
            "taxonId": "o1",
            "scientificName": "Orphanus",
            "taxonRank": "genus",
            "taxonomicStatus": "synonym",
            "acceptedNameUsageID": "missing",
            "kingdom": "Plantae"
        },
        {
            "taxonId": "ns1",
            "scientificName": "Acacia nudata",
            "taxonRank": "species",
            "taxonomicStatus": "synonym",
            "kingdom": "Plantae"
        },
        {
            "taxonId": "pc1",
            "scientificName": "Acacia ambigua",
            "taxonRank": "species",
            "taxonomicStatus": "unknown",
            "kingdom": "Plantae",
            "family": "Fabaceae",
            "parentNameUsageID": "g1"
        },
        {
            "taxonId": "pc2",
            "scientificName": "Acacia ambigua",
            "taxonRank": "species",
            "taxonomicStatus": "synonym",
            "acceptedNameUsageID": "g1",
            "kingdom": "Plantae",
            "family": "Fabaceae"
        },
        {
            "taxonId": "tw1",
            "scientificName": "Acacia gemina",
            "taxonRank": "species",
            "kingdom": "Plantae",
            "family": "Fabaceae",
            "parentNameUsageID": "g1"
        },
        {
            "taxonId": "tw2",
            "scientificName": "Acacia gemina",
            "taxonRank": "species",
            "kingdom": "Plantae",
            "family": "Fabaceae",
            "parentNameUsageID": "g1"
        },
        {
            "taxonId": "pm1",
            "scientificName": "Acacia partima",
            "taxonRank": "species",
            "taxonomicStatus": "partiallyMisapplied",
            "acceptedNameUsageID": "s2",
            "kingdom": "Plantae"
        },
        {
            "taxonId": "px1",
            "scientificName": "Acacia exclusa",
            "taxonRank": "species",
            "taxonomicStatus": "partiallyExcluded",
            "kingdom": "Plantae"
        }
    ]))
    .expect("fixture extras deserialise");
    entries.extend(extra);
    entries
}

/// Matcher over `entries` with default settings
pub fn build_matcher(entries: Vec<TaxonEntry>) -> ClassificationMatcher {
    build_matcher_with(entries, |settings| settings)
}

/// Matcher over `entries` with adjusted settings
pub fn build_matcher_with<F>(entries: Vec<TaxonEntry>, adjust: F) -> ClassificationMatcher
where
    F: FnOnce(MatcherSettings) -> MatcherSettings,
{
    assemble(entries, None, adjust)
}

/// Matcher whose index is seeded from a parameter store
pub fn build_matcher_with_store(
    entries: Vec<TaxonEntry>,
    store: &ParameterStore,
) -> ClassificationMatcher {
    assemble(entries, Some(store), |settings| settings)
}

fn assemble<F>(
    entries: Vec<TaxonEntry>,
    store: Option<&ParameterStore>,
    adjust: F,
) -> ClassificationMatcher
where
    F: FnOnce(MatcherSettings) -> MatcherSettings,
{
    let schema = taxonomic_schema().expect("taxonomic schema builds");
    let network = Arc::new(CompiledNetwork::compile(schema));
    let index = Arc::new(
        MemoryIndex::from_entries(network.schema(), entries, store).expect("fixture index builds"),
    );
    let terms = TaxonTerms::resolve(network.schema()).expect("taxon terms resolve");
    let settings = adjust(MatcherSettings::defaults(network.schema()).expect("default settings"));

    ClassificationMatcher::new(
        network,
        index.clone(),
        Arc::new(NameAnalyser::new(terms)),
        index,
        settings,
        &BuilderConfig::default(),
    )
    .expect("matcher builds")
}

/// Query from observable name/value pairs
pub fn query(matcher: &ClassificationMatcher, pairs: &[(&str, &str)]) -> Classification {
    Classification::from_pairs(matcher.schema(), pairs.iter().copied())
        .expect("fixture query uses known observables")
}
