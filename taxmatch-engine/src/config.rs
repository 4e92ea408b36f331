//! Matcher settings resolved against a schema
//!
//! The TOML layer (`taxmatch_common::config`) stores observable names; the
//! matcher works with observable ids. Resolution fails for unknown names and
//! for relaxation fields that carry no relaxation issue.

use crate::network::{ObservableId, Schema};
use crate::trace::TraceLevel;
use taxmatch_common::config::MatcherConfig;
use taxmatch_common::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct MatcherSettings {
    pub acceptance_threshold: f64,
    pub possible_threshold: f64,
    pub tie_margin: f64,
    pub relaxation_order: Vec<ObservableId>,
    pub max_synonym_depth: usize,
    pub ancestor_search_depth: usize,
    pub trace_level: Option<TraceLevel>,
}

impl MatcherSettings {
    pub fn from_config(config: &MatcherConfig, schema: &Schema) -> Result<Self, Error> {
        config.validate()?;

        let relaxation_order = config
            .relaxation_order
            .iter()
            .map(|name| {
                let id = schema.find(name).ok_or_else(|| {
                    Error::Config(format!("relaxation_order names unknown observable '{}'", name))
                })?;
                if schema.observable(id).relaxation_issue.is_none() {
                    return Err(Error::Config(format!(
                        "observable '{}' cannot be relaxed",
                        name
                    )));
                }
                Ok(id)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let trace_level = config
            .trace_level
            .as_deref()
            .map(str::parse::<TraceLevel>)
            .transpose()
            .map_err(Error::Config)?;

        Ok(Self {
            acceptance_threshold: config.acceptance_threshold,
            possible_threshold: config.possible_threshold,
            tie_margin: config.tie_margin,
            relaxation_order,
            max_synonym_depth: config.max_synonym_depth,
            ancestor_search_depth: config.ancestor_search_depth,
            trace_level,
        })
    }

    /// Compiled defaults for a schema
    pub fn defaults(schema: &Schema) -> Result<Self, Error> {
        Self::from_config(&MatcherConfig::default(), schema)
    }

    pub fn with_trace(mut self, level: Option<TraceLevel>) -> Self {
        self.trace_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::taxonomic_schema;

    #[test]
    fn test_defaults_resolve_against_taxonomic_schema() {
        let schema = taxonomic_schema().unwrap();
        let settings = MatcherSettings::defaults(&schema).unwrap();
        let names: Vec<&str> = settings
            .relaxation_order
            .iter()
            .map(|id| schema.observable(*id).name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["order", "family", "phylum", "class", "scientificNameAuthorship", "taxonRank"]
        );
        assert_eq!(settings.trace_level, None);
    }

    #[test]
    fn test_unknown_relaxation_field_rejected() {
        let schema = taxonomic_schema().unwrap();
        let config = MatcherConfig {
            relaxation_order: vec!["subtribe".to_string()],
            ..Default::default()
        };
        assert!(MatcherSettings::from_config(&config, &schema).is_err());
    }

    #[test]
    fn test_unrelaxable_field_rejected() {
        let schema = taxonomic_schema().unwrap();
        let config = MatcherConfig {
            relaxation_order: vec!["genus".to_string()],
            ..Default::default()
        };
        assert!(MatcherSettings::from_config(&config, &schema).is_err());
    }

    #[test]
    fn test_trace_level_parsed() {
        let schema = taxonomic_schema().unwrap();
        let config = MatcherConfig {
            trace_level: Some("debug".to_string()),
            ..Default::default()
        };
        let settings = MatcherSettings::from_config(&config, &schema).unwrap();
        assert_eq!(settings.trace_level, Some(TraceLevel::Debug));

        let bad = MatcherConfig {
            trace_level: Some("verbose".to_string()),
            ..Default::default()
        };
        assert!(MatcherSettings::from_config(&bad, &schema).is_err());
    }
}
