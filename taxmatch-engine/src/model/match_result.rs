//! Match outcome

use crate::model::{Classification, ClassificationView, Classifier};
use crate::network::Schema;
use crate::trace::{Trace, TraceNode};
use serde::Serialize;
use std::sync::Arc;
use taxmatch_common::{Issue, IssueSet};

/// Result of matching one query
///
/// An invalid match (no matched candidate) is an ordinary outcome; its
/// issues explain why no candidate was chosen.
#[derive(Debug, Clone)]
pub struct Match {
    matched: Option<Arc<dyn Classifier>>,
    accepted: Option<Arc<dyn Classifier>>,
    probability: f64,
    fidelity: f64,
    issues: IssueSet,
    query: Classification,
    trace: Option<Trace>,
}

impl Match {
    pub fn valid(
        matched: Arc<dyn Classifier>,
        accepted: Arc<dyn Classifier>,
        probability: f64,
        fidelity: f64,
        issues: IssueSet,
        query: Classification,
    ) -> Self {
        Self {
            matched: Some(matched),
            accepted: Some(accepted),
            probability,
            fidelity,
            issues,
            query,
            trace: None,
        }
    }

    pub fn invalid(query: Classification, issues: IssueSet) -> Self {
        Self {
            matched: None,
            accepted: None,
            probability: 0.0,
            fidelity: 0.0,
            issues,
            query,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: Option<Trace>) -> Self {
        self.trace = trace;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.matched.is_some()
    }

    pub fn matched(&self) -> Option<&Arc<dyn Classifier>> {
        self.matched.as_ref()
    }

    pub fn accepted(&self) -> Option<&Arc<dyn Classifier>> {
        self.accepted.as_ref()
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn fidelity(&self) -> f64 {
        self.fidelity
    }

    pub fn issues(&self) -> &IssueSet {
        &self.issues
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.insert(issue);
    }

    pub fn query(&self) -> &Classification {
        &self.query
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub fn summary(&self, schema: &Schema) -> MatchSummary {
        MatchSummary {
            valid: self.is_valid(),
            matched_id: self.matched.as_ref().map(|c| c.id().to_string()),
            matched_name: self
                .matched
                .as_ref()
                .and_then(|c| c.display_name().map(str::to_string)),
            accepted_id: self.accepted.as_ref().map(|c| c.id().to_string()),
            accepted_name: self
                .accepted
                .as_ref()
                .and_then(|c| c.display_name().map(str::to_string)),
            probability: self.probability,
            fidelity: self.fidelity,
            issues: self.issues.clone(),
            query: ClassificationView::new(&self.query, schema),
            trace: self.trace.as_ref().map(Trace::to_node),
        }
    }
}

/// Serialisable view of a match, one per output line in batch mode
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_name: Option<String>,
    pub probability: f64,
    pub fidelity: f64,
    pub issues: IssueSet,
    pub query: ClassificationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceNode>,
}
