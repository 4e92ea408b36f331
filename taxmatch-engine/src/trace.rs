//! Inference trace
//!
//! A stack-scoped accumulator recording inference and matching steps as a
//! tree. Entries are filtered by verbosity when added; a suppressed `push`
//! still has to be balanced by a `pop`. Keys keep insertion order so the JSON
//! form is stable for golden-file comparison.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Verbosity, least detailed first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Summary,
    Info,
    Debug,
    Trace,
}

impl FromStr for TraceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(TraceLevel::Summary),
            "info" => Ok(TraceLevel::Info),
            "debug" => Ok(TraceLevel::Debug),
            "trace" => Ok(TraceLevel::Trace),
            other => Err(format!("unknown trace level: {}", other)),
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceLevel::Summary => "summary",
            TraceLevel::Info => "info",
            TraceLevel::Debug => "debug",
            TraceLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceNode {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<TraceEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn child(&self, label: &str) -> Option<&TraceNode> {
        self.children.iter().find(|c| c.label == label)
    }
}

#[derive(Debug, Clone)]
pub struct Trace {
    level: TraceLevel,
    /// Open nodes; index 0 is the root
    stack: Vec<TraceNode>,
    /// Pushes filtered out since the innermost recorded node
    suppressed: usize,
}

impl Trace {
    pub fn new(level: TraceLevel) -> Self {
        Self {
            level,
            stack: vec![TraceNode::new("trace")],
            suppressed: 0,
        }
    }

    pub fn level(&self) -> TraceLevel {
        self.level
    }

    pub fn enabled(&self, level: TraceLevel) -> bool {
        self.suppressed == 0 && level <= self.level
    }

    pub fn push(&mut self, level: TraceLevel, label: &str) {
        if self.enabled(level) {
            self.stack.push(TraceNode::new(label));
        } else {
            self.suppressed += 1;
        }
    }

    pub fn add<V: Into<serde_json::Value>>(&mut self, level: TraceLevel, key: &str, value: V) {
        if !self.enabled(level) {
            return;
        }
        if let Some(node) = self.stack.last_mut() {
            node.values.push(TraceEntry {
                key: key.to_string(),
                value: value.into(),
            });
        }
    }

    /// Like [`add`](Self::add), computing the value only when recorded
    pub fn add_with<V, F>(&mut self, level: TraceLevel, key: &str, value: F)
    where
        V: Into<serde_json::Value>,
        F: FnOnce() -> V,
    {
        if self.enabled(level) {
            self.add(level, key, value());
        }
    }

    pub fn pop(&mut self) {
        if self.suppressed > 0 {
            self.suppressed -= 1;
            return;
        }
        // Root stays open
        if self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                if let Some(parent) = self.stack.last_mut() {
                    parent.children.push(node);
                }
            }
        }
    }

    /// Close any open nodes and return the tree
    pub fn finish(mut self) -> TraceNode {
        self.suppressed = 0;
        while self.stack.len() > 1 {
            self.pop();
        }
        self.stack.pop().unwrap_or_else(|| TraceNode::new("trace"))
    }

    /// Snapshot of the tree, closing open nodes on a copy
    pub fn to_node(&self) -> TraceNode {
        self.clone().finish()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.to_node()).unwrap_or(serde_json::Value::Null)
    }
}
