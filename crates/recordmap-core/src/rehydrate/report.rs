//! Rehydration report
//!
//! Collects every deviation between the input record and the rebuilt object
//! graph: unresolved annotations, relaxed keyword arguments, fields attached
//! after construction, rejected fields and abandoned constructions.

use crate::error::{ReportCode, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One recorded deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    pub code: ReportCode,
    pub path: String,
    pub message: String,
    pub severity: Severity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Summary of report statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_items: usize,
    pub by_severity: HashMap<String, usize>,
    pub by_code: HashMap<String, usize>,
}

/// Ordered list of deviations for one rehydration call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RehydrationReport {
    items: Vec<ReportItem>,
}

impl RehydrationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item with the default severity for its code
    pub fn record(
        &mut self,
        code: ReportCode,
        path: &str,
        message: impl Into<String>,
        value: Option<Value>,
    ) {
        self.items.push(ReportItem {
            code,
            path: path.to_string(),
            message: message.into(),
            severity: default_severity(code),
            value,
        });
    }

    /// All items in the order they were recorded
    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    /// Items with a given code
    pub fn items_with_code(&self, code: ReportCode) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(move |item| item.code == code)
    }

    /// Items recorded at an exact path
    pub fn items_at(&self, path: &str) -> Vec<&ReportItem> {
        self.items
            .iter()
            .filter(|item| item.path == path)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Highest severity recorded
    pub fn max_severity(&self) -> Option<Severity> {
        self.items.iter().map(|item| item.severity).max()
    }

    /// Whether any part of the data was lost
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.severity >= Severity::Error)
    }

    /// Counts by severity and by code
    pub fn summary(&self) -> ReportSummary {
        let mut by_severity = HashMap::new();
        let mut by_code = HashMap::new();
        for item in &self.items {
            *by_severity.entry(item.severity.to_string()).or_insert(0) += 1;
            *by_code.entry(item.code.to_string()).or_insert(0) += 1;
        }
        ReportSummary {
            total_items: self.items.len(),
            by_severity,
            by_code,
        }
    }
}

fn default_severity(code: ReportCode) -> Severity {
    match code {
        ReportCode::Attached | ReportCode::Unresolved => Severity::Info,
        ReportCode::Relaxed | ReportCode::Rejected => Severity::Warning,
        ReportCode::Abandoned => Severity::Error,
    }
}
