// SPDX-License-Identifier: MIT
//! Typed views over the rule engine's output, and the focused-report types.
//!
//! The engine result is persisted verbatim as a `serde_json::Value`; the
//! structs here are a *partial* decode of that value (unknown fields are
//! ignored) used by the annotation and grouping stages.

use serde::{Deserialize, Serialize};

/// Severity level the rule engine assigns to a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

/// The subset of the engine result the pipeline actually processes.
#[derive(Debug, Clone, Deserialize)]
pub struct AxeResults {
    /// Engine-reported capture timestamp (RFC 3339). Copied into every group.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

/// One rule breach, with one or more concrete node occurrences.
#[derive(Debug, Clone, Deserialize)]
pub struct Violation {
    /// Rule identifier, e.g. `image-alt` or `color-contrast`.
    pub id: String,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<ViolationNode>,
}

/// One occurrence of a violation on the page, as reported by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct ViolationNode {
    /// CSS selectors locating the offending element. The first entry is the
    /// primary selector used for live resolution.
    #[serde(default)]
    pub target: Vec<String>,
    /// HTML snippet captured by the engine at audit time. May be stale by the
    /// time annotation runs.
    #[serde(default)]
    pub html: String,
    #[serde(default, rename = "failureSummary")]
    pub failure_summary: String,
}

impl ViolationNode {
    /// The selector used to re-resolve this node on the live page.
    pub fn primary_target(&self) -> Option<&str> {
        self.target.first().map(String::as_str)
    }
}

/// Pixel-space rectangle relative to the full-page screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A violation node that resolved against the live page.
///
/// `html` is the element's *current* outerHTML, preferred over the engine's
/// snippet because the DOM may have mutated since the audit ran.
#[derive(Debug, Clone)]
pub struct AnnotatedNode {
    pub html: String,
    pub failure_summary: String,
    pub bounds: BoundingBox,
}

/// Per-rule aggregate written to `focused_accessibility_issues.json`.
///
/// Field names match what the viewer reads; `failureSummary` keeps the
/// engine's camelCase spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueGroup {
    pub issue_type: String,
    /// All annotated snippets for this rule, blank-line separated.
    pub code: String,
    pub impact: Option<Impact>,
    pub description: String,
    /// Newline-joined failure summaries; a summary identical to the one
    /// immediately before it in this group is collapsed away.
    #[serde(rename = "failureSummary")]
    pub failure_summary: String,
    pub llm_suggestions: String,
    pub timestamp: Option<String>,
}
