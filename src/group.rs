// SPDX-License-Identifier: MIT
//! Deduplicating per-rule aggregation of annotated violation nodes.
//!
//! Buckets keep the order in which their rule first appeared in the engine
//! output, and a bucket's failure-summary text collapses runs of identical
//! consecutive summaries down to one line.

use std::collections::HashMap;

use crate::model::{AnnotatedNode, Impact, IssueGroup, Violation};

/// One resolvable occurrence inside a bucket, as fed to the advisor prompt.
#[derive(Debug, Clone)]
pub struct IssueExample {
    pub html: String,
    pub failure_summary: String,
    pub description: String,
}

/// A completed per-rule bucket, ready for remediation + persistence.
#[derive(Debug, Clone)]
pub struct PendingIssue {
    pub rule_id: String,
    pub impact: Option<Impact>,
    pub description: String,
    pub examples: Vec<IssueExample>,
}

impl PendingIssue {
    /// Assemble the persisted group: snippets blank-line joined, summaries
    /// newline joined with consecutive duplicates collapsed.
    pub fn into_group(self, llm_suggestions: String, timestamp: Option<String>) -> IssueGroup {
        let code = self
            .examples
            .iter()
            .map(|e| e.html.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut summaries: Vec<&str> = Vec::new();
        for example in &self.examples {
            if summaries.last() != Some(&example.failure_summary.as_str()) {
                summaries.push(&example.failure_summary);
            }
        }

        IssueGroup {
            issue_type: self.rule_id,
            code,
            impact: self.impact,
            description: self.description,
            failure_summary: summaries.join("\n"),
            llm_suggestions,
            timestamp,
        }
    }
}

/// In-memory aggregation, owned by the grouping stage until flushed.
#[derive(Debug, Default)]
pub struct Grouper {
    order: Vec<String>,
    buckets: HashMap<String, PendingIssue>,
}

impl Grouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket one annotated node under its owning violation's rule id.
    ///
    /// The first node seen for a rule fixes the bucket's representative
    /// impact and description.
    pub fn add(&mut self, violation: &Violation, node: AnnotatedNode) {
        let bucket = match self.buckets.entry(violation.id.clone()) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                self.order.push(violation.id.clone());
                e.insert(PendingIssue {
                    rule_id: violation.id.clone(),
                    impact: violation.impact,
                    description: violation.description.clone(),
                    examples: Vec::new(),
                })
            }
        };
        bucket.examples.push(IssueExample {
            html: node.html,
            failure_summary: node.failure_summary,
            description: violation.description.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drain buckets in first-occurrence order.
    pub fn into_issues(mut self) -> Vec<PendingIssue> {
        self.order
            .iter()
            .filter_map(|rule| self.buckets.remove(rule))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn violation(id: &str, impact: Impact, description: &str) -> Violation {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "impact": serde_json::to_value(impact).unwrap(),
            "description": description,
            "nodes": []
        }))
        .unwrap()
    }

    fn node(html: &str, summary: &str) -> AnnotatedNode {
        AnnotatedNode {
            html: html.to_string(),
            failure_summary: summary.to_string(),
            bounds: BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
        }
    }

    #[test]
    fn identical_consecutive_summaries_collapse_to_one_line() {
        let v = violation("image-alt", Impact::Critical, "Images need alt text");
        let mut g = Grouper::new();
        g.add(&v, node("<img a>", "add an alt attribute"));
        g.add(&v, node("<img b>", "add an alt attribute"));

        let issues = g.into_issues();
        assert_eq!(issues.len(), 1);
        let group = issues.into_iter().next().unwrap().into_group(String::new(), None);
        assert_eq!(group.failure_summary, "add an alt attribute");
        assert_eq!(group.code, "<img a>\n\n<img b>");
    }

    #[test]
    fn distinct_summaries_keep_encounter_order() {
        let v = violation("color-contrast", Impact::Serious, "Contrast too low");
        let mut g = Grouper::new();
        g.add(&v, node("<p a>", "ratio 2.1"));
        g.add(&v, node("<p b>", "ratio 3.4"));

        let group = g
            .into_issues()
            .into_iter()
            .next()
            .unwrap()
            .into_group(String::new(), None);
        assert_eq!(group.failure_summary, "ratio 2.1\nratio 3.4");
    }

    #[test]
    fn collapse_is_consecutive_only() {
        let v = violation("label", Impact::Moderate, "Form elements need labels");
        let mut g = Grouper::new();
        g.add(&v, node("<input a>", "s1"));
        g.add(&v, node("<input b>", "s2"));
        g.add(&v, node("<input c>", "s1"));

        let group = g
            .into_issues()
            .into_iter()
            .next()
            .unwrap()
            .into_group(String::new(), None);
        // s1 reappears after s2, so it is not a consecutive duplicate.
        assert_eq!(group.failure_summary, "s1\ns2\ns1");
    }

    #[test]
    fn buckets_keep_first_occurrence_order() {
        let a = violation("image-alt", Impact::Critical, "a");
        let b = violation("color-contrast", Impact::Serious, "b");
        let mut g = Grouper::new();
        g.add(&a, node("<img>", "s"));
        g.add(&b, node("<p>", "s"));
        g.add(&a, node("<img>", "s"));

        let issues = g.into_issues();
        let rules: Vec<_> = issues.iter().map(|i| i.rule_id.as_str()).collect();
        assert_eq!(rules, vec!["image-alt", "color-contrast"]);
        assert_eq!(issues[0].examples.len(), 2);
        assert_eq!(issues[1].examples.len(), 1);
    }

    #[test]
    fn representative_fields_come_from_first_node() {
        let v = violation("image-alt", Impact::Critical, "Images need alt text");
        let mut g = Grouper::new();
        g.add(&v, node("<img>", "s"));
        let group = g
            .into_issues()
            .into_iter()
            .next()
            .unwrap()
            .into_group("try this".into(), Some("ts".into()));
        assert_eq!(group.impact, Some(Impact::Critical));
        assert_eq!(group.description, "Images need alt text");
        assert_eq!(group.llm_suggestions, "try this");
        assert_eq!(group.timestamp.as_deref(), Some("ts"));
    }
}
