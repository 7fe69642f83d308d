// SPDX-License-Identifier: MIT
//! Remediation advisor: asks a hosted chat-completions endpoint for a
//! code-level fix per issue group.
//!
//! Failure is never fatal here. Transport errors get a small retry budget
//! with backoff; an HTTP error status is the service's answer and is not
//! retried. Either way the group is persisted with a fallback string.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::RemediationConfig;
use crate::group::IssueExample;
use crate::retry::{retry_with_backoff, RetryConfig};

/// Substituted when the endpoint returns a non-success status or cannot be
/// reached at all.
pub const FALLBACK_REQUEST_FAILED: &str = "API request failed.";
/// Substituted when the endpoint answers 200 but the body carries no choices.
pub const FALLBACK_NO_CONTENT: &str = "No content available in the response.";

const SYSTEM_PROMPT: &str = "You are an AI tool designed to assist developers and designers in \
     enhancing the accessibility of their web applications.";

pub struct RemediationAdvisor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    retry: RetryConfig,
}

impl RemediationAdvisor {
    /// Build an advisor from config, or `None` when remediation is disabled
    /// or no API key is present in the configured environment variable.
    pub fn from_config(config: &RemediationConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let api_key = match config.api_key() {
            Some(key) => key,
            None => {
                warn!(
                    env = %config.api_key_env,
                    "remediation enabled but no API key set, skipping suggestions"
                );
                return None;
            }
        };
        let client = match reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "HTTP client construction failed, skipping suggestions");
                return None;
            }
        };
        Some(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            retry: RetryConfig::with_attempts(config.max_attempts),
        })
    }

    /// Fetch a suggestion for one issue group. Always returns text — a real
    /// suggestion or one of the fallback strings.
    pub async fn suggest(&self, rule_id: &str, examples: &[IssueExample], lang: &str) -> String {
        let content = build_prompt(rule_id, examples, lang);
        debug!(rule = rule_id, examples = examples.len(), "requesting remediation");

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": content },
            ],
        });

        let response = retry_with_backoff(&self.retry, || {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
        })
        .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(rule = rule_id, error = %e, "remediation endpoint unreachable");
                return FALLBACK_REQUEST_FAILED.to_string();
            }
        };

        if !response.status().is_success() {
            warn!(
                rule = rule_id,
                status = %response.status(),
                "remediation endpoint returned an error status"
            );
            return FALLBACK_REQUEST_FAILED.to_string();
        }

        match response.json::<Value>().await {
            Ok(payload) => extract_content(&payload).unwrap_or_else(|| {
                warn!(rule = rule_id, "remediation response carried no content");
                FALLBACK_NO_CONTENT.to_string()
            }),
            Err(e) => {
                warn!(rule = rule_id, error = %e, "remediation response was not valid JSON");
                FALLBACK_NO_CONTENT.to_string()
            }
        }
    }
}

/// Assemble the user prompt: framing sentence plus one block per example,
/// skipping an example whose failure summary matches the previous one.
pub fn build_prompt(rule_id: &str, examples: &[IssueExample], lang: &str) -> String {
    let mut content = format!(
        "The following are examples of {rule_id} issues detected in the webpage. For each \
         issue, I've provided the HTML snippet, failure summary, and a brief description. \
         Please analyze the specific code context and provide a targeted, actionable code \
         solution to address the accessibility concern according to WCAG standards. The \
         solution should be tailored to the given code snippet and provided in the {} \
         language. Ensure that your solution seamlessly integrates with the existing code \
         structure and directly addresses the identified problem while adhering to best \
         practices for web accessibility. Please return the code solution wrapped in code \
         blocks using the appropriate syntax for the HTML language.",
        capitalize(lang)
    );

    let mut last_summary: Option<&str> = None;
    for example in examples {
        if last_summary == Some(example.failure_summary.as_str()) {
            continue;
        }
        content.push_str(&format!(
            "\n\nHTML snippet:\n{}\n\nFailure Summary: {}\n\nDescription: {}\n\nSolution:",
            example.html, example.failure_summary, example.description
        ));
        last_summary = Some(&example.failure_summary);
    }
    content
}

fn extract_content(payload: &Value) -> Option<String> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(html: &str, summary: &str) -> IssueExample {
        IssueExample {
            html: html.to_string(),
            failure_summary: summary.to_string(),
            description: "desc".to_string(),
        }
    }

    #[test]
    fn prompt_names_issue_and_language() {
        let prompt = build_prompt("image-alt", &[example("<img>", "s")], "english");
        assert!(prompt.contains("examples of image-alt issues"));
        assert!(prompt.contains("in the English language"));
        assert!(prompt.ends_with("Solution:"));
    }

    #[test]
    fn prompt_skips_consecutive_duplicate_summaries() {
        let examples = vec![
            example("<img a>", "same"),
            example("<img b>", "same"),
            example("<img c>", "other"),
        ];
        let prompt = build_prompt("image-alt", &examples, "english");
        assert!(prompt.contains("<img a>"));
        assert!(!prompt.contains("<img b>"));
        assert!(prompt.contains("<img c>"));
    }

    #[test]
    fn content_extracted_from_chat_completion_shape() {
        let payload = serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": "use alt=\"...\"" } } ]
        });
        assert_eq!(extract_content(&payload).as_deref(), Some("use alt=\"...\""));
    }

    #[test]
    fn empty_choices_yield_no_content() {
        let payload = serde_json::json!({ "choices": [] });
        assert_eq!(extract_content(&payload), None);
    }

    #[test]
    fn advisor_disabled_without_key() {
        let config = RemediationConfig {
            api_key_env: "A11Y_LENS_TEST_KEY_THAT_IS_UNSET".to_string(),
            ..RemediationConfig::default()
        };
        assert!(RemediationAdvisor::from_config(&config).is_none());

        let disabled = RemediationConfig {
            enabled: false,
            ..RemediationConfig::default()
        };
        assert!(RemediationAdvisor::from_config(&disabled).is_none());
    }
}
