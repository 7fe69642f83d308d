// SPDX-License-Identifier: MIT
//! Headless-browser session: navigate, settle, inject the rule engine,
//! run it, capture the full-page screenshot.
//!
//! One session, one page, strictly sequential script execution. The caller
//! must `close()` the session on every exit path; `Drop` aborts the CDP
//! event task as a backstop but cannot wait for the browser process.

use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::model::AxeResults;

/// Everything captured from one rule-engine run.
#[derive(Debug)]
pub struct AuditOutcome {
    /// Engine output, verbatim. Persisted as-is.
    pub raw: Value,
    /// Typed view of `raw` used by annotation and grouping.
    pub results: AxeResults,
}

/// Owns the browser process and its CDP event loop.
pub struct Auditor {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    config: AuditConfig,
}

impl Auditor {
    /// Launch headless Chrome with the configured viewport.
    pub async fn launch(config: AuditConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .no_sandbox()
            .build()
            .map_err(AuditError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        // The handler stream must be pumped for the session to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        debug!("headless browser launched");

        Ok(Self {
            browser,
            handler_task,
            config,
        })
    }

    /// Navigate to `url` and wait for it to settle.
    ///
    /// # Errors
    ///
    /// [`AuditError::Navigation`] when the page cannot be loaded within the
    /// configured timeout. Never retried.
    pub async fn open(&self, url: &str) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;
        let nav_timeout = Duration::from_secs(self.config.navigation_timeout_secs);

        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(nav_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(AuditError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(AuditError::Navigation {
                    url: url.to_string(),
                    reason: format!("timed out after {}s", self.config.navigation_timeout_secs),
                })
            }
        }
        info!(url, "page loaded");

        self.settle(&page).await;
        Ok(page)
    }

    /// Readiness heuristic replacing a flat post-load sleep: the page counts
    /// as settled when `document.readyState` is `complete` and the resource
    /// entry count has stopped growing between two polls. Proceeds anyway at
    /// `settle_timeout_ms`.
    async fn settle(&self, page: &Page) {
        #[derive(Deserialize)]
        struct Snapshot {
            ready: String,
            resources: u64,
        }

        const SNAPSHOT_JS: &str = "({ ready: document.readyState, \
             resources: performance.getEntriesByType('resource').length })";

        let deadline = Instant::now() + Duration::from_millis(self.config.settle_timeout_ms);
        let poll = Duration::from_millis(self.config.settle_poll_ms.max(1));
        let mut previous: Option<u64> = None;

        while Instant::now() < deadline {
            let snapshot = match self.evaluate_value(page, SNAPSHOT_JS).await {
                Ok(value) => serde_json::from_value::<Snapshot>(value).ok(),
                Err(e) => {
                    warn!(error = %e, "settle poll failed, proceeding");
                    return;
                }
            };
            if let Some(s) = snapshot {
                if s.ready == "complete" && previous == Some(s.resources) {
                    debug!(resources = s.resources, "page settled");
                    return;
                }
                previous = Some(s.resources);
            }
            tokio::time::sleep(poll).await;
        }
        warn!(
            timeout_ms = self.config.settle_timeout_ms,
            "settle deadline reached, auditing anyway"
        );
    }

    /// Inject the rule-engine script and execute it restricted to the
    /// configured tag sets.
    pub async fn run_rules(&self, page: &Page) -> Result<AuditOutcome> {
        let script_path = &self.config.axe_script;
        let script = std::fs::read_to_string(script_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuditError::RuleEngineScriptMissing {
                    path: script_path.clone(),
                }
            } else {
                AuditError::Io(e)
            }
        })?;

        page.evaluate(expression(script)?).await?;
        debug!(path = %script_path.display(), "rule engine injected");

        let tags = serde_json::to_string(&self.config.ruleset_tags)?;
        let run = format!(
            "axe.run(document, {{ runOnly: {{ type: 'tag', values: {tags} }} }})"
        );
        let raw = self.evaluate_value(page, &run).await?;

        let results: AxeResults = serde_json::from_value(raw.clone())?;
        info!(
            violations = results.violations.len(),
            "rule engine run complete"
        );
        Ok(AuditOutcome { raw, results })
    }

    /// Capture the full-height page as PNG and write it to `path`.
    ///
    /// Runs before any overlay drawing; the annotator later overwrites the
    /// same file with rectangles added.
    pub async fn capture_screenshot(&self, page: &Page, path: &Path) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = page.screenshot(params).await?;
        tokio::fs::write(path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "screenshot captured");
        Ok(bytes)
    }

    async fn evaluate_value(&self, page: &Page, js: &str) -> Result<Value> {
        let result = page.evaluate(expression(js.to_string())?).await?;
        result
            .value()
            .cloned()
            .ok_or_else(|| AuditError::RuleEngine("evaluation returned no value".to_string()))
    }

    /// Tear the session down. Must run on every exit path so no browser
    /// process is orphaned.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close request failed");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "browser did not exit cleanly");
        }
        self.handler_task.abort();
        debug!("browser session closed");
    }
}

impl Drop for Auditor {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

fn expression(js: String) -> Result<EvaluateParams> {
    EvaluateParams::builder()
        .expression(js)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(AuditError::RuleEngine)
}
