// SPDX-License-Identifier: MIT
//! Fatal error taxonomy for the audit pipeline.
//!
//! Only conditions that abort the run live here. Best-effort misses
//! (a stale selector, a failed remediation call) are handled at the call
//! site and never surface as an `AuditError`.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors that abort the audit.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The input URL has no parseable host component. Raised before any
    /// directory is created.
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The browser failed to load the target page (DNS, network, timeout).
    /// Propagated, never retried.
    #[error("navigation to `{url}` failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The browser process could not be started.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// DevTools transport or browser-session failure outside navigation.
    #[error("browser session error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// The rule-engine script could not be loaded or did not produce a
    /// result object.
    #[error("rule engine failure: {0}")]
    RuleEngine(String),

    /// The configured rule-engine script file is missing.
    #[error("rule engine script not found at {path}")]
    RuleEngineScriptMissing { path: PathBuf },

    /// A viewer build/start step exited non-zero. The report on disk is
    /// still valid when this is raised.
    #[error("viewer step `{step}` exited with {status}")]
    BuildTool { step: String, status: ExitStatus },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = AuditError> = std::result::Result<T, E>;
