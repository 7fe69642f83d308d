//! Layered configuration: `a11y-lens.toml` over built-in defaults, with the
//! CLI overriding both.
//!
//! Every component takes its section as an explicit value — nothing reads
//! the working directory or environment behind the caller's back (the one
//! exception, the remediation API key, is named by `api_key_env` so the
//! lookup itself is configured).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DEFAULT_REPORTS_ROOT: &str = "../ui/public/reports";
const DEFAULT_AXE_SCRIPT: &str = "axe.min.js";
const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
const DEFAULT_MODEL: &str = "llama-3-8b-instruct";
const DEFAULT_API_KEY_ENV: &str = "A11Y_LENS_API_KEY";
const DEFAULT_VIEWER_DIR: &str = "../ui";
const DEFAULT_VIEWER_URL: &str = "http://localhost:3000";

/// Rule-set tags passed to the engine: WCAG 2.0/2.1, levels A and AA.
pub const DEFAULT_RULESET_TAGS: &[&str] = &["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"];

// ─── AuditConfig ─────────────────────────────────────────────────────────────

/// Browser and rule-engine settings (`[audit]`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
    /// Path to the rule-engine script (axe-core bundle) injected into the page.
    pub axe_script: PathBuf,
    /// Rule-set tags the engine is restricted to.
    pub ruleset_tags: Vec<String>,
    /// Upper bound on post-load settling, in milliseconds. The auditor
    /// proceeds as soon as the page looks network-idle, or at this deadline,
    /// whichever comes first.
    pub settle_timeout_ms: u64,
    /// Interval between settle polls, in milliseconds.
    pub settle_poll_ms: u64,
    /// Hard timeout for page navigation, in seconds.
    pub navigation_timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            axe_script: PathBuf::from(DEFAULT_AXE_SCRIPT),
            ruleset_tags: DEFAULT_RULESET_TAGS.iter().map(|s| s.to_string()).collect(),
            settle_timeout_ms: 5_000,
            settle_poll_ms: 250,
            navigation_timeout_secs: 30,
        }
    }
}

// ─── ReportsConfig ───────────────────────────────────────────────────────────

/// Report store location (`[reports]`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Root directory holding one subdirectory per site identifier.
    pub root: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_REPORTS_ROOT),
        }
    }
}

// ─── RemediationConfig ───────────────────────────────────────────────────────

/// Remediation advisor settings (`[remediation]`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Master switch. `--no-llm` forces this off for one run.
    pub enabled: bool,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model name sent in the request body.
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts for transport failures (connect/timeout). An HTTP error
    /// status is never retried.
    pub max_attempts: u32,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 60,
            max_attempts: 3,
        }
    }
}

impl RemediationConfig {
    /// Resolve the bearer token from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

// ─── ViewerConfig ────────────────────────────────────────────────────────────

/// Presentation launcher settings (`[viewer]`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory containing the viewer application (its package.json).
    pub dir: PathBuf,
    /// Package manager used for install/build/start steps.
    pub package_manager: String,
    /// Base URL the viewer serves at once started.
    pub url: String,
    /// Run the install + build steps before starting (audit mode only).
    pub build: bool,
    /// Open a browser tab at the report URL after launch.
    pub open_tab: bool,
    /// Delay before opening the tab, in milliseconds, giving the viewer
    /// server time to bind its port.
    pub open_delay_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_VIEWER_DIR),
            package_manager: "yarn".to_string(),
            url: DEFAULT_VIEWER_URL.to_string(),
            build: true,
            open_tab: true,
            open_delay_ms: 1_000,
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub audit: AuditConfig,
    pub reports: ReportsConfig,
    pub remediation: RemediationConfig,
    pub viewer: ViewerConfig,
}

impl Config {
    /// Load from a TOML file if it exists, falling back to defaults.
    ///
    /// A missing file is normal (defaults apply); a file that exists but
    /// fails to parse is a warning, not an error, so a typo cannot brick
    /// the tool.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config file invalid, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
