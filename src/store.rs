// SPDX-License-Identifier: MIT
//! On-disk report store: per-site, versioned report directories.
//!
//! Layout, relative to the configured root:
//!
//! ```text
//! <root>/<SiteId>/report-<N>/
//!     full_page_screenshot.png
//!     total_accessibility_issues.json      # engine output, verbatim
//!     focused_accessibility_issues.json    # ordered array of IssueGroup
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::model::IssueGroup;
use crate::site::SiteId;

pub const SCREENSHOT_FILE: &str = "full_page_screenshot.png";
pub const RAW_REPORT_FILE: &str = "total_accessibility_issues.json";
pub const FOCUSED_REPORT_FILE: &str = "focused_accessibility_issues.json";

const VERSION_PREFIX: &str = "report-";

/// Owns directory lifecycle and naming under a fixed reports root.
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn site_dir(&self, site: &SiteId) -> PathBuf {
        self.root.join(site.as_str())
    }

    /// Create the per-site directory tree if absent. Idempotent.
    pub fn ensure_site_dir(&self, site: &SiteId) -> std::io::Result<PathBuf> {
        let dir = self.site_dir(site);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Next report version for `site`: count of existing `report-*`
    /// directories plus one.
    ///
    /// Not safe under concurrent invocation for the same site — the tool
    /// runs one audit at a time, so versions are allocated without locking.
    pub fn next_version(&self, site: &SiteId) -> std::io::Result<u32> {
        Ok(self.list_versions(site)?.len() as u32 + 1)
    }

    /// Existing version numbers for `site`, ascending. Missing site
    /// directory reads as empty.
    fn list_versions(&self, site: &SiteId) -> std::io::Result<Vec<u32>> {
        let dir = self.site_dir(site);
        let mut versions = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
            Err(e) => return Err(e),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if let Some(n) = name
                .to_str()
                .and_then(|s| s.strip_prefix(VERSION_PREFIX))
                .and_then(|s| s.parse::<u32>().ok())
            {
                versions.push(n);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Allocate the directory for `(site, version)` and hand back a slot
    /// bound to it. A failed run that reached this point still consumes
    /// the version number.
    pub fn create_slot(&self, site: &SiteId, version: u32) -> std::io::Result<ReportSlot> {
        let dir = self
            .site_dir(site)
            .join(format!("{VERSION_PREFIX}{version}"));
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "report slot allocated");
        Ok(ReportSlot { dir })
    }

    /// Path of the newest focused-issues artifact for `site`, if any
    /// version directory holds one. Scans all versions, newest first.
    pub fn has_existing_report(&self, site: &SiteId) -> Option<PathBuf> {
        let versions = self.list_versions(site).ok()?;
        versions.into_iter().rev().find_map(|n| {
            let path = self
                .site_dir(site)
                .join(format!("{VERSION_PREFIX}{n}"))
                .join(FOCUSED_REPORT_FILE);
            path.exists().then_some(path)
        })
    }
}

/// Handle to one allocated `report-<N>` directory.
#[derive(Debug, Clone)]
pub struct ReportSlot {
    dir: PathBuf,
}

impl ReportSlot {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn screenshot_path(&self) -> PathBuf {
        self.dir.join(SCREENSHOT_FILE)
    }

    /// Write the engine output verbatim, fully replacing any partial write.
    pub fn persist_raw(&self, results: &Value) -> Result<(), crate::error::AuditError> {
        let text = serde_json::to_string_pretty(results)?;
        write_replacing(&self.dir.join(RAW_REPORT_FILE), &text)?;
        Ok(())
    }

    /// Rewrite the focused-issues document with every group seen so far.
    ///
    /// Called once per completed group, so a crash mid-run loses only the
    /// in-flight group, never the earlier ones.
    pub fn persist_groups(&self, groups: &[IssueGroup]) -> Result<(), crate::error::AuditError> {
        let text = serde_json::to_string_pretty(groups)?;
        write_replacing(&self.dir.join(FOCUSED_REPORT_FILE), &text)?;
        Ok(())
    }
}

/// Write via a sibling temp file plus rename, so a crash mid-write leaves
/// the previous document intact instead of a truncated one.
fn write_replacing(path: &Path, text: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)
}
