// SPDX-License-Identifier: MIT
//! The audit pipeline: URL → report slot → rule-engine run → annotated
//! screenshot → grouped focused report.
//!
//! Strictly sequential. Failures before any write abort the run; once
//! groups start flushing, whatever reached disk stays there.

use tracing::{info, warn};

use crate::auditor::Auditor;
use crate::config::Config;
use crate::error::Result;
use crate::group::Grouper;
use crate::model::IssueGroup;
use crate::remedy::RemediationAdvisor;
use crate::site::SiteId;
use crate::store::ReportStore;
use crate::viewer::Viewer;

/// Run the full audit for one URL. Returns the site identifier so the
/// caller can point the viewer at it.
pub async fn run_audit(config: &Config, url: &str, lang: &str) -> Result<SiteId> {
    // Identity resolves before anything touches the filesystem.
    let site = SiteId::from_url(url)?;
    let store = ReportStore::new(&config.reports.root);

    if let Some(existing) = store.has_existing_report(&site) {
        info!(
            site = %site,
            existing = %existing.display(),
            "previous report found, a new version will be created"
        );
    }

    store.ensure_site_dir(&site)?;
    let version = store.next_version(&site)?;
    let slot = store.create_slot(&site, version)?;
    info!(site = %site, version, "audit started");

    let auditor = Auditor::launch(config.audit.clone()).await?;
    // Inner block so the browser is torn down on every exit path.
    let captured = async {
        let page = auditor.open(url).await?;
        let outcome = auditor.run_rules(&page).await?;
        let screenshot = auditor
            .capture_screenshot(&page, &slot.screenshot_path())
            .await?;
        slot.persist_raw(&outcome.raw)?;

        let mut grouper = Grouper::new();
        crate::annotate::annotate_violations(
            &page,
            &outcome.results,
            &screenshot,
            &slot.screenshot_path(),
            &mut grouper,
        )
        .await?;
        Ok::<_, crate::error::AuditError>((outcome, grouper))
    }
    .await;
    auditor.close().await;
    let (outcome, grouper) = captured?;

    let advisor = RemediationAdvisor::from_config(&config.remediation);
    if grouper.is_empty() {
        info!(site = %site, "no resolvable violations, focused report is empty");
    }

    let timestamp = outcome.results.timestamp.clone();
    let mut groups: Vec<IssueGroup> = Vec::new();
    let issues = grouper.into_issues();
    for issue in issues {
        let suggestion = match &advisor {
            Some(advisor) => advisor.suggest(&issue.rule_id, &issue.examples, lang).await,
            None => String::new(),
        };
        groups.push(issue.into_group(suggestion, timestamp.clone()));
        // Flush after every group so a crash mid-run keeps earlier groups.
        slot.persist_groups(&groups)?;
    }
    if groups.is_empty() {
        slot.persist_groups(&groups)?;
    }

    info!(site = %site, version, groups = groups.len(), "audit complete");
    Ok(site)
}

/// Launch the viewer for an already-audited (or even un-audited) site and
/// open a tab at its report page.
pub async fn serve(config: &Config, url: &str) -> Result<()> {
    let site = SiteId::from_url(url)?;
    let viewer = Viewer::new(config.viewer.clone());
    let mut process = viewer.start().await?;
    viewer.open_tab_later(&site);

    let status = process.wait().await?;
    if status.success() {
        info!(site = %site, "viewer exited");
    } else {
        warn!(site = %site, %status, "viewer exited with failure");
    }
    Ok(())
}
