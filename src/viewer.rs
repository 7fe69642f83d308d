// SPDX-License-Identifier: MIT
//! Presentation launcher: builds and starts the external viewer app as an
//! owned subprocess, and opens a browser tab at the report URL.
//!
//! No working-directory changes; every command runs with an explicit
//! `current_dir` from config, and the started server is handed back as a
//! [`ViewerProcess`] with explicit stop/wait.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{AuditError, Result};
use crate::site::SiteId;

pub struct Viewer {
    config: ViewerConfig,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    /// Install dependencies and build the viewer bundle.
    ///
    /// # Errors
    ///
    /// [`AuditError::BuildTool`] when either step exits non-zero. The audit
    /// report already on disk stays valid.
    pub async fn build(&self) -> Result<()> {
        let pm = self.config.package_manager.as_str();
        self.run_step("install", &[pm]).await?;
        self.run_step("build", &[pm, "run", "build"]).await?;
        Ok(())
    }

    /// Start the viewer server and hand ownership of the child process back.
    pub async fn start(&self) -> Result<ViewerProcess> {
        let child = Command::new(&self.config.package_manager)
            .args(["run", "start"])
            .current_dir(&self.config.dir)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;
        info!(dir = %self.config.dir.display(), "viewer server started");
        Ok(ViewerProcess { child })
    }

    /// URL the viewer renders this site's reports at.
    pub fn report_url(&self, site: &SiteId) -> String {
        format!("{}/?website_id={}", self.config.url.trim_end_matches('/'), site)
    }

    /// Open a browser tab at the report URL from a background task, after a
    /// short delay so the server can bind its port first. Failures are
    /// logged, never fatal.
    pub fn open_tab_later(&self, site: &SiteId) {
        if !self.config.open_tab {
            return;
        }
        let url = self.report_url(site);
        let delay = std::time::Duration::from_millis(self.config.open_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let (program, args) = opener_command(&url);
            match Command::new(program).args(args).spawn() {
                Ok(_) => debug!(%url, "browser tab opened"),
                Err(e) => warn!(%url, error = %e, "could not open browser tab"),
            }
        });
    }

    async fn run_step(&self, step: &str, command: &[&str]) -> Result<()> {
        info!(step, dir = %self.config.dir.display(), "running viewer step");
        let status = Command::new(command[0])
            .args(&command[1..])
            .current_dir(&self.config.dir)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        if !status.success() {
            return Err(AuditError::BuildTool {
                step: step.to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// A running viewer server. Killed when dropped; prefer [`stop`](Self::stop)
/// or [`wait`](Self::wait) for an explicit end.
pub struct ViewerProcess {
    child: Child,
}

impl ViewerProcess {
    /// Block until the server exits on its own (serve mode).
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// Terminate the server.
    pub async fn stop(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "viewer process did not stop cleanly");
        }
    }
}

/// Platform command that opens `url` in the default browser.
fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C".into(), "start".into(), String::new(), url.to_string()])
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}
