// SPDX-License-Identifier: MIT
//! Serve mode against a stand-in viewer command: no audit data is needed
//! for the viewer to be pointed at a site.

use a11y_lens::config::{Config, ReportsConfig, ViewerConfig};
use a11y_lens::pipeline;
use tempfile::TempDir;

/// A host that was never audited still resolves to a site identifier and
/// the viewer launches and exits cleanly, with an empty reports root.
#[cfg(unix)]
#[tokio::test]
async fn serve_succeeds_without_any_existing_report() {
    let viewer_dir = TempDir::new().unwrap();
    let reports_root = TempDir::new().unwrap();

    let config = Config {
        reports: ReportsConfig {
            root: reports_root.path().to_path_buf(),
        },
        viewer: ViewerConfig {
            dir: viewer_dir.path().to_path_buf(),
            // `true` ignores its arguments and exits 0, standing in for the
            // real `<pm> run start` server process.
            package_manager: "true".to_string(),
            open_tab: false,
            ..ViewerConfig::default()
        },
        ..Config::default()
    };

    let result = pipeline::serve(&config, "https://never-audited.example").await;
    assert!(result.is_ok(), "serve failed: {:?}", result.err());

    // Serve mode writes nothing under the reports root.
    assert_eq!(std::fs::read_dir(reports_root.path()).unwrap().count(), 0);
}

/// An unparseable URL still fails fast in serve mode, before any process
/// is spawned.
#[cfg(unix)]
#[tokio::test]
async fn serve_rejects_hostless_url() {
    let viewer_dir = TempDir::new().unwrap();
    let config = Config {
        viewer: ViewerConfig {
            dir: viewer_dir.path().to_path_buf(),
            package_manager: "true".to_string(),
            open_tab: false,
            ..ViewerConfig::default()
        },
        ..Config::default()
    };

    let result = pipeline::serve(&config, "not a url").await;
    assert!(matches!(
        result,
        Err(a11y_lens::AuditError::InvalidUrl { .. })
    ));
}
