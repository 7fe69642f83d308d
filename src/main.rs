use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use a11y_lens::cli::Args;
use a11y_lens::config::Config;
use a11y_lens::pipeline;
use a11y_lens::viewer::Viewer;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .compact()
        .init();

    let mut config = Config::load(&args.config);
    if args.no_llm {
        config.remediation.enabled = false;
    }

    if args.serve {
        // Serve mode blocks until the viewer process exits.
        pipeline::serve(&config, &args.url)
            .await
            .context("viewer serve failed")?;
        return Ok(());
    }

    let site = pipeline::run_audit(&config, &args.url, &args.lang)
        .await
        .context("audit failed")?;

    // The report is fully persisted; viewer failure past this point still
    // leaves it on disk.
    let viewer = Viewer::new(config.viewer.clone());
    if config.viewer.build {
        viewer.build().await.context("viewer build failed")?;
    }
    let mut server = viewer.start().await.context("viewer start failed")?;
    viewer.open_tab_later(&site);

    info!(site = %site, "report ready; press Ctrl-C to exit");
    tokio::signal::ctrl_c().await?;
    server.stop().await;
    Ok(())
}
