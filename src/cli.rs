//! CLI argument parsing via `clap`.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "a11y-lens",
    version,
    about = "Audit one web page for accessibility issues and view the annotated report",
    after_help = "Examples:\n  \
        a11y-lens --url https://example.com\n  \
        a11y-lens --url https://example.com --lang german\n  \
        a11y-lens --url https://example.com --serve"
)]
pub struct Args {
    /// The URL of the webpage to check
    #[arg(long)]
    pub url: String,

    /// Human language for remediation suggestions
    #[arg(long, default_value = "english")]
    pub lang: String,

    /// Skip auditing; start the viewer for the site derived from --url
    #[arg(long)]
    pub serve: bool,

    /// Disable remediation suggestions for this run
    #[arg(long)]
    pub no_llm: bool,

    /// Path to the TOML config file
    #[arg(long, default_value = "a11y-lens.toml")]
    pub config: PathBuf,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, env = "A11Y_LENS_LOG", default_value = "info")]
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_required() {
        assert!(Args::try_parse_from(["a11y-lens"]).is_err());
        let args = Args::try_parse_from(["a11y-lens", "--url", "https://example.com"]).unwrap();
        assert_eq!(args.lang, "english");
        assert!(!args.serve);
    }

    #[test]
    fn serve_and_lang_flags_parse() {
        let args = Args::try_parse_from([
            "a11y-lens",
            "--url",
            "https://example.com",
            "--lang",
            "german",
            "--serve",
            "--no-llm",
        ])
        .unwrap();
        assert!(args.serve);
        assert!(args.no_llm);
        assert_eq!(args.lang, "german");
    }
}
