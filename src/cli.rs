use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    Config, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_PDF,
    DEFAULT_TIMEOUT_SECS, INSECURE_SSL_ENV,
};

/// Download the files linked from a PDF whose link text mentions a keyword.
#[derive(Debug, Parser)]
#[command(name = "pdf-link-harvester", about, version)]
pub struct Cli {
    /// Path to the source PDF
    #[arg(value_name = "PDF", default_value = DEFAULT_SOURCE_PDF)]
    pub pdf: PathBuf,

    /// Directory that receives the downloaded files
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Base URL for resolving relative links
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Keyword to look for near each link (repeatable; replaces the default set)
    #[arg(long = "keyword", value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Attempts per download before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Keep links that have no nearby text, named after their page
    #[arg(long)]
    pub keep_hidden: bool,

    /// List what would be downloaded without touching the network
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Exit with status 2 when any download failed
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    pub fn to_config(&self) -> Config {
        let mut config = Config {
            source_pdf: self.pdf.clone(),
            output_dir: self.output_dir.clone(),
            base_url: self.base_url.clone(),
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.timeout_secs),
            keep_hidden_links: self.keep_hidden,
            insecure_tls: env_flag_enabled(std::env::var(INSECURE_SSL_ENV).ok().as_deref()),
            ..Config::default()
        };
        if !self.keywords.is_empty() {
            config.keywords = self.keywords.clone();
        }
        config
    }
}

fn env_flag_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}
