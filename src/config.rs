use std::path::PathBuf;
use std::time::Duration;

use crate::models::Rect;

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_SOURCE_PDF: &str = "W020210624327149500026.pdf";
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_pdfs";
pub const DEFAULT_BASE_URL: &str = "https://www.mee.gov.cn/";
pub const DEFAULT_KEYWORDS: &[&str] = &["手册", "指南", "规范", "标准", "技术"];
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

pub const INSECURE_SSL_ENV: &str = "PDF_LINK_HARVESTER_INSECURE_SSL";

// ── Search margins ───────────────────────────────────────────────────────────

/// How far the search area around a link reaches on each side. Biased toward
/// text to the right of and below the link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 20.0,
            top: 10.0,
            right: 50.0,
            bottom: 20.0,
        }
    }
}

impl Margins {
    pub fn expand(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x0 - self.left,
            rect.y0 - self.top,
            rect.x1 + self.right,
            rect.y1 + self.bottom,
        )
    }
}

// ── Run configuration ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub source_pdf: PathBuf,
    pub output_dir: PathBuf,
    pub base_url: String,
    pub keywords: Vec<String>,
    pub margins: Margins,
    pub max_retries: u32,
    pub timeout: Duration,
    pub user_agent: String,
    pub chunk_size: usize,
    /// Retain links with no nearby text under a page-based fallback label
    /// instead of dropping them at the keyword test.
    pub keep_hidden_links: bool,
    pub insecure_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_pdf: PathBuf::from(DEFAULT_SOURCE_PDF),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            base_url: DEFAULT_BASE_URL.to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            margins: Margins::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            keep_hidden_links: false,
            insecure_tls: false,
        }
    }
}
