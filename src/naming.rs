use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::{CandidateLink, DownloadTask};

const MAX_LABEL_CHARS: usize = 100;

static UNSAFE_FILENAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

// ── URL resolution ───────────────────────────────────────────────────────────

/// Absolute http(s) URLs pass through untouched; anything else is joined onto
/// `base_url`. When joining is impossible the input is returned as-is and the
/// download will fail on it later.
pub fn resolve_url(url: &str, base_url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(url))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

// ── File naming ──────────────────────────────────────────────────────────────

/// Replace characters that are illegal in file names and cap the result at
/// 100 characters.
pub fn sanitize_label(label: &str) -> String {
    UNSAFE_FILENAME_RE
        .replace_all(label, "_")
        .chars()
        .take(MAX_LABEL_CHARS)
        .collect()
}

pub fn file_name(index: usize, label: &str) -> String {
    let safe = sanitize_label(label);
    if safe.is_empty() {
        format!("file_{:03}.pdf", index)
    } else {
        format!("{:03}_{}.pdf", index, safe)
    }
}

/// Number the retained links from 1 and turn each into a download task.
pub fn build_tasks(links: &[CandidateLink], base_url: &str, output_dir: &Path) -> Vec<DownloadTask> {
    links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let index = i + 1;
            DownloadTask {
                index,
                absolute_url: resolve_url(&link.url, base_url),
                save_path: output_dir.join(file_name(index, &link.label)),
            }
        })
        .collect()
}
