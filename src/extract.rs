use crate::config::{Config, Margins};
use crate::models::{CandidateLink, LinkAnnotation, PageContent, WordSpan};
use crate::source::{LinkSource, SourceError};

// ── Public API ───────────────────────────────────────────────────────────────

/// Walk every page of `source` in order and return the links that survive the
/// keyword filter, in page order and, within a page, in annotation order.
pub fn extract_links<S: LinkSource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<Vec<CandidateLink>, SourceError> {
    let mut retained = Vec::new();
    for index in 0..source.page_count() {
        let page = source.load_page(index)?;
        retained.extend(extract_from_page(&page, config));
    }
    Ok(retained)
}

pub fn extract_from_page(page: &PageContent, config: &Config) -> Vec<CandidateLink> {
    let mut retained = Vec::new();
    for link in &page.links {
        let Some(candidate) = match_link(link, &page.words, &config.margins, page.number) else {
            continue;
        };

        tracing::info!(
            "page {}: nearby text -> '{}' | url -> {}",
            page.number,
            candidate.label,
            candidate.url
        );

        if let Some(kept) = apply_keyword_filter(candidate, &config.keywords, config.keep_hidden_links)
        {
            retained.push(kept);
        }
    }
    retained
}

// ── Proximity matching ───────────────────────────────────────────────────────

/// Pair a link annotation with the words inside its expanded rectangle.
/// Returns `None` when the annotation carries no URI.
pub fn match_link(
    link: &LinkAnnotation,
    words: &[WordSpan],
    margins: &Margins,
    page: usize,
) -> Option<CandidateLink> {
    let url = link.uri.as_ref()?;
    Some(CandidateLink {
        url: url.clone(),
        label: nearby_label(link, words, margins),
        page,
    })
}

fn nearby_label(link: &LinkAnnotation, words: &[WordSpan], margins: &Margins) -> String {
    let area = margins.expand(&link.rect);
    words
        .iter()
        .filter(|w| area.contains(&w.bbox))
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

// ── Keyword filter ───────────────────────────────────────────────────────────

/// Label used for a retained link that has no nearby text.
pub fn hidden_link_label(page: usize) -> String {
    format!("隐藏链接(P{})", page)
}

/// Case-sensitive substring test against every keyword.
pub fn contains_keyword(label: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| label.contains(k.as_str()))
}

/// Keep the candidate if its label contains a keyword. An empty label never
/// contains one, so unlabeled links are dropped unless `keep_hidden` is set,
/// in which case they are kept under the page fallback label.
pub fn apply_keyword_filter(
    mut candidate: CandidateLink,
    keywords: &[String],
    keep_hidden: bool,
) -> Option<CandidateLink> {
    if candidate.label.is_empty() {
        if keep_hidden {
            candidate.label = hidden_link_label(candidate.page);
            return Some(candidate);
        }
        return None;
    }
    contains_keyword(&candidate.label, keywords).then_some(candidate)
}
