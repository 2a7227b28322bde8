use std::path::Path;

use mupdf::{Document, Quad, TextPageFlags};

use crate::models::{LinkAnnotation, PageContent, Rect, WordSpan};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot open {path}: {message}")]
    Open { path: String, message: String },
    #[error("page {page}: {message}")]
    Page { page: usize, message: String },
}

// ── Source abstraction ───────────────────────────────────────────────────────

/// Per-page words and link annotations, in the order the document library
/// reports them.
pub trait LinkSource {
    fn page_count(&self) -> usize;

    /// Load the page at `index` (0-based).
    fn load_page(&self, index: usize) -> Result<PageContent, SourceError>;
}

/// In-memory pages, used where no real document is involved.
impl LinkSource for Vec<PageContent> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn load_page(&self, index: usize) -> Result<PageContent, SourceError> {
        self.get(index).cloned().ok_or_else(|| SourceError::Page {
            page: index + 1,
            message: "page index out of range".to_string(),
        })
    }
}

// ── MuPDF-backed source ──────────────────────────────────────────────────────

pub struct MupdfSource {
    document: Document,
    page_count: usize,
}

impl MupdfSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let open_err = |message: String| SourceError::Open {
            path: path.display().to_string(),
            message,
        };
        let path_str = path
            .to_str()
            .ok_or_else(|| open_err("path is not valid UTF-8".to_string()))?;
        let document = Document::open(path_str).map_err(|e| open_err(e.to_string()))?;
        let page_count = document.page_count().map_err(|e| open_err(e.to_string()))?;
        Ok(Self {
            document,
            page_count: page_count.max(0) as usize,
        })
    }
}

impl LinkSource for MupdfSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn load_page(&self, index: usize) -> Result<PageContent, SourceError> {
        let number = index + 1;
        let page_err = |e: mupdf::Error| SourceError::Page {
            page: number,
            message: e.to_string(),
        };

        let page = self.document.load_page(index as i32).map_err(page_err)?;

        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(page_err)?;
        let mut words = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let mut builder = WordBuilder::default();
                for ch in line.chars() {
                    match ch.char() {
                        Some(c) if !c.is_whitespace() => builder.push(c, quad_bounds(&ch.quad())),
                        _ => builder.finish_into(&mut words),
                    }
                }
                builder.finish_into(&mut words);
            }
        }

        let links = page
            .links()
            .map_err(page_err)?
            .map(|link| LinkAnnotation {
                rect: Rect::new(
                    link.bounds.x0 as f64,
                    link.bounds.y0 as f64,
                    link.bounds.x1 as f64,
                    link.bounds.y1 as f64,
                ),
                uri: external_uri(&link.uri),
            })
            .collect();

        Ok(PageContent {
            number,
            words,
            links,
        })
    }
}

/// Internal jumps come back from MuPDF as `#...` fragments and Launch/GoToR
/// actions as `file:` URIs; only URI actions count as a URI.
fn external_uri(uri: &str) -> Option<String> {
    let uri = uri.trim();
    let is_file = uri
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:"));
    if uri.is_empty() || uri.starts_with('#') || is_file {
        None
    } else {
        Some(uri.to_string())
    }
}

fn quad_bounds(quad: &Quad) -> Rect {
    let xs = [quad.ul.x, quad.ur.x, quad.ll.x, quad.lr.x];
    let ys = [quad.ul.y, quad.ur.y, quad.ll.y, quad.lr.y];
    Rect::new(
        xs.iter().copied().fold(f32::INFINITY, f32::min) as f64,
        ys.iter().copied().fold(f32::INFINITY, f32::min) as f64,
        xs.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64,
        ys.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64,
    )
}

// ── Word assembly ────────────────────────────────────────────────────────────

/// Groups consecutive non-whitespace characters of one text line into a word,
/// the same split MuPDF applies for its own word listing.
#[derive(Default)]
struct WordBuilder {
    text: String,
    bbox: Option<Rect>,
}

impl WordBuilder {
    fn push(&mut self, c: char, bounds: Rect) {
        self.text.push(c);
        self.bbox = Some(match self.bbox {
            Some(b) => Rect::new(
                b.x0.min(bounds.x0),
                b.y0.min(bounds.y0),
                b.x1.max(bounds.x1),
                b.y1.max(bounds.y1),
            ),
            None => bounds,
        });
    }

    fn finish_into(&mut self, words: &mut Vec<WordSpan>) {
        if let Some(bbox) = self.bbox.take() {
            words.push(WordSpan {
                bbox,
                text: std::mem::take(&mut self.text),
            });
        }
    }
}
