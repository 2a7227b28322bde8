use std::path::PathBuf;

use serde::Serialize;

/// Axis-aligned rectangle in page space, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// True when `other` lies fully inside `self`. Touching edges count as inside.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordSpan {
    pub bbox: Rect,
    pub text: String,
}

#[cfg(test)]
impl WordSpan {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64, text: &str) -> Self {
        Self {
            bbox: Rect::new(x0, y0, x1, y1),
            text: text.to_string(),
        }
    }
}

/// An embedded link region. `uri` is `None` for internal jumps and other
/// non-URI actions.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    pub rect: Rect,
    pub uri: Option<String>,
}

/// Everything the extraction pass needs from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// 1-based page number.
    pub number: usize,
    pub words: Vec<WordSpan>,
    pub links: Vec<LinkAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLink {
    pub url: String,
    pub label: String,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadTask {
    pub index: usize,
    pub absolute_url: String,
    pub save_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOutcome {
    Downloaded,
    Skipped,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct TaskReport {
    #[serde(flatten)]
    pub task: DownloadTask,
    pub outcome: DownloadOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub matched: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub tasks: Vec<TaskReport>,
}

impl RunSummary {
    pub fn record(&mut self, task: DownloadTask, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded => self.downloaded += 1,
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Failed => self.failed += 1,
        }
        self.tasks.push(TaskReport { task, outcome });
    }
}
