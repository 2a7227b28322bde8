use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::Config;
use crate::models::{DownloadOutcome, DownloadTask, RunSummary};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("TimeoutError: {0}")]
    Timeout(String),
    #[error("ConnectError: {0}")]
    Connect(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("RequestError: {0}")]
    Request(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Network-level failures are worth another attempt; local filesystem
    /// failures are not.
    fn is_retryable(&self) -> bool {
        !matches!(self, DownloadError::Io(_))
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownloadError::Timeout(e.to_string())
        } else if e.is_connect() {
            DownloadError::Connect(e.to_string())
        } else {
            DownloadError::Request(e.to_string())
        }
    }
}

// ── Downloader ───────────────────────────────────────────────────────────────

pub struct Downloader {
    client: reqwest::Client,
    max_retries: u32,
    chunk_size: usize,
}

impl Downloader {
    pub fn new(config: &Config) -> Result<Self, DownloadError> {
        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.as_str());

        if config.insecure_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            chunk_size: config.chunk_size,
        })
    }

    /// Download every task in order. A failed task never stops the run.
    pub async fn download_all(&self, tasks: Vec<DownloadTask>) -> RunSummary {
        let total = tasks.len();
        let mut summary = RunSummary {
            matched: total,
            ..RunSummary::default()
        };
        for task in tasks {
            tracing::info!("downloading [{}/{}]: {}", task.index, total, task.absolute_url);
            let outcome = self.download(&task).await;
            summary.record(task, outcome);
        }
        summary
    }

    /// Fetch one task, retrying network failures up to `max_retries` times.
    pub async fn download(&self, task: &DownloadTask) -> DownloadOutcome {
        if tokio::fs::try_exists(&task.save_path).await.unwrap_or(false) {
            tracing::info!("file already exists: {}", task.save_path.display());
            return DownloadOutcome::Skipped;
        }

        for attempt in 1..=self.max_retries {
            match self.attempt(task).await {
                Ok(bytes) => {
                    tracing::info!(
                        "downloaded {} ({} bytes)",
                        task.save_path.display(),
                        bytes
                    );
                    return DownloadOutcome::Downloaded;
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!(
                        "cannot write {}: {}",
                        task.save_path.display(),
                        e
                    );
                    return DownloadOutcome::Failed;
                }
                Err(e) => {
                    tracing::warn!(
                        "download failed [attempt {}/{}]: {}: {}",
                        attempt,
                        self.max_retries,
                        task.absolute_url,
                        e
                    );
                }
            }
        }

        tracing::error!(
            "giving up on {} after {} attempts",
            task.absolute_url,
            self.max_retries
        );
        DownloadOutcome::Failed
    }

    /// One GET. The body lands in a `.part` sibling that is renamed onto the
    /// target only once fully written, and removed otherwise.
    async fn attempt(&self, task: &DownloadTask) -> Result<u64, DownloadError> {
        let response = self.client.get(&task.absolute_url).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status().as_u16()));
        }

        let part = part_path(&task.save_path);
        let result = match self.stream_to(response, &part).await {
            Ok(written) => tokio::fs::rename(&part, &task.save_path)
                .await
                .map(|_| written)
                .map_err(DownloadError::from),
            Err(e) => Err(e),
        };
        if result.is_err() {
            let _ = tokio::fs::remove_file(&part).await;
        }
        result
    }

    async fn stream_to(
        &self,
        mut response: reqwest::Response,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{http::StatusCode, routing::get, Router};

    const BODY: &[u8] = b"%PDF-1.4 fake body";

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// Route that answers 500 for the first `failures` requests, then the body.
    fn flaky_route(failures: usize, hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/file.pdf",
            get(move || {
                let hits = hits.clone();
                async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
                    } else {
                        (StatusCode::OK, BODY.to_vec())
                    }
                }
            }),
        )
    }

    fn downloader() -> Downloader {
        let config = Config {
            timeout: Duration::from_secs(5),
            insecure_tls: false,
            ..Config::default()
        };
        Downloader::new(&config).unwrap()
    }

    fn task(index: usize, url: String, dir: &Path) -> DownloadTask {
        DownloadTask {
            index,
            absolute_url: url,
            save_path: dir.join(format!("{:03}_test.pdf", index)),
        }
    }

    #[tokio::test]
    async fn successful_download_writes_body() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(flaky_route(0, hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let t = task(1, format!("http://{addr}/file.pdf"), dir.path());

        assert_eq!(downloader().download(&t).await, DownloadOutcome::Downloaded);
        assert_eq!(std::fs::read(&t.save_path).unwrap(), BODY);
        assert!(!part_path(&t.save_path).exists());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persistent_server_error_exhausts_retries() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(flaky_route(usize::MAX, hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let t = task(1, format!("http://{addr}/file.pdf"), dir.path());

        assert_eq!(downloader().download(&t).await, DownloadOutcome::Failed);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(!t.save_path.exists());
        assert!(!part_path(&t.save_path).exists());
    }

    #[tokio::test]
    async fn server_error_surfaces_as_status() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(flaky_route(usize::MAX, hits)).await;
        let dir = tempfile::tempdir().unwrap();
        let t = task(1, format!("http://{addr}/file.pdf"), dir.path());

        let err = downloader().attempt(&t).await.unwrap_err();
        assert!(matches!(err, DownloadError::Status(500)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(flaky_route(2, hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let t = task(1, format!("http://{addr}/file.pdf"), dir.path());

        assert_eq!(downloader().download(&t).await, DownloadOutcome::Downloaded);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(std::fs::read(&t.save_path).unwrap(), BODY);
    }

    #[tokio::test]
    async fn existing_file_is_skipped_without_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(flaky_route(0, hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let t = task(1, format!("http://{addr}/file.pdf"), dir.path());
        std::fs::write(&t.save_path, b"old").unwrap();

        assert_eq!(downloader().download(&t).await, DownloadOutcome::Skipped);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&t.save_path).unwrap(), b"old");
    }

    #[tokio::test]
    async fn filesystem_error_fails_task_without_retry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(flaky_route(0, hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");
        let t = task(1, format!("http://{addr}/file.pdf"), &missing);

        assert_eq!(downloader().download(&t).await, DownloadOutcome::Failed);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_url_fails_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let t = task(1, "not a url".to_string(), dir.path());
        assert_eq!(downloader().download(&t).await, DownloadOutcome::Failed);
        assert!(!t.save_path.exists());
    }

    #[tokio::test]
    async fn failed_task_does_not_stop_the_run() {
        let bad_hits = Arc::new(AtomicUsize::new(0));
        let bad = serve(flaky_route(usize::MAX, bad_hits)).await;
        let good_hits = Arc::new(AtomicUsize::new(0));
        let good = serve(flaky_route(0, good_hits)).await;
        let dir = tempfile::tempdir().unwrap();

        let existing = task(3, format!("http://{good}/file.pdf"), dir.path());
        std::fs::write(&existing.save_path, b"old").unwrap();
        let tasks = vec![
            task(1, format!("http://{bad}/file.pdf"), dir.path()),
            task(2, format!("http://{good}/file.pdf"), dir.path()),
            existing,
        ];

        let summary = downloader().download_all(tasks).await;
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.tasks[0].outcome, DownloadOutcome::Failed);
        assert_eq!(summary.tasks[1].outcome, DownloadOutcome::Downloaded);
    }
}
