use clap::Parser;

mod cli;
mod config;
mod download;
mod extract;
mod models;
mod naming;
mod source;

use cli::Cli;
use config::Config;
use download::{DownloadError, Downloader};
use models::RunSummary;
use source::{MupdfSource, SourceError};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("cannot build HTTP client: {0}")]
    Client(#[from] DownloadError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot serialize summary: {0}")]
    Summary(#[from] serde_json::Error),
    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config();

    let code = match run(&cli, &config).await {
        Ok(summary) if cli.strict && summary.failed > 0 => 2,
        Ok(_) => 0,
        Err(e) => {
            tracing::error!("{}", e);
            1
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<RunSummary, RunError> {
    tracing::info!("parsing {}", config.source_pdf.display());

    let extract_config = config.clone();
    let links = tokio::task::spawn_blocking(move || {
        let source = MupdfSource::open(&extract_config.source_pdf)?;
        extract::extract_links(&source, &extract_config)
    })
    .await??;

    tracing::info!("found {} matching links", links.len());

    let tasks = naming::build_tasks(&links, &config.base_url, &config.output_dir);

    let summary = if cli.dry_run {
        for task in &tasks {
            tracing::info!(
                "[{}/{}] {} -> {}",
                task.index,
                tasks.len(),
                task.absolute_url,
                task.save_path.display()
            );
        }
        RunSummary {
            matched: tasks.len(),
            ..RunSummary::default()
        }
    } else {
        tokio::fs::create_dir_all(&config.output_dir).await?;
        let downloader = Downloader::new(config)?;
        downloader.download_all(tasks).await
    };

    tracing::info!(
        "done: {} matched, {} downloaded, {} skipped, {} failed",
        summary.matched,
        summary.downloaded,
        summary.skipped,
        summary.failed
    );

    if let Some(path) = &cli.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        tokio::fs::write(path, json).await?;
    }

    Ok(summary)
}
