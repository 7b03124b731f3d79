//! Resolve a configured source and run its download cascade.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::dataset::{parse_document, ScheduleDataset};
use crate::error::{AttemptError, FetchError};
use crate::fetcher::Fetcher;
use crate::plan::{cache_token, plan, Attempt, Relay};
use crate::source::RetrievalSource;

/// File read when the source is `Local`.
pub const LOCAL_FILE_NAME: &str = "grafikas_data.json";

/// Downloads and validates schedule documents.
pub struct Retriever<F> {
    fetcher: F,
    relays: Vec<Relay>,
    local_dir: PathBuf,
}

impl<F: Fetcher> Retriever<F> {
    pub fn new(fetcher: F, relays: Vec<Relay>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            relays,
            local_dir: local_dir.into(),
        }
    }

    pub fn local_path(&self) -> PathBuf {
        self.local_dir.join(LOCAL_FILE_NAME)
    }

    /// Fetch the schedule behind a configured URL string.
    ///
    /// Never panics; every failure comes back as a typed [`FetchError`] so the
    /// caller can fall back to its cached dataset.
    pub async fn resolve_and_fetch(&self, configured_url: &str) -> Result<ScheduleDataset, FetchError> {
        let source = RetrievalSource::classify(configured_url)?;

        if source == RetrievalSource::Local {
            return load_local(&self.local_path()).await;
        }

        let attempts = plan(&source, &self.relays)?;
        info!(
            source = ?source,
            attempts = attempts.len(),
            "Fetching schedule"
        );
        first_success(&self.fetcher, &attempts).await
    }
}

/// Walk `attempts` in order; the first response that passes transport checks
/// decides the outcome.
///
/// Transport failures (bad status, network, timeout, HTML body) advance to the
/// next attempt. A body that passes transport checks but is not a schedule
/// document ends the search with a schema error.
pub async fn first_success<F: Fetcher + ?Sized>(
    fetcher: &F,
    attempts: &[Attempt],
) -> Result<ScheduleDataset, FetchError> {
    let total = attempts.len();
    let mut last: Option<(String, AttemptError)> = None;

    for (index, attempt) in attempts.iter().enumerate() {
        let url = attempt.request_url(cache_token());
        debug!(attempt = index + 1, total, candidate = %attempt, "Trying candidate");

        match fetch_body(fetcher, &url).await {
            Ok(body) => {
                let dataset = parse_document(&body)?;
                info!(
                    attempt = index + 1,
                    teachers = dataset.teachers.len(),
                    year = dataset.year,
                    month = dataset.month,
                    "Schedule downloaded"
                );
                return Ok(dataset);
            }
            Err(e) => {
                warn!(attempt = index + 1, total, candidate = %attempt, error = %e, "Attempt failed");
                last = Some((url, e));
            }
        }
    }

    match last {
        Some((url, last)) => Err(FetchError::Transport {
            attempts: total,
            url,
            last,
        }),
        None => Err(FetchError::SourceResolution {
            url: String::new(),
            reason: "no download candidates (relay list is empty)".to_string(),
        }),
    }
}

async fn fetch_body<F: Fetcher + ?Sized>(fetcher: &F, url: &str) -> Result<String, AttemptError> {
    let response = fetcher.get(url).await?;
    if !response.is_success() {
        return Err(AttemptError::Status(response.status));
    }
    if response.looks_like_markup() {
        return Err(AttemptError::Markup);
    }
    Ok(response.body)
}

async fn load_local(path: &Path) -> Result<ScheduleDataset, FetchError> {
    info!(path = %path.display(), "Loading local schedule file");
    let body = match tokio::fs::read_to_string(path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FetchError::LocalNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(FetchError::Transport {
                attempts: 1,
                url: path.display().to_string(),
                last: AttemptError::Network(e.to_string()),
            });
        }
    };

    if body.trim_start().starts_with('<') {
        return Err(FetchError::Transport {
            attempts: 1,
            url: path.display().to_string(),
            last: AttemptError::Markup,
        });
    }

    parse_document(&body)
}
