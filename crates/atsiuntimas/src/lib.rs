//! Atsiuntimas - downloader for monthly work-schedule documents.
//!
//! Resolves a configured source (bundled local file, direct URL, Google Drive
//! or OneDrive share link) into an ordered list of download attempts, runs
//! them one at a time through CORS relays where needed, and validates the
//! first usable body as a schedule document.

pub mod config;
pub mod dataset;
pub mod error;
pub mod fetcher;
pub mod plan;
pub mod retriever;
pub mod source;

pub use config::Settings;
pub use dataset::{ScheduleDataset, Teacher};
pub use error::{AttemptError, FetchError, RelayError};
pub use fetcher::{Fetcher, HttpFetcher, HttpResponse};
pub use retriever::{Retriever, LOCAL_FILE_NAME};
pub use source::RetrievalSource;
