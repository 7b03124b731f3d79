//! Ordered download attempts for a source.
//!
//! The retry policy lives in the list this module builds, not in control
//! flow: the cascade simply walks the list until something succeeds.

use reqwest::Url;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{FetchError, RelayError};
use crate::source::{drive_download_urls, onedrive_content_url, RetrievalSource};

/// Query parameter carrying the cache-defeating token.
pub const CACHE_BUST_PARAM: &str = "_t";

/// A CORS-bypass relay: the target URL is passed in one query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    base: Url,
    param: String,
}

impl Relay {
    pub fn new(base: &str, param: &str) -> Result<Self, RelayError> {
        let base = Url::parse(base).map_err(|e| RelayError::InvalidUrl {
            base: base.to_string(),
            reason: e.to_string(),
        })?;
        if param.is_empty() {
            return Err(RelayError::MissingParam(base.to_string()));
        }
        Ok(Self {
            base,
            param: param.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or("relay")
    }

    /// URL that asks the relay to fetch `target`.
    pub fn wrap(&self, target: &str) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair(&self.param, target);
        url.to_string()
    }

    /// Relays tried for cloud-drive links, in order.
    pub fn defaults() -> Vec<Relay> {
        [
            ("https://corsproxy.io/", "url"),
            ("https://api.allorigins.win/raw", "url"),
            ("https://api.codetabs.com/v1/proxy", "quest"),
        ]
        .iter()
        .filter_map(|(base, param)| Relay::new(base, param).ok())
        .collect()
    }
}

/// One candidate download: a target URL, optionally through a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    target: Url,
    relay: Option<Relay>,
}

impl Attempt {
    pub fn direct(target: Url) -> Self {
        Self {
            target,
            relay: None,
        }
    }

    pub fn relayed(target: Url, relay: Relay) -> Self {
        Self {
            target,
            relay: Some(relay),
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn relay(&self) -> Option<&Relay> {
        self.relay.as_ref()
    }

    /// Final request URL with the cache-busting token on the target.
    pub fn request_url(&self, token: u64) -> String {
        let mut target = self.target.clone();
        target
            .query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &token.to_string());
        match &self.relay {
            Some(relay) => relay.wrap(target.as_str()),
            None => target.to_string(),
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relay {
            Some(relay) => write!(f, "{} via {}", self.target, relay.host()),
            None => write!(f, "{}", self.target),
        }
    }
}

/// Build the ordered attempt list for a network source.
///
/// Drive links expand to every relay x every download URL shape, relay-major.
/// `Local` has no network attempts and yields an empty list.
pub fn plan(source: &RetrievalSource, relays: &[Relay]) -> Result<Vec<Attempt>, FetchError> {
    match source {
        RetrievalSource::Local => Ok(Vec::new()),
        RetrievalSource::DirectUrl(url) => Ok(vec![Attempt::direct(parse_target(url)?)]),
        RetrievalSource::GoogleDrive { file_id } => {
            let targets = drive_download_urls(file_id)
                .iter()
                .map(|u| parse_target(u))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(relays
                .iter()
                .flat_map(|relay| {
                    targets
                        .iter()
                        .map(move |t| Attempt::relayed(t.clone(), relay.clone()))
                })
                .collect())
        }
        RetrievalSource::OneDrive(share_url) => {
            let target = parse_target(&onedrive_content_url(share_url))?;
            Ok(relays
                .iter()
                .map(|relay| Attempt::relayed(target.clone(), relay.clone()))
                .collect())
        }
    }
}

fn parse_target(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::SourceResolution {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

static LAST_TOKEN: AtomicU64 = AtomicU64::new(0);

/// A cache-busting token, strictly increasing within the process.
///
/// Based on the wall clock in milliseconds so tokens also differ between runs.
pub fn cache_token() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TOKEN.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}
