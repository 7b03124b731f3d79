//! Configuration loading from environment variables.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::plan::Relay;

const DEFAULT_DATA_DIR: &str = ".grafikas";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Runtime settings shared by both binaries.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory of the local key/value store (cache, marks, source URL)
    pub data_dir: PathBuf,
    /// Directory holding `grafikas_data.json` for the local source
    pub local_dir: PathBuf,
    /// Timeout of one download attempt
    pub timeout: Duration,
    /// Relays tried for cloud-drive links, in order
    pub relays: Vec<Relay>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            local_dir: PathBuf::from("."),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            relays: Relay::defaults(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Reads `GRAFIKAS_DATA_DIR`, `GRAFIKAS_LOCAL_DIR`, `GRAFIKAS_TIMEOUT_SECS`
    /// and `GRAFIKAS_RELAYS`, either from the environment or from a `.env`
    /// file. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(dir) = lookup("GRAFIKAS_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("GRAFIKAS_LOCAL_DIR") {
            settings.local_dir = PathBuf::from(dir);
        }

        if let Some(secs) = lookup("GRAFIKAS_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("GRAFIKAS_TIMEOUT_SECS is not a number: {}", secs))?;
            settings.timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(relays) = lookup("GRAFIKAS_RELAYS") {
            settings.relays = parse_relays(&relays)?;
        }

        Ok(settings)
    }
}

/// Parse `base|param` pairs separated by commas.
fn parse_relays(value: &str) -> Result<Vec<Relay>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| -> Result<Relay> {
            let (base, param) = entry
                .split_once('|')
                .ok_or_else(|| anyhow!("relay '{}' must look like base|param", entry))?;
            Ok(Relay::new(base.trim(), param.trim())?)
        })
        .collect()
}
