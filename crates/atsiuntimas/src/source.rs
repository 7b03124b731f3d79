//! Classification of the configured source URL.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::FetchError;

/// Tokens that select the bundled local file instead of a URL.
const LOCAL_TOKENS: &[&str] = &["local", "lokalus"];

const GOOGLE_DRIVE_HOSTS: &[&str] = &["drive.google.com", "drive.usercontent.google.com"];
const ONEDRIVE_HOSTS: &[&str] = &["1drv.ms", "onedrive.live.com"];

// File id patterns, tried in order
static DRIVE_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/d/([a-zA-Z0-9_-]+)",
        r"id=([a-zA-Z0-9_-]+)",
        r"/file/d/([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid drive id regex"))
    .collect()
});

/// Where a schedule document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalSource {
    Local,
    DirectUrl(String),
    GoogleDrive { file_id: String },
    OneDrive(String),
}

impl RetrievalSource {
    /// Classify a user-configured URL string.
    ///
    /// Fails only for Google Drive links that carry no recognizable file id.
    pub fn classify(configured: &str) -> Result<Self, FetchError> {
        let url = configured.trim();

        if url.is_empty() || LOCAL_TOKENS.iter().any(|t| url.eq_ignore_ascii_case(t)) {
            return Ok(RetrievalSource::Local);
        }

        if GOOGLE_DRIVE_HOSTS.iter().any(|h| url.contains(h)) {
            let file_id =
                extract_drive_file_id(url).ok_or_else(|| FetchError::SourceResolution {
                    url: url.to_string(),
                    reason: "no Google Drive file id found in link".to_string(),
                })?;
            return Ok(RetrievalSource::GoogleDrive { file_id });
        }

        if ONEDRIVE_HOSTS.iter().any(|h| url.contains(h)) {
            return Ok(RetrievalSource::OneDrive(url.to_string()));
        }

        Ok(RetrievalSource::DirectUrl(url.to_string()))
    }

    /// Whether attempts for this source go through CORS relays.
    pub fn uses_relays(&self) -> bool {
        matches!(
            self,
            RetrievalSource::GoogleDrive { .. } | RetrievalSource::OneDrive(_)
        )
    }
}

/// Extract a Drive file id; the first matching pattern wins.
fn extract_drive_file_id(url: &str) -> Option<String> {
    DRIVE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Direct-download URL shapes for a Drive file id, in the order they are tried.
pub fn drive_download_urls(file_id: &str) -> Vec<String> {
    vec![
        format!("https://drive.google.com/uc?export=download&id={}", file_id),
        format!(
            "https://drive.usercontent.google.com/download?id={}&export=download&confirm=t",
            file_id
        ),
        format!("https://docs.google.com/uc?export=download&id={}", file_id),
    ]
}

/// Turn a OneDrive share link into a content URL of the shares API.
pub fn onedrive_content_url(share_url: &str) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(share_url.as_bytes());
    format!("https://api.onedrive.com/v1.0/shares/u!{}/root/content", encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_local() {
        assert_eq!(RetrievalSource::classify("").unwrap(), RetrievalSource::Local);
        assert_eq!(RetrievalSource::classify("  ").unwrap(), RetrievalSource::Local);
        assert_eq!(RetrievalSource::classify("local").unwrap(), RetrievalSource::Local);
        assert_eq!(RetrievalSource::classify("lokalus").unwrap(), RetrievalSource::Local);
    }

    #[test]
    fn test_classify_drive_path_form() {
        let source = RetrievalSource::classify(
            "https://drive.google.com/file/d/1AbC_d-9xyz/view?usp=sharing",
        )
        .unwrap();
        assert_eq!(
            source,
            RetrievalSource::GoogleDrive {
                file_id: "1AbC_d-9xyz".to_string()
            }
        );
        assert!(source.uses_relays());
    }

    #[test]
    fn test_classify_drive_query_form() {
        let source =
            RetrievalSource::classify("https://drive.google.com/open?id=XYZ123").unwrap();
        assert_eq!(
            source,
            RetrievalSource::GoogleDrive {
                file_id: "XYZ123".to_string()
            }
        );
    }

    #[test]
    fn test_classify_drive_usercontent_host() {
        let source = RetrievalSource::classify(
            "https://drive.usercontent.google.com/download?id=abc&export=download",
        )
        .unwrap();
        assert_eq!(
            source,
            RetrievalSource::GoogleDrive {
                file_id: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_classify_drive_without_id_fails() {
        let result = RetrievalSource::classify("https://drive.google.com/drive/my-drive");
        assert!(matches!(result, Err(FetchError::SourceResolution { .. })));
    }

    #[test]
    fn test_classify_onedrive() {
        let url = "https://1drv.ms/u/s!AbCdEf";
        assert_eq!(
            RetrievalSource::classify(url).unwrap(),
            RetrievalSource::OneDrive(url.to_string())
        );
    }

    #[test]
    fn test_classify_direct() {
        let url = "https://raw.githubusercontent.com/u/r/main/grafikas_data.json";
        let source = RetrievalSource::classify(url).unwrap();
        assert_eq!(source, RetrievalSource::DirectUrl(url.to_string()));
        assert!(!source.uses_relays());
    }

    #[test]
    fn test_drive_download_urls_order() {
        let urls = drive_download_urls("ID");
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0], "https://drive.google.com/uc?export=download&id=ID");
        assert!(urls[1].starts_with("https://drive.usercontent.google.com/download?id=ID"));
        assert!(urls[2].starts_with("https://docs.google.com/"));
    }

    #[test]
    fn test_onedrive_content_url_is_base64url_without_padding() {
        let url = onedrive_content_url("https://1drv.ms/u/s!AbCdEf");
        let encoded = URL_SAFE_NO_PAD.encode("https://1drv.ms/u/s!AbCdEf");

        assert_eq!(
            url,
            format!("https://api.onedrive.com/v1.0/shares/u!{}/root/content", encoded)
        );
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }
}
