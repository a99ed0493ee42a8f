// Error types for locator parsing, fetching and playlist fan-out

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Failure reported by an upstream provider (yt-dlp, HTTP stream, ...)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Network timeout while connecting to YouTube
    #[error("Network timeout: YouTube is not responding")]
    NetworkTimeout,

    /// YouTube blocked the request (429, bot detection, etc.)
    #[error("YouTube is temporarily throttling requests from this address")]
    BlockedByYouTube,

    /// yt-dlp not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    Parse(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// Non-success HTTP status while opening a media stream
    #[error("HTTP error {status} while opening stream")]
    Http { status: u16 },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

lazy_static! {
    static ref TIMEOUT_RE: Regex = Regex::new(r"(?i)\btimed out\b|\btimeout\b").unwrap();
    static ref BLOCKED_RE: Regex = Regex::new(
        r"(?i)HTTP Error 429|Too Many Requests|not a bot|\bbot\b|\bblocked\b"
    )
    .unwrap();
    static ref PARSE_RE: Regex = Regex::new(r"(?i)\bjson\b|\bparse\b").unwrap();
}

// Classify raw tool output (stderr) into a provider error.
// A missing binary is detected when spawning, never from stderr.
impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        if TIMEOUT_RE.is_match(&s) {
            return Self::NetworkTimeout;
        }

        if BLOCKED_RE.is_match(&s) {
            return Self::BlockedByYouTube;
        }

        if PARSE_RE.is_match(&s) {
            return Self::Parse(s);
        }

        Self::Unknown(s)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::NetworkTimeout;
        }
        if let Some(status) = e.status() {
            return Self::Http {
                status: status.as_u16(),
            };
        }
        Self::Unknown(e.to_string())
    }
}

/// Stable category of a [`DownloadError`], for callers that branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidLocator,
    NoPlayableFormat,
    MimeResolutionFailure,
    StreamOpenFailure,
    PlaylistResolutionFailure,
    Cancelled,
}

/// Terminal failure of a single download attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    /// No recognizable YouTube video identifier in the text
    #[error("Invalid YouTube URL: {0}")]
    InvalidLocator(String),

    /// No encoding with an audio track is available
    #[error("No playable format with audio was found")]
    NoPlayableFormat,

    /// Mime type could not be parsed or has no registered extension
    #[error("Error getting extension for mime type {mime_type:?}: {reason}")]
    MimeResolution { mime_type: String, reason: String },

    /// Upstream metadata lookup or stream open failed
    #[error("Failed to download video: {0}")]
    StreamOpen(ProviderError),

    /// Upstream playlist enumeration failed
    #[error("Error getting playlist: {0}")]
    PlaylistResolution(ProviderError),

    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLocator(_) => ErrorKind::InvalidLocator,
            Self::NoPlayableFormat => ErrorKind::NoPlayableFormat,
            Self::MimeResolution { .. } => ErrorKind::MimeResolutionFailure,
            Self::StreamOpen(_) => ErrorKind::StreamOpenFailure,
            Self::PlaylistResolution(_) => ErrorKind::PlaylistResolutionFailure,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn mime(mime_type: &str, reason: impl Into<String>) -> Self {
        Self::MimeResolution {
            mime_type: mime_type.to_string(),
            reason: reason.into(),
        }
    }
}
