// Common data models for downloader

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;
use super::stream::{AutoCloseStream, ReleaseHandle};

/// Token naming one video for the upstream provider (e.g. "dQw4w9WgXcQ")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token naming one playlist (the `list=` parameter)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn playlist_url(&self) -> String {
        format!("https://www.youtube.com/playlist?list={}", self.0)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a piece of input text points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorKind {
    Video,
    Playlist,
    Unrecognized,
}

/// A parsed download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRequest {
    Video(VideoId),
    Playlist(PlaylistId),
}

/// One encoding variant of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Provider format ID (e.g. "18", "22")
    pub format_id: String,
    /// Video width in pixels (0 when unknown)
    pub width: u32,
    /// Video height in pixels (0 when unknown)
    pub height: u32,
    /// Total bitrate in bits per second
    pub bitrate: u64,
    /// Mime type, possibly with parameters (e.g. `video/mp4; codecs="avc1.42001E, mp4a.40.2"`)
    pub mime_type: String,
    /// Whether the encoding carries an audio track
    pub has_audio: bool,
    /// Direct media URL, when the provider exposes one
    #[serde(default)]
    pub url: Option<String>,
    /// Extra HTTP headers required to fetch `url`
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
}

/// Video information and its available formats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: VideoId,
    pub title: String,
    pub formats: Vec<FormatDescriptor>,
}

/// A successfully opened download, ready to be drained by a sink
pub struct DownloadedMedia {
    /// `<title><extension>`
    pub filename: String,
    pub video_id: VideoId,
    /// The format that was selected and opened
    pub format: FormatDescriptor,
    pub stream: AutoCloseStream,
    pub release: ReleaseHandle,
}

impl fmt::Debug for DownloadedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadedMedia")
            .field("filename", &self.filename)
            .field("video_id", &self.video_id)
            .field("format_id", &self.format.format_id)
            .field("drained", &self.stream.is_drained())
            .finish()
    }
}

/// Result of one video attempt: exactly one of success or failure
pub type DownloadOutcome = Result<DownloadedMedia, DownloadError>;
