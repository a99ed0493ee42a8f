// Locator classification - recognizes YouTube video and playlist links
//
// Accepted video shapes (case-insensitive, scheme and `www.` optional):
// - youtube.com/watch?v=<id> (the `v` parameter may appear anywhere in the query)
// - youtube.com/v/<id>, youtube.com/embed/<id>, youtube.com/shorts/<id>
// - youtu.be/<id>
// Accepted playlist shape: youtube.com/playlist?list=<id>

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;
use super::models::{DownloadRequest, LocatorKind, PlaylistId, VideoId};

lazy_static! {
    static ref VIDEO_URL_RE: Regex = Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:youtube\.com/(?:.*[?&]v=|(?:v|embed|shorts)/|watch\?.*?v=)|youtu\.be/)([a-zA-Z0-9_-]{11})"
    )
    .unwrap();
    static ref PLAYLIST_URL_RE: Regex = Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?youtube\.com/playlist\?list=([a-zA-Z0-9_-]+)"
    )
    .unwrap();
}

pub fn is_video_url(text: &str) -> bool {
    VIDEO_URL_RE.is_match(text)
}

pub fn is_playlist_url(text: &str) -> bool {
    PLAYLIST_URL_RE.is_match(text)
}

/// Classify input text. Playlist links take precedence over video links.
pub fn classify(text: &str) -> LocatorKind {
    if is_playlist_url(text) {
        LocatorKind::Playlist
    } else if is_video_url(text) {
        LocatorKind::Video
    } else {
        LocatorKind::Unrecognized
    }
}

/// Extract the 11-character video ID from a video link
pub fn extract_video_id(text: &str) -> Result<VideoId, DownloadError> {
    VIDEO_URL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId::new(m.as_str()))
        .ok_or_else(|| DownloadError::InvalidLocator(text.to_string()))
}

/// Extract the playlist ID; `None` unless the text is a playlist link
pub fn extract_playlist_id(text: &str) -> Option<PlaylistId> {
    PLAYLIST_URL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| PlaylistId::new(m.as_str()))
}

/// Turn user text into a download request
pub fn parse_request(text: &str) -> Result<DownloadRequest, DownloadError> {
    let trimmed = text.trim();

    match classify(trimmed) {
        LocatorKind::Playlist => extract_playlist_id(trimmed)
            .map(DownloadRequest::Playlist)
            .ok_or_else(|| DownloadError::InvalidLocator(trimmed.to_string())),
        LocatorKind::Video => extract_video_id(trimmed).map(DownloadRequest::Video),
        LocatorKind::Unrecognized => Err(DownloadError::InvalidLocator(trimmed.to_string())),
    }
}
