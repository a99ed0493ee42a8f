// Parsing of yt-dlp JSON output (`--dump-json`, `--dump-single-json`)

use std::collections::BTreeMap;

use crate::downloader::errors::ProviderError;
use crate::downloader::models::{FormatDescriptor, VideoId, VideoMetadata};

/// Parse `--dump-json` output for a single video
pub fn parse_video_metadata(
    stdout: &[u8],
    requested: &VideoId,
) -> Result<VideoMetadata, ProviderError> {
    let json: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| ProviderError::Parse(format!("Invalid JSON: {}", e)))?;

    let formats_array = json["formats"]
        .as_array()
        .ok_or_else(|| ProviderError::Parse("No formats array in JSON".to_string()))?;

    let formats: Vec<FormatDescriptor> = formats_array.iter().filter_map(parse_format).collect();
    if formats.len() < formats_array.len() {
        tracing::debug!(
            video_id = %requested,
            skipped = formats_array.len() - formats.len(),
            "skipped formats without a direct http url"
        );
    }

    let id = json["id"]
        .as_str()
        .map(VideoId::new)
        .unwrap_or_else(|| requested.clone());

    Ok(VideoMetadata {
        title: json["title"].as_str().unwrap_or(id.as_str()).to_string(),
        id,
        formats,
    })
}

/// Parse `--flat-playlist --dump-single-json` output into ordered member IDs
pub fn parse_playlist_members(stdout: &[u8]) -> Result<Vec<VideoId>, ProviderError> {
    let json: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| ProviderError::Parse(format!("Invalid JSON: {}", e)))?;

    let entries = json["entries"]
        .as_array()
        .ok_or_else(|| ProviderError::Parse("No entries array in playlist JSON".to_string()))?;

    Ok(entries
        .iter()
        .filter_map(|entry| entry["id"].as_str())
        .map(VideoId::new)
        .collect())
}

fn parse_format(f: &serde_json::Value) -> Option<FormatDescriptor> {
    let url = f["url"].as_str()?;
    let protocol = f["protocol"].as_str().unwrap_or("https");
    if protocol != "https" && protocol != "http" {
        return None;
    }

    let ext = f["ext"].as_str().unwrap_or("");
    let vcodec = codec(&f["vcodec"]);
    let acodec = codec(&f["acodec"]);

    let http_headers: BTreeMap<String, String> = f["http_headers"]
        .as_object()
        .map(|headers| {
            headers
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Some(FormatDescriptor {
        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
        width: f["width"].as_u64().unwrap_or(0) as u32,
        height: f["height"].as_u64().unwrap_or(0) as u32,
        bitrate: f["tbr"]
            .as_f64()
            .map(|kbps| (kbps * 1000.0).round() as u64)
            .unwrap_or(0),
        mime_type: mime_type_for(ext, vcodec, acodec),
        has_audio: acodec.is_some(),
        url: Some(url.to_string()),
        http_headers,
    })
}

/// Codec name, or `None` when absent or "none"
fn codec(value: &serde_json::Value) -> Option<&str> {
    value
        .as_str()
        .filter(|c| !c.is_empty() && *c != "none")
}

/// Build a mime type like `video/mp4; codecs="avc1.42001E, mp4a.40.2"`
pub fn mime_type_for(ext: &str, vcodec: Option<&str>, acodec: Option<&str>) -> String {
    let audio_only = vcodec.is_none() && acodec.is_some();

    let base = match (ext, audio_only) {
        ("mp4", false) => "video/mp4".to_string(),
        ("m4a", _) | ("mp4", true) => "audio/mp4".to_string(),
        ("webm", false) => "video/webm".to_string(),
        ("webm", true) => "audio/webm".to_string(),
        ("3gp", _) => "video/3gpp".to_string(),
        ("flv", _) => "video/x-flv".to_string(),
        ("mov", _) => "video/quicktime".to_string(),
        ("mp3", _) => "audio/mpeg".to_string(),
        ("ogg", _) | ("opus", _) => "audio/ogg".to_string(),
        (other, true) => format!("audio/{}", other),
        (other, false) => format!("video/{}", other),
    };

    let codecs: Vec<&str> = vcodec.into_iter().chain(acodec).collect();
    if codecs.is_empty() {
        base
    } else {
        format!("{}; codecs=\"{}\"", base, codecs.join(", "))
    }
}
