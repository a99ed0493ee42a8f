// Mime registry - maps base mime types to file extensions
//
// The registry is an explicit value built once at startup and shared by
// reference; there is no process-wide table.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;

lazy_static! {
    static ref BASE_MIME_RE: Regex =
        Regex::new(r"^\s*([a-zA-Z0-9\-\.]+/[a-zA-Z0-9\-\.]+)").unwrap();
    static ref EXTENSION_RE: Regex = Regex::new(r"^\.[a-zA-Z0-9\-_]+$").unwrap();
}

/// Common types every registry starts with
const SYSTEM_TYPES: &[(&str, &str)] = &[
    ("text/html", ".html"),
    ("text/html", ".htm"),
    ("text/css", ".css"),
    ("text/javascript", ".js"),
    ("text/xml", ".xml"),
    ("application/json", ".json"),
    ("application/pdf", ".pdf"),
    ("application/wasm", ".wasm"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/jpeg", ".jpeg"),
    ("image/gif", ".gif"),
    ("image/avif", ".avif"),
    ("image/webp", ".webp"),
    ("audio/mpeg", ".mp3"),
    ("audio/mp4", ".m4a"),
    ("audio/ogg", ".ogg"),
    ("audio/webm", ".weba"),
];

/// Video containers served by YouTube
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("video/x-flv", ".flv"),
    ("video/3gpp", ".3gp"),
    ("video/quicktime", ".mov"),
];

/// Mapping from base mime type to candidate extensions, in registration order
#[derive(Debug, Clone, Default)]
pub struct MimeRegistry {
    table: HashMap<String, Vec<String>>,
}

impl MimeRegistry {
    /// Registry with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry seeded with common system types and the video table
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for (mime_type, ext) in SYSTEM_TYPES.iter().chain(VIDEO_TYPES) {
            registry.insert(mime_type, ext);
        }
        registry
    }

    /// Register `ext` (with leading dot) for `mime_type`.
    ///
    /// Parameters on `mime_type` are ignored. The first extension registered
    /// for a type stays the one returned by [`resolve_extension`](Self::resolve_extension).
    pub fn register(&mut self, mime_type: &str, ext: &str) -> Result<(), DownloadError> {
        if !EXTENSION_RE.is_match(ext) {
            return Err(DownloadError::mime(
                mime_type,
                format!("invalid extension {:?}", ext),
            ));
        }

        let base = base_mime_type(mime_type)
            .ok_or_else(|| DownloadError::mime(mime_type, "invalid mime type"))?;

        self.insert(&base, ext);
        Ok(())
    }

    fn insert(&mut self, base: &str, ext: &str) {
        let exts = self.table.entry(base.to_ascii_lowercase()).or_default();
        let ext = ext.to_ascii_lowercase();
        if !exts.contains(&ext) {
            exts.push(ext);
        }
    }

    /// All extensions registered for a mime type (parameters ignored)
    pub fn extensions_for(&self, mime_type: &str) -> &[String] {
        base_mime_type(mime_type)
            .and_then(|base| self.table.get(&base))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve the file extension for a possibly parameterized mime type
    pub fn resolve_extension(&self, mime_type: &str) -> Result<&str, DownloadError> {
        let base = base_mime_type(mime_type)
            .ok_or_else(|| DownloadError::mime(mime_type, "invalid mime type"))?;

        self.table
            .get(&base)
            .and_then(|exts| exts.first())
            .map(String::as_str)
            .ok_or_else(|| {
                let reason = format!("no extension found for mime type {:?}", base);
                DownloadError::mime(mime_type, reason)
            })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Leading `type/subtype` token, lowercased
fn base_mime_type(mime_type: &str) -> Option<String> {
    BASE_MIME_RE
        .captures(mime_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}
