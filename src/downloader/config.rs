// Downloader configuration
//
// Loaded from JSON (all fields optional) and optionally overridden from the
// environment:
// - YTDLP_PATH        path to the yt-dlp binary
// - TUBEFETCH_PROXY   proxy URL (e.g. "socks5://127.0.0.1:1080")
// - TUBEFETCH_COOKIES path to a cookies.txt file

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;
use super::mime::MimeRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Explicit yt-dlp binary; auto-detected when unset
    pub ytdlp_path: Option<String>,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// YouTube player client (android, web, tv)
    pub player_client: Option<String>,
    /// Extra extension -> mime type registrations (e.g. ".mkv" -> "video/x-matroska")
    pub extra_mime_types: BTreeMap<String, String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            proxy: None,
            cookies_path: None,
            timeout_seconds: 30,
            player_client: None,
            extra_mime_types: BTreeMap::new(),
        }
    }
}

impl DownloaderConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        Self::from_json_str(&content)
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("YTDLP_PATH") {
            self.ytdlp_path = Some(path);
        }
        if let Some(proxy) = non_empty("TUBEFETCH_PROXY") {
            self.proxy = Some(proxy);
        }
        if let Some(cookies) = non_empty("TUBEFETCH_COOKIES") {
            self.cookies_path = Some(cookies);
        }
        self
    }

    pub fn with_ytdlp_path(mut self, path: Option<String>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_player_client(mut self, client: Option<String>) -> Self {
        self.player_client = client;
        self
    }

    pub fn with_mime_type(mut self, ext: &str, mime_type: &str) -> Self {
        self.extra_mime_types
            .insert(ext.to_string(), mime_type.to_string());
        self
    }

    /// Default registry plus the configured extras
    pub fn build_registry(&self) -> Result<MimeRegistry, DownloadError> {
        let mut registry = MimeRegistry::with_defaults();
        for (ext, mime_type) in &self.extra_mime_types {
            registry.register(mime_type, ext)?;
            tracing::debug!(ext = %ext, mime_type = %mime_type, "registered mime type");
        }
        Ok(registry)
    }
}
