// yt-dlp provider - metadata and playlists via the `yt-dlp` binary,
// media bytes via a direct HTTP stream of the chosen format

use async_trait::async_trait;
use std::process::Command as StdCommand;
use std::time::Duration;

use super::json::{parse_playlist_members, parse_video_metadata};
use crate::downloader::config::DownloaderConfig;
use crate::downloader::errors::ProviderError;
use crate::downloader::models::{FormatDescriptor, PlaylistId, VideoId, VideoMetadata};
use crate::downloader::stream::{BoxedResource, HttpMediaResource};
use crate::downloader::traits::VideoProvider;
use crate::downloader::utils::{
    get_proxy_args, get_session_args, get_timeout_args, run_output_with_timeout,
};

pub struct YtDlpProvider {
    ytdlp_path: String,
    config: DownloaderConfig,
    client: reqwest::Client,
}

impl YtDlpProvider {
    pub fn new(config: DownloaderConfig) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds as u64));

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| {
                ProviderError::Execution(format!("Invalid proxy {}: {}", proxy, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Execution(format!("Failed to build HTTP client: {}", e)))?;

        let ytdlp_path = Self::find_ytdlp(&config);
        tracing::debug!(path = %ytdlp_path, "using yt-dlp binary");

        Ok(Self {
            ytdlp_path,
            config,
            client,
        })
    }

    pub fn ytdlp_path(&self) -> &str {
        &self.ytdlp_path
    }

    /// Find yt-dlp binary
    fn find_ytdlp(config: &DownloaderConfig) -> String {
        if let Some(path) = &config.ytdlp_path {
            return path.clone();
        }

        if let Ok(path) = std::env::var("YTDLP_PATH") {
            if !path.trim().is_empty() {
                return path;
            }
        }

        let common_paths = [
            "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
            "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pip
            "/usr/bin/yt-dlp",          // System installation
        ];

        for path in common_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }

        if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                if let Ok(path) = String::from_utf8(output.stdout) {
                    let trimmed = path.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }

        "yt-dlp".to_string()
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--no-warnings".to_string()];
        args.extend(get_timeout_args(&self.config));
        args.extend(get_proxy_args(&self.config));
        args.extend(get_session_args(&self.config));
        args
    }

    fn metadata_args(&self, id: &VideoId) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string(), "--no-playlist".to_string()];
        args.extend(self.common_args());
        args.push(id.watch_url());
        args
    }

    fn playlist_args(&self, id: &PlaylistId) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
        ];
        args.extend(self.common_args());
        args.push(id.playlist_url());
        args
    }

    /// Run yt-dlp and return stdout, classifying stderr on failure
    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>, ProviderError> {
        tracing::debug!(cmd = %format!("{} {}", self.ytdlp_path, args.join(" ")), "running yt-dlp");

        // Process timeout is a little longer than the socket timeout
        let timeout_secs = self.config.timeout_seconds as u64 * 2;
        let output = run_output_with_timeout(&self.ytdlp_path, &args, timeout_secs).await?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = ?output.status.code(), stderr = %stderr, "yt-dlp failed");
            Err(ProviderError::from(stderr))
        }
    }
}

#[async_trait]
impl VideoProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn get_metadata(&self, id: &VideoId) -> Result<VideoMetadata, ProviderError> {
        let stdout = self.run(self.metadata_args(id)).await?;
        parse_video_metadata(&stdout, id)
    }

    async fn open_stream(
        &self,
        _video: &VideoMetadata,
        format: &FormatDescriptor,
    ) -> Result<BoxedResource, ProviderError> {
        let url = format.url.as_deref().ok_or_else(|| {
            ProviderError::Execution(format!("Format {} has no direct URL", format.format_id))
        })?;

        let mut request = self.client.get(url);
        for (name, value) in &format.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        Ok(Box::new(HttpMediaResource::new(response)))
    }

    async fn get_playlist_members(&self, id: &PlaylistId) -> Result<Vec<VideoId>, ProviderError> {
        let stdout = self.run(self.playlist_args(id)).await?;
        parse_playlist_members(&stdout)
    }
}
