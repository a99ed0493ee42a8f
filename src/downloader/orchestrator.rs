// Orchestrator - turns request text into outcomes delivered to a sink

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::DownloaderConfig;
use super::errors::DownloadError;
use super::extractors::YtDlpProvider;
use super::fetcher::MediaFetcher;
use super::locator::parse_request;
use super::mime::MimeRegistry;
use super::models::{DownloadOutcome, DownloadRequest, PlaylistId, VideoId};
use super::playlist::{download_playlist, PlaylistDownload};
use super::traits::{DeliverySink, VideoProvider};

pub struct Downloader {
    fetcher: MediaFetcher,
}

impl Downloader {
    pub fn new(provider: Arc<dyn VideoProvider>, registry: MimeRegistry) -> Self {
        Self {
            fetcher: MediaFetcher::new(provider, Arc::new(registry)),
        }
    }

    /// Build a yt-dlp backed downloader with the configured mime extras
    pub fn from_config(config: &DownloaderConfig) -> anyhow::Result<Self> {
        let registry = config.build_registry()?;
        let provider = YtDlpProvider::new(config.clone())
            .map_err(|e| anyhow::anyhow!("failed to set up yt-dlp provider: {}", e))?;
        Ok(Self::new(Arc::new(provider), registry))
    }

    pub async fn download_video(
        &self,
        id: &VideoId,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        self.fetcher.fetch(id, cancel).await
    }

    pub fn download_playlist(&self, id: PlaylistId, cancel: CancellationToken) -> PlaylistDownload {
        download_playlist(self.fetcher.clone(), id, cancel)
    }

    /// Handle one user request end to end.
    ///
    /// Every outcome is handed to `sink` exactly once, in production order.
    /// Returns the number of outcomes delivered; unrecognized text is an
    /// `InvalidLocator` error and nothing is delivered.
    pub async fn handle_request(
        &self,
        text: &str,
        sink: &mut dyn DeliverySink,
        cancel: &CancellationToken,
    ) -> Result<usize, DownloadError> {
        let request = parse_request(text)?;
        let mut delivered = 0;

        match request {
            DownloadRequest::Video(id) => {
                info!(video_id = %id, "video download requested");
                let outcome = self.download_video(&id, cancel).await;
                if matches!(outcome, Err(DownloadError::Cancelled)) {
                    return Ok(delivered);
                }
                deliver(sink, outcome).await;
                delivered += 1;
            }
            DownloadRequest::Playlist(id) => {
                info!(playlist_id = %id, "playlist download requested");
                let mut outcomes = self.download_playlist(id, cancel.clone());
                while let Some(outcome) = outcomes.next().await {
                    deliver(sink, outcome).await;
                    delivered += 1;
                }
            }
        }

        Ok(delivered)
    }
}

async fn deliver(sink: &mut dyn DeliverySink, outcome: DownloadOutcome) {
    if let Err(e) = sink.deliver(outcome).await {
        warn!(error = %e, "sink failed to deliver outcome");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::{ErrorKind, ProviderError};
    use crate::downloader::test_support::{format, metadata, FakeProvider};
    use async_trait::async_trait;
    use tokio::io::AsyncReadExt;

    /// Drains successes like an uploader would and records what it saw
    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<Result<(String, Vec<u8>), String>>,
        fail_first: bool,
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&mut self, outcome: DownloadOutcome) -> anyhow::Result<()> {
            match outcome {
                Ok(mut media) => {
                    let mut body = Vec::new();
                    media.stream.read_to_end(&mut body).await?;
                    media.release.release().await?;
                    self.delivered.push(Ok((media.filename, body)));
                }
                Err(e) => self.delivered.push(Err(e.to_string())),
            }
            if self.fail_first && self.delivered.len() == 1 {
                anyhow::bail!("upload rejected");
            }
            Ok(())
        }
    }

    fn downloader(provider: FakeProvider) -> Downloader {
        Downloader::new(Arc::new(provider), MimeRegistry::with_defaults())
    }

    fn provider() -> FakeProvider {
        FakeProvider::new()
            .with_video(metadata(
                "dQw4w9WgXcQ",
                "Song",
                vec![format("43", 640, 360, 600_000, "video/webm; codecs=\"vp8.0, vorbis\"", true)],
            ))
            .with_video(metadata(
                "aaaaaaaaaaa",
                "Other",
                vec![format("18", 640, 360, 500_000, "video/mp4", true)],
            ))
            .with_playlist("PLmix", &["aaaaaaaaaaa", "zzzzzzzzzzz", "dQw4w9WgXcQ"])
    }

    #[tokio::test]
    async fn test_single_video_request() {
        let downloader = downloader(provider());
        let mut sink = RecordingSink::default();

        let count = downloader
            .handle_request(" https://youtu.be/dQw4w9WgXcQ ", &mut sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            sink.delivered,
            vec![Ok::<_, String>(("Song.webm".to_string(), b"dQw4w9WgXcQ:43".to_vec()))]
        );
    }

    #[tokio::test]
    async fn test_playlist_request_in_order() {
        let downloader = downloader(provider());
        let mut sink = RecordingSink {
            fail_first: true,
            ..Default::default()
        };

        let count = downloader
            .handle_request(
                "https://www.youtube.com/playlist?list=PLmix",
                &mut sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(sink.delivered[0].as_ref().unwrap().0, "Other.mp4");
        assert!(sink.delivered[1]
            .as_ref()
            .unwrap_err()
            .starts_with("Failed to download video"));
        assert_eq!(sink.delivered[2].as_ref().unwrap().0, "Song.webm");
    }

    #[test]
    fn test_from_config_reports_setup_errors() {
        let bad_proxy = DownloaderConfig::default()
            .with_ytdlp_path(Some("yt-dlp".into()))
            .with_proxy(Some("::not a url::".into()));
        let err = Downloader::from_config(&bad_proxy).err().unwrap();
        assert!(err.to_string().starts_with("failed to set up yt-dlp provider"));

        let bad_mime = DownloaderConfig::default()
            .with_ytdlp_path(Some("yt-dlp".into()))
            .with_mime_type("mkv", "video/x-matroska");
        let err = Downloader::from_config(&bad_mime).err().unwrap();
        assert_eq!(
            err.downcast_ref::<DownloadError>().map(DownloadError::kind),
            Some(ErrorKind::MimeResolutionFailure)
        );
    }

    #[test]
    fn test_from_config_builds() {
        let config = DownloaderConfig::default()
            .with_ytdlp_path(Some("yt-dlp".into()))
            .with_mime_type(".mkv", "video/x-matroska");
        assert!(Downloader::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unrecognized_request() {
        let downloader = downloader(provider());
        let mut sink = RecordingSink::default();

        let err = downloader
            .handle_request("hello", &mut sink, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLocator);
        assert!(sink.delivered.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_video_request_delivers_nothing() {
        let downloader = downloader(provider());
        let mut sink = RecordingSink::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let count = downloader
            .handle_request("https://youtu.be/dQw4w9WgXcQ", &mut sink, &cancel)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(sink.delivered.is_empty());
    }

    #[tokio::test]
    async fn test_playlist_resolution_failure_is_delivered() {
        let downloader = downloader(
            FakeProvider::new().with_playlist_error("PLbad", ProviderError::BlockedByYouTube),
        );
        let mut sink = RecordingSink::default();

        let count = downloader
            .handle_request(
                "youtube.com/playlist?list=PLbad",
                &mut sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(sink.delivered[0]
            .as_ref()
            .unwrap_err()
            .starts_with("Error getting playlist"));
    }
}
