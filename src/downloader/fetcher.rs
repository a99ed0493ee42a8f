// Media fetcher - metadata, format selection, stream open, naming

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::mime::MimeRegistry;
use super::models::{DownloadOutcome, DownloadedMedia, VideoId};
use super::stream::AutoCloseStream;
use super::traits::VideoProvider;

/// Fetches one video and wraps its best format as a streamable download
#[derive(Clone)]
pub struct MediaFetcher {
    provider: Arc<dyn VideoProvider>,
    registry: Arc<MimeRegistry>,
}

impl MediaFetcher {
    pub fn new(provider: Arc<dyn VideoProvider>, registry: Arc<MimeRegistry>) -> Self {
        Self { provider, registry }
    }

    pub fn provider(&self) -> &Arc<dyn VideoProvider> {
        &self.provider
    }

    pub async fn fetch(&self, id: &VideoId, cancel: &CancellationToken) -> DownloadOutcome {
        debug!(video_id = %id, backend = self.provider.name(), "fetching video metadata");

        let metadata = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            res = self.provider.get_metadata(id) => res.map_err(|e| {
                warn!(video_id = %id, error = %e, "metadata lookup failed");
                DownloadError::StreamOpen(e)
            })?,
        };

        let candidates = FormatSelector::audio_capable(&metadata.formats);
        debug!(
            video_id = %id,
            total = metadata.formats.len(),
            with_audio = candidates.len(),
            "formats available"
        );

        let format = FormatSelector::select_best(candidates)?;

        let resource = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            res = self.provider.open_stream(&metadata, format) => res.map_err(|e| {
                warn!(
                    video_id = %id,
                    format_id = %format.format_id,
                    error = %e,
                    "stream open failed"
                );
                DownloadError::StreamOpen(e)
            })?,
        };

        let extension = match self.registry.resolve_extension(&format.mime_type) {
            Ok(ext) => ext,
            Err(e) => {
                let mut resource = resource;
                if let Err(release_err) = resource.release().await {
                    debug!(
                        video_id = %id,
                        error = %release_err,
                        "release after mime failure failed"
                    );
                }
                return Err(e);
            }
        };

        let filename = format!("{}{}", metadata.title, extension);
        let (stream, release) = AutoCloseStream::new(resource);

        info!(
            video_id = %id,
            format_id = %format.format_id,
            width = format.width,
            height = format.height,
            filename = %filename,
            "video ready for streaming"
        );

        Ok(DownloadedMedia {
            filename,
            video_id: id.clone(),
            format: format.clone(),
            stream,
            release,
        })
    }
}
