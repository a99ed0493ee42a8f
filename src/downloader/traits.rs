// Upstream provider and delivery sink traits

use async_trait::async_trait;

use super::errors::ProviderError;
use super::models::{DownloadOutcome, FormatDescriptor, PlaylistId, VideoId, VideoMetadata};
use super::stream::BoxedResource;

/// Trait for upstream video providers
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    /// Get title and available formats of a video
    async fn get_metadata(&self, id: &VideoId) -> Result<VideoMetadata, ProviderError>;

    /// Open a byte stream for one format of a video
    async fn open_stream(
        &self,
        metadata: &VideoMetadata,
        format: &FormatDescriptor,
    ) -> Result<BoxedResource, ProviderError>;

    /// Resolve the ordered member list of a playlist
    async fn get_playlist_members(&self, id: &PlaylistId) -> Result<Vec<VideoId>, ProviderError>;
}

/// Receiver of download outcomes (chat upload, file writer, ...)
///
/// On success the sink is expected to drain the stream fully and then call
/// `release` on the handle; on failure it reports the error message.
#[async_trait]
pub trait DeliverySink: Send {
    async fn deliver(&mut self, outcome: DownloadOutcome) -> anyhow::Result<()>;
}
