// Downloader module - locator parsing, format selection, fetching and
// playlist fan-out

pub mod config;
pub mod errors;
pub mod extractors;
pub mod fetcher;
pub mod format_selector;
pub mod locator;
pub mod mime;
pub mod models;
pub mod orchestrator;
pub mod playlist;
pub mod stream;
pub mod traits;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::DownloaderConfig;
pub use errors::{DownloadError, ErrorKind, ProviderError};
pub use extractors::YtDlpProvider;
pub use fetcher::MediaFetcher;
pub use format_selector::FormatSelector;
pub use locator::{classify, extract_playlist_id, extract_video_id, parse_request};
pub use mime::MimeRegistry;
pub use models::{
    DownloadOutcome, DownloadRequest, DownloadedMedia, FormatDescriptor, LocatorKind, PlaylistId,
    VideoId, VideoMetadata,
};
pub use orchestrator::Downloader;
pub use playlist::{download_playlist, PlaylistDownload};
pub use stream::{AutoCloseStream, MediaResource, ReleaseHandle, StreamState};
pub use traits::{DeliverySink, VideoProvider};
