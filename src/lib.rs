pub mod downloader;

pub use downloader::{
    DeliverySink, DownloadError, DownloadOutcome, DownloadRequest, DownloadedMedia, Downloader,
    DownloaderConfig, ErrorKind, LocatorKind, MimeRegistry, PlaylistId, ProviderError, VideoId,
    VideoProvider,
};
