// Extractors - concrete video providers
//
// Only the yt-dlp CLI provider is implemented: metadata and playlist
// members come from `yt-dlp` JSON output, media bytes are streamed over
// HTTP from the selected format's URL.

mod json;
mod ytdlp;

pub use json::{mime_type_for, parse_playlist_members, parse_video_metadata};
pub use ytdlp::YtDlpProvider;
