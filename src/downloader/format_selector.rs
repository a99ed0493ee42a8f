// FormatSelector - picks the best audio-capable encoding of a video
//
// Quality order: width, then height, then bitrate. A single linear scan keeps
// the current best, so among fully equal candidates the earliest one wins.

use std::cmp::Ordering;

use super::errors::DownloadError;
use super::models::FormatDescriptor;

/// Format selector with deterministic quality ordering
pub struct FormatSelector;

impl FormatSelector {
    /// Select the highest-quality format that carries audio
    pub fn select_best<'a, I>(formats: I) -> Result<&'a FormatDescriptor, DownloadError>
    where
        I: IntoIterator<Item = &'a FormatDescriptor>,
    {
        let mut best: Option<&'a FormatDescriptor> = None;

        for format in formats.into_iter().filter(|f| f.has_audio) {
            match best {
                Some(current) if !Self::is_higher_quality(format, current) => {}
                _ => best = Some(format),
            }
        }

        best.ok_or(DownloadError::NoPlayableFormat)
    }

    /// Keep only formats that carry an audio track, preserving order
    pub fn audio_capable(formats: &[FormatDescriptor]) -> Vec<&FormatDescriptor> {
        formats.iter().filter(|f| f.has_audio).collect()
    }

    /// Strict "a beats b" comparison
    pub fn is_higher_quality(a: &FormatDescriptor, b: &FormatDescriptor) -> bool {
        Self::compare(a, b) == Ordering::Greater
    }

    fn compare(a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
        a.width
            .cmp(&b.width)
            .then(a.height.cmp(&b.height))
            .then(a.bitrate.cmp(&b.bitrate))
    }
}
