// Test doubles: in-memory media and a scripted provider

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};

use super::errors::ProviderError;
use super::models::{FormatDescriptor, PlaylistId, VideoId, VideoMetadata};
use super::stream::{BoxedResource, MediaResource};
use super::traits::VideoProvider;

/// Shared flag flipped when a [`MemoryResource`] is released
#[derive(Debug, Clone, Default)]
pub struct ReleaseFlag(Arc<AtomicBool>);

impl ReleaseFlag {
    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct MemoryResource {
    data: Cursor<Vec<u8>>,
    released: ReleaseFlag,
}

impl MemoryResource {
    pub fn new(data: Vec<u8>) -> (Self, ReleaseFlag) {
        let released = ReleaseFlag::default();
        let resource = Self {
            data: Cursor::new(data),
            released: released.clone(),
        };
        (resource, released)
    }
}

impl AsyncRead for MemoryResource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().data).poll_read(cx, buf)
    }
}

#[async_trait]
impl MediaResource for MemoryResource {
    async fn release(&mut self) -> io::Result<()> {
        self.released.0.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn format(
    id: &str,
    width: u32,
    height: u32,
    bitrate: u64,
    mime_type: &str,
    has_audio: bool,
) -> FormatDescriptor {
    FormatDescriptor {
        format_id: id.to_string(),
        width,
        height,
        bitrate,
        mime_type: mime_type.to_string(),
        has_audio,
        url: None,
        http_headers: Default::default(),
    }
}

pub fn metadata(id: &str, title: &str, formats: Vec<FormatDescriptor>) -> VideoMetadata {
    VideoMetadata {
        id: VideoId::new(id),
        title: title.to_string(),
        formats,
    }
}

/// Provider answering from fixed tables, recording every call
#[derive(Default)]
pub struct FakeProvider {
    videos: HashMap<VideoId, Result<VideoMetadata, ProviderError>>,
    playlists: HashMap<PlaylistId, Result<Vec<VideoId>, ProviderError>>,
    open_failures: HashMap<VideoId, ProviderError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    released: Mutex<Vec<ReleaseFlag>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, metadata: VideoMetadata) -> Self {
        self.videos.insert(metadata.id.clone(), Ok(metadata));
        self
    }

    pub fn with_video_error(mut self, id: &str, error: ProviderError) -> Self {
        self.videos.insert(VideoId::new(id), Err(error));
        self
    }

    pub fn with_open_failure(mut self, id: &str, error: ProviderError) -> Self {
        self.open_failures.insert(VideoId::new(id), error);
        self
    }

    pub fn with_playlist(mut self, id: &str, members: &[&str]) -> Self {
        let members = members.iter().map(|m| VideoId::new(*m)).collect();
        self.playlists.insert(PlaylistId::new(id), Ok(members));
        self
    }

    pub fn with_playlist_error(mut self, id: &str, error: ProviderError) -> Self {
        self.playlists.insert(PlaylistId::new(id), Err(error));
        self
    }

    /// Delay every upstream call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that ran to completion (not dropped mid-flight)
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn release_flags(&self) -> Vec<ReleaseFlag> {
        self.released.lock().unwrap().clone()
    }

    async fn enter(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self, call: String) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VideoProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn get_metadata(&self, id: &VideoId) -> Result<VideoMetadata, ProviderError> {
        let call = format!("metadata:{}", id);
        self.enter(&call).await;
        let result = self
            .videos
            .get(id)
            .cloned()
            .unwrap_or_else(|| {
                Err(ProviderError::Unknown(format!("Video unavailable: {}", id)))
            });
        self.leave(call);
        result
    }

    async fn open_stream(
        &self,
        metadata: &VideoMetadata,
        format: &FormatDescriptor,
    ) -> Result<BoxedResource, ProviderError> {
        let call = format!("open:{}:{}", metadata.id, format.format_id);
        self.enter(&call).await;
        let result = match self.open_failures.get(&metadata.id) {
            Some(error) => Err(error.clone()),
            None => {
                let body = format!("{}:{}", metadata.id, format.format_id).into_bytes();
                let (resource, flag) = MemoryResource::new(body);
                self.released.lock().unwrap().push(flag);
                Ok(Box::new(resource) as BoxedResource)
            }
        };
        self.leave(call);
        result
    }

    async fn get_playlist_members(&self, id: &PlaylistId) -> Result<Vec<VideoId>, ProviderError> {
        let call = format!("playlist:{}", id);
        self.enter(&call).await;
        let result = self
            .playlists
            .get(id)
            .cloned()
            .unwrap_or_else(|| {
                Err(ProviderError::Unknown(format!("Playlist unavailable: {}", id)))
            });
        self.leave(call);
        result
    }
}
