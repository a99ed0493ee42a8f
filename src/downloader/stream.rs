// Media streams and the auto-closing wrapper
//
// `AutoCloseStream` is read by one task (usually an uploader) while a
// `ReleaseHandle` may be held by another. The underlying resource is only
// released after a read has observed end-of-data: at that moment the reader
// hands the resource over to the handle through a one-shot channel.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::oneshot;
use tokio_util::io::StreamReader;

/// Sequential byte source with an explicit release operation
#[async_trait]
pub trait MediaResource: AsyncRead + Send + Unpin {
    /// Release the underlying connection/handle. Called at most once.
    async fn release(&mut self) -> io::Result<()>;
}

pub type BoxedResource = Box<dyn MediaResource>;

/// Lifecycle of an [`AutoCloseStream`] as seen by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Reads permitted, release waits
    Open,
    /// End-of-data observed, resource handed to the release handle
    Drained,
    /// Resource released through the handle
    Closed,
}

/// Wrapper that defers release of a resource until it has been fully read
pub struct AutoCloseStream {
    inner: Option<BoxedResource>,
    drained_tx: Option<oneshot::Sender<BoxedResource>>,
    closed: Arc<AtomicBool>,
}

/// One-shot handle that releases the resource once the stream is drained
pub struct ReleaseHandle {
    drained_rx: oneshot::Receiver<BoxedResource>,
    closed: Arc<AtomicBool>,
}

impl AutoCloseStream {
    pub fn new(resource: BoxedResource) -> (Self, ReleaseHandle) {
        let (tx, rx) = oneshot::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let stream = Self {
            inner: Some(resource),
            drained_tx: Some(tx),
            closed: closed.clone(),
        };
        let handle = ReleaseHandle {
            drained_rx: rx,
            closed,
        };
        (stream, handle)
    }

    pub fn state(&self) -> StreamState {
        if self.inner.is_some() {
            StreamState::Open
        } else if self.closed.load(Ordering::Acquire) {
            StreamState::Closed
        } else {
            StreamState::Drained
        }
    }

    /// End-of-data has been observed (the resource may already be closed)
    pub fn is_drained(&self) -> bool {
        self.inner.is_none()
    }

    fn mark_drained(&mut self) {
        let Some(resource) = self.inner.take() else {
            return;
        };

        if let Some(tx) = self.drained_tx.take() {
            if tx.send(resource).is_err() {
                // Nobody will release it; dropping closes the resource
                tracing::debug!("release handle dropped before end-of-data");
            }
        }
    }
}

impl AsyncRead for AutoCloseStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        let Some(inner) = this.inner.as_mut() else {
            // Drained: keep reporting end-of-data
            return Poll::Ready(Ok(()));
        };

        let had_room = buf.remaining() > 0;
        let before = buf.filled().len();

        ready!(Pin::new(inner).poll_read(cx, buf))?;

        if had_room && buf.filled().len() == before {
            this.mark_drained();
        }

        Poll::Ready(Ok(()))
    }
}

impl std::fmt::Debug for AutoCloseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoCloseStream")
            .field("state", &self.state())
            .finish()
    }
}

impl std::fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseHandle").finish_non_exhaustive()
    }
}

impl ReleaseHandle {
    /// Wait until the stream has been drained, then release the resource.
    ///
    /// Returns immediately after end-of-data has been observed. If the stream
    /// is dropped before end-of-data the resource is dropped with it and an
    /// `UnexpectedEof` error is returned.
    pub async fn release(self) -> io::Result<()> {
        let mut resource = self.drained_rx.await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "media stream dropped before end of data",
            )
        })?;

        let result = resource.release().await;
        self.closed.store(true, Ordering::Release);
        tracing::debug!(ok = result.is_ok(), "media resource released");
        result
    }
}

/// HTTP response body exposed as a media resource
pub struct HttpMediaResource {
    reader: Option<StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>>,
}

impl HttpMediaResource {
    pub fn new(response: reqwest::Response) -> Self {
        let body: BoxStream<'static, io::Result<Bytes>> = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
        );

        Self {
            reader: Some(StreamReader::new(body)),
        }
    }
}

impl AsyncRead for HttpMediaResource {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut().reader.as_mut() {
            Some(reader) => Pin::new(reader).poll_read(cx, buf),
            None => Poll::Ready(Ok(())),
        }
    }
}

#[async_trait]
impl MediaResource for HttpMediaResource {
    async fn release(&mut self) -> io::Result<()> {
        // Dropping the body stream closes the connection
        self.reader.take();
        Ok(())
    }
}
