// Playlist fan-out - one background task, one fetch in flight, ordered output
//
// The producer reserves a slot in a capacity-1 channel before every fetch, so
// it never starts the next video until the consumer has taken the previous
// outcome.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::errors::DownloadError;
use super::fetcher::MediaFetcher;
use super::models::{DownloadOutcome, PlaylistId};

/// Ordered, consumer-paced sequence of outcomes for one playlist
pub struct PlaylistDownload {
    rx: mpsc::Receiver<DownloadOutcome>,
    task: JoinHandle<()>,
}

impl PlaylistDownload {
    /// Next outcome, or `None` once the playlist is exhausted or cancelled
    pub async fn next(&mut self) -> Option<DownloadOutcome> {
        self.rx.recv().await
    }

    /// Whether the producer task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// Dropping the sequence stops any in-flight fetch (and kills its child process)
impl Drop for PlaylistDownload {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for PlaylistDownload {
    type Item = DownloadOutcome;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for PlaylistDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistDownload")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

/// Start downloading every member of a playlist in order.
///
/// Must be called from within a tokio runtime.
pub fn download_playlist(
    fetcher: MediaFetcher,
    id: PlaylistId,
    cancel: CancellationToken,
) -> PlaylistDownload {
    let (tx, rx) = mpsc::channel(1);
    let task = tokio::spawn(produce(fetcher, id, cancel, tx));
    PlaylistDownload { rx, task }
}

async fn produce(
    fetcher: MediaFetcher,
    id: PlaylistId,
    cancel: CancellationToken,
    tx: mpsc::Sender<DownloadOutcome>,
) {
    let members = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(playlist_id = %id, "cancelled before playlist resolution");
            return;
        }
        res = fetcher.provider().get_playlist_members(&id) => res,
    };

    let members = match members {
        Ok(members) => members,
        Err(e) => {
            warn!(playlist_id = %id, error = %e, "playlist resolution failed");
            let _ = tx.send(Err(DownloadError::PlaylistResolution(e))).await;
            return;
        }
    };

    info!(playlist_id = %id, count = members.len(), "playlist resolved");

    for (index, video_id) in members.iter().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    debug!(playlist_id = %id, "consumer dropped, stopping");
                    return;
                }
            },
        };

        let outcome = fetcher.fetch(video_id, &cancel).await;
        if cancel.is_cancelled() {
            break;
        }

        if let Err(e) = &outcome {
            warn!(
                playlist_id = %id,
                video_id = %video_id,
                position = index,
                error = %e,
                "playlist item failed"
            );
        }
        permit.send(outcome);
    }

    if cancel.is_cancelled() {
        debug!(playlist_id = %id, "playlist download cancelled");
    }
}
