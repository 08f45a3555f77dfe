//! Progress reporting
//!
//! Two halves: the [`ProgressSink`] implementations a job task hands to the
//! provider's fetch loop, and the [`ProgressPublisher`] that exposes a job's
//! status to subscribers as a terminating stream of snapshots.

use crate::provider::ProgressSink;
use crate::store::JobStore;
use crate::types::{Event, JobId, JobStatus};
use futures::Stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

/// Compute a whole percentage from transferred bytes, when the total is known
fn percent_of(bytes_transferred: u64, total_bytes: Option<u64>) -> Option<u8> {
    let total = total_bytes.filter(|t| *t > 0)?;
    Some((bytes_transferred.saturating_mul(100) / total).min(100) as u8)
}

/// Writes de-duplicated percentages into the store and mirrors them as events
struct StoreForwarder {
    id: JobId,
    store: JobStore,
    event_tx: broadcast::Sender<Event>,
    last: AtomicU8,
}

impl StoreForwarder {
    fn new(id: JobId, store: JobStore, event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            id,
            store,
            event_tx,
            last: AtomicU8::new(0),
        }
    }

    fn forward(&self, percent: u8) {
        if self.last.swap(percent, Ordering::Relaxed) == percent {
            return;
        }
        if self
            .store
            .update(&self.id, JobStatus::InProgress { percent })
        {
            // send() errs only when nobody subscribes, which is fine
            self.event_tx
                .send(Event::Progress {
                    id: self.id.clone(),
                    percent,
                })
                .ok();
        }
    }
}

/// Progress sink for a single-stream (no-merge) fetch
///
/// Converts byte counts into a percentage and forwards it to the job store.
/// Chunks with an unknown total are ignored; the terminal transition still
/// lands via the job task.
pub struct JobProgressSink {
    forwarder: StoreForwarder,
}

impl JobProgressSink {
    /// Create a sink updating `id` in `store`
    pub fn new(id: JobId, store: JobStore, event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            forwarder: StoreForwarder::new(id, store, event_tx),
        }
    }
}

impl ProgressSink for JobProgressSink {
    fn report(&self, bytes_transferred: u64, total_bytes: Option<u64>) {
        if let Some(percent) = percent_of(bytes_transferred, total_bytes) {
            self.forwarder.forward(percent);
        }
    }
}

/// Which elementary stream a mux-path sink feeds
#[derive(Clone, Copy, Debug)]
enum StreamLeg {
    Video,
    Audio,
}

/// Shared progress state for a merge-path job
///
/// The two concurrent fetches each own a [`MuxStreamSink`]; the combined
/// percentage reported to the store is the minimum of the two legs. Both
/// legs are monotonic, so the minimum is too, and the job never appears
/// further along than its slowest stream.
pub struct MuxProgress {
    video: AtomicU8,
    audio: AtomicU8,
    forwarder: StoreForwarder,
}

impl MuxProgress {
    /// Create shared progress state for job `id`
    pub fn new(id: JobId, store: JobStore, event_tx: broadcast::Sender<Event>) -> Arc<Self> {
        Arc::new(Self {
            video: AtomicU8::new(0),
            audio: AtomicU8::new(0),
            forwarder: StoreForwarder::new(id, store, event_tx),
        })
    }

    /// Sink feeding the video leg
    pub fn video_sink(self: &Arc<Self>) -> MuxStreamSink {
        MuxStreamSink {
            leg: StreamLeg::Video,
            progress: Arc::clone(self),
        }
    }

    /// Sink feeding the audio leg
    pub fn audio_sink(self: &Arc<Self>) -> MuxStreamSink {
        MuxStreamSink {
            leg: StreamLeg::Audio,
            progress: Arc::clone(self),
        }
    }

    fn report_leg(&self, leg: StreamLeg, percent: u8) {
        match leg {
            StreamLeg::Video => self.video.store(percent, Ordering::Relaxed),
            StreamLeg::Audio => self.audio.store(percent, Ordering::Relaxed),
        }
        let combined = self
            .video
            .load(Ordering::Relaxed)
            .min(self.audio.load(Ordering::Relaxed));
        self.forwarder.forward(combined);
    }
}

/// Per-stream progress sink over a shared [`MuxProgress`]
pub struct MuxStreamSink {
    leg: StreamLeg,
    progress: Arc<MuxProgress>,
}

impl ProgressSink for MuxStreamSink {
    fn report(&self, bytes_transferred: u64, total_bytes: Option<u64>) {
        if let Some(percent) = percent_of(bytes_transferred, total_bytes) {
            self.progress.report_leg(self.leg, percent);
        }
    }
}

/// Exposes a job's live status as a terminating stream of snapshots
///
/// Each subscription polls the store on the configured interval, emits the
/// current snapshot immediately, suppresses duplicates, and ends after
/// exactly one terminal element. A fresh subscriber starts from the current
/// state, not from job history.
#[derive(Clone)]
pub struct ProgressPublisher {
    store: JobStore,
    poll_interval: Duration,
}

/// Internal subscription state for the unfold loop
enum PollState {
    Watching(Option<JobStatus>),
    Finished,
}

impl ProgressPublisher {
    /// Create a publisher over `store`
    pub fn new(store: JobStore, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    /// Subscribe to status snapshots for `id`
    ///
    /// The stream ends after the terminal snapshot, or immediately if the
    /// job is unknown (callers wanting a 404 check the store first). A job
    /// removed mid-subscription also ends the stream.
    pub fn subscribe(&self, id: JobId) -> impl Stream<Item = JobStatus> + Send + 'static {
        let store = self.store.clone();
        let poll_interval = self.poll_interval;

        futures::stream::unfold(PollState::Watching(None), move |state| {
            let store = store.clone();
            let id = id.clone();
            async move {
                let last = match state {
                    PollState::Finished => return None,
                    PollState::Watching(last) => last,
                };
                loop {
                    let Some(status) = store.status(&id) else {
                        return None;
                    };
                    if last.as_ref() != Some(&status) {
                        let next = if status.is_terminal() {
                            PollState::Finished
                        } else {
                            PollState::Watching(Some(status.clone()))
                        };
                        return Some((status, next));
                    }
                    tokio::time::sleep(poll_interval).await;
                }
            }
        })
    }
}
