//! Per-upload state shared between the running upload and its observers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio_util::sync::CancellationToken;

/// Where an upload is in the presign → PUT → confirm sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UploadStage {
    Idle = 0,
    Presigning = 1,
    Uploading = 2,
    Confirming = 3,
    Done = 4,
    Failed = 5,
}

impl UploadStage {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => UploadStage::Presigning,
            2 => UploadStage::Uploading,
            3 => UploadStage::Confirming,
            4 => UploadStage::Done,
            5 => UploadStage::Failed,
            _ => UploadStage::Idle,
        }
    }
}

/// Callback receiving integer upload percentages (0-100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Observe or abort one upload. Cheap to clone; every clone controls the
/// same upload.
#[derive(Debug, Clone, Default)]
pub struct UploadHandle {
    cancel: CancellationToken,
    progress: Arc<AtomicU8>,
    stage: Arc<AtomicU8>,
}

impl UploadHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before confirm is issued; after
    /// that the upload completes regardless.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Latest reported percentage.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn stage(&self) -> UploadStage {
        UploadStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    pub(crate) fn set_stage(&self, stage: UploadStage) {
        self.stage.store(stage as u8, Ordering::Release);
    }

    pub(crate) fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

/// Turns byte counts into percentages for an [`ObjectStore`](super::ObjectStore).
///
/// Nothing is reported while the total is unknown or zero. Repeated equal
/// percentages are reported once.
#[derive(Clone)]
pub struct ProgressSink {
    progress: Arc<AtomicU8>,
    last: Arc<AtomicU8>,
    callback: Option<ProgressFn>,
}

const NOTHING_REPORTED: u8 = u8::MAX;

impl ProgressSink {
    pub(crate) fn new(handle: &UploadHandle, callback: Option<ProgressFn>) -> Self {
        Self {
            progress: Arc::clone(&handle.progress),
            last: Arc::new(AtomicU8::new(NOTHING_REPORTED)),
            callback,
        }
    }

    /// Record that `sent` of `total` bytes have gone out.
    pub fn report(&self, sent: u64, total: Option<u64>) {
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let percent = ((sent as f64 / total as f64) * 100.0).round().min(100.0) as u8;
        self.progress.store(percent, Ordering::Relaxed);
        if self.last.swap(percent, Ordering::AcqRel) == percent {
            return;
        }
        if let Some(callback) = &self.callback {
            callback(percent);
        }
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("progress", &self.progress)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_sink(handle: &UploadHandle) -> (ProgressSink, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = ProgressSink::new(
            handle,
            Some(Arc::new(move |p: u8| sink_seen.lock().unwrap().push(p))),
        );
        (sink, seen)
    }

    #[test]
    fn percentages_are_rounded_integers() {
        let handle = UploadHandle::new();
        let (sink, seen) = recording_sink(&handle);

        sink.report(0, Some(3));
        sink.report(1, Some(3));
        sink.report(2, Some(3));
        sink.report(3, Some(3));

        assert_eq!(*seen.lock().unwrap(), vec![0, 33, 67, 100]);
        assert_eq!(handle.progress(), 100);
    }

    #[test]
    fn unknown_or_zero_total_reports_nothing() {
        let handle = UploadHandle::new();
        let (sink, seen) = recording_sink(&handle);

        sink.report(10, None);
        sink.report(10, Some(0));

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(handle.progress(), 0);
    }

    #[test]
    fn duplicates_suppressed_and_capped() {
        let handle = UploadHandle::new();
        let (sink, seen) = recording_sink(&handle);

        sink.report(1, Some(1000));
        sink.report(2, Some(1000));
        sink.report(2000, Some(1000));

        assert_eq!(*seen.lock().unwrap(), vec![0, 100]);
    }

    #[test]
    fn handle_clones_share_state() {
        let handle = UploadHandle::new();
        let observer = handle.clone();
        assert_eq!(observer.stage(), UploadStage::Idle);

        handle.set_stage(UploadStage::Uploading);
        handle.abort();

        assert_eq!(observer.stage(), UploadStage::Uploading);
        assert!(observer.is_aborted());
    }
}
