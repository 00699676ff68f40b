//! Leaf progress reporters.
//!
//! Reporters are cheap cloneable handles into their owning monitor's slot
//! table. A command keeps one handle and moves clones into collaborator
//! callbacks; every clone feeds the same slot.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::monitor::{MonitorInner, shared_publish};

/// Reports fractional progress of one general sub-operation.
///
/// Values are in [0, 1] and monotonically non-decreasing over the reporter's
/// lifetime; lower or repeated values are ignored. Created by
/// [`StatusMonitor::create_general_status_reporter`](super::StatusMonitor::create_general_status_reporter).
#[derive(Clone)]
pub struct GeneralStatusReporter {
    inner: Arc<Mutex<MonitorInner>>,
    index: usize,
}

impl GeneralStatusReporter {
    /// Reports the sub-operation's fraction complete.
    ///
    /// Out-of-range values are clamped; regressions are ignored. Every
    /// accepted update recomputes and republishes the overall status.
    pub fn report(&self, progress: f64) {
        shared_publish(&self.inner, |inner| inner.apply_progress(self.index, progress));
    }

    /// The most recently accepted fraction.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.inner.lock().map(|inner| inner.slot_progress(self.index)).unwrap_or(0.0)
    }
}

/// Reports byte-level progress of one download.
///
/// Beyond the fraction (derived as `downloaded / total`), the reporter feeds
/// byte counters and a smoothed transfer rate into the monitor's aggregated
/// [`DownloadStatus`](super::DownloadStatus).
#[derive(Clone)]
pub struct DownloadStatusReporter {
    inner: Arc<Mutex<MonitorInner>>,
    index: usize,
    rate: Arc<Mutex<RateTracker>>,
}

impl DownloadStatusReporter {
    /// Reports the download's byte counters.
    ///
    /// When `total_bytes` is zero the fraction cannot be derived and only
    /// the byte counters are forwarded.
    pub fn report_bytes(&self, downloaded_bytes: u64, total_bytes: u64) {
        let bytes_per_second = self
            .rate
            .lock()
            .map(|mut tracker| tracker.sample(downloaded_bytes))
            .unwrap_or(0.0);
        shared_publish(&self.inner, |inner| {
            inner.apply_download(self.index, downloaded_bytes, total_bytes, bytes_per_second)
        });
    }

    /// The most recently derived fraction.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.inner.lock().map(|inner| inner.slot_progress(self.index)).unwrap_or(0.0)
    }
}

/// Exponentially smoothed transfer rate from successive byte counters.
struct RateTracker {
    last: Option<(Instant, u64)>,
    smoothed: f64,
}

impl RateTracker {
    const ALPHA: f64 = 0.3;
    const MIN_INTERVAL_SECS: f64 = 0.05;

    fn new() -> Self {
        Self { last: None, smoothed: 0.0 }
    }

    fn sample(&mut self, downloaded_bytes: u64) -> f64 {
        let now = Instant::now();
        match self.last {
            None => {
                self.last = Some((now, downloaded_bytes));
            }
            Some((at, bytes)) => {
                let elapsed = now.duration_since(at).as_secs_f64();
                if elapsed >= Self::MIN_INTERVAL_SECS && downloaded_bytes >= bytes {
                    let sample = (downloaded_bytes - bytes) as f64 / elapsed;
                    self.smoothed = if self.smoothed == 0.0 {
                        sample
                    } else {
                        self.smoothed * (1.0 - Self::ALPHA) + sample * Self::ALPHA
                    };
                    self.last = Some((now, downloaded_bytes));
                }
            }
        }
        self.smoothed
    }
}

pub(super) fn general(inner: Arc<Mutex<MonitorInner>>, index: usize) -> GeneralStatusReporter {
    GeneralStatusReporter { inner, index }
}

pub(super) fn download(inner: Arc<Mutex<MonitorInner>>, index: usize) -> DownloadStatusReporter {
    DownloadStatusReporter { inner, index, rate: Arc::new(Mutex::new(RateTracker::new())) }
}
