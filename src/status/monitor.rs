//! Aggregation of weighted progress into one overall status stream.
//!
//! A [`StatusMonitor`] owns the set of reporter slots created during a
//! session's Prepare phase and recomputes the overall value whenever any
//! reporter updates. Updates, aggregation and observer notification all
//! happen under a single lock, so observers always see a value consistent
//! with the latest state of every reporter, regardless of which thread a
//! collaborator reports from.
//!
//! Observer callbacks run while that lock is held and must not call back
//! into the monitor or its reporters.

use std::sync::{Arc, Mutex, Weak};
use tracing::trace;

/// Byte-level progress of the download portion of a session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DownloadStatus {
    /// Bytes received so far, summed over all download reporters.
    pub downloaded_bytes: u64,
    /// Total bytes expected, summed over all download reporters.
    pub total_bytes: u64,
    /// Smoothed transfer rate in bytes per second.
    pub bytes_per_second: f64,
}

/// A snapshot of the session's aggregated progress.
///
/// `progress` is the weighted mean of every reporter's fraction, clamped to
/// [0, 1]; it is 0 while the total weight is zero. `download` is present once
/// any download reporter has been registered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallStatus {
    /// Overall progress in [0, 1].
    pub progress: f64,
    /// Aggregated download counters, when the session downloads anything.
    pub download: Option<DownloadStatus>,
}

pub(super) struct DownloadCounters {
    pub(super) downloaded_bytes: u64,
    pub(super) total_bytes: u64,
    pub(super) bytes_per_second: f64,
}

pub(super) struct ReporterSlot {
    pub(super) weight: f64,
    pub(super) progress: f64,
    pub(super) download: Option<DownloadCounters>,
}

type ObserverFn = Box<dyn FnMut(&OverallStatus) + Send>;

#[derive(Default)]
pub(super) struct MonitorInner {
    slots: Vec<ReporterSlot>,
    observers: Vec<(u64, ObserverFn)>,
    next_observer_id: u64,
}

impl MonitorInner {
    fn register_slot(&mut self, weight: f64, download: bool) -> usize {
        self.slots.push(ReporterSlot {
            weight,
            progress: 0.0,
            download: download.then(|| DownloadCounters {
                downloaded_bytes: 0,
                total_bytes: 0,
                bytes_per_second: 0.0,
            }),
        });
        self.slots.len() - 1
    }

    /// Applies a fractional progress update to one slot.
    ///
    /// Values are clamped to [0, 1]; a value at or below the slot's current
    /// progress is ignored, which keeps each reporter monotonically
    /// non-decreasing over its lifetime. Returns whether anything changed.
    pub(super) fn apply_progress(&mut self, index: usize, value: f64) -> bool {
        let slot = &mut self.slots[index];
        let clamped = value.clamp(0.0, 1.0);
        if clamped <= slot.progress {
            if clamped < slot.progress {
                trace!(
                    reporter = index,
                    current = slot.progress,
                    reported = clamped,
                    "ignoring progress regression"
                );
            }
            return false;
        }
        slot.progress = clamped;
        true
    }

    pub(super) fn apply_download(
        &mut self,
        index: usize,
        downloaded_bytes: u64,
        total_bytes: u64,
        bytes_per_second: f64,
    ) -> bool {
        let progressed = if total_bytes > 0 {
            self.apply_progress(index, downloaded_bytes as f64 / total_bytes as f64)
        } else {
            false
        };
        let slot = &mut self.slots[index];
        let Some(counters) = slot.download.as_mut() else {
            return progressed;
        };
        let counted = downloaded_bytes != counters.downloaded_bytes
            || total_bytes != counters.total_bytes;
        counters.downloaded_bytes = downloaded_bytes;
        counters.total_bytes = total_bytes;
        counters.bytes_per_second = bytes_per_second;
        progressed || counted
    }

    pub(super) fn slot_progress(&self, index: usize) -> f64 {
        self.slots[index].progress
    }

    pub(super) fn status(&self) -> OverallStatus {
        let total_weight: f64 = self.slots.iter().map(|s| s.weight).sum();
        let progress = if total_weight > 0.0 {
            let weighted: f64 = self.slots.iter().map(|s| s.progress * s.weight).sum();
            (weighted / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut download = None;
        for counters in self.slots.iter().filter_map(|s| s.download.as_ref()) {
            let agg = download.get_or_insert(DownloadStatus::default());
            agg.downloaded_bytes += counters.downloaded_bytes;
            agg.total_bytes += counters.total_bytes;
            agg.bytes_per_second += counters.bytes_per_second;
        }

        OverallStatus { progress, download }
    }

    /// Recomputes the overall status and delivers it to every observer.
    ///
    /// Runs under the monitor lock, giving observers a totally ordered view
    /// of status changes.
    pub(super) fn publish(&mut self) {
        let status = self.status();
        for (_, observer) in &mut self.observers {
            observer(&status);
        }
    }
}

/// Aggregates weighted reporter progress and republishes it to subscribers.
///
/// One monitor lives for one update session. Commands register their
/// reporters against it during Prepare via
/// [`create_general_status_reporter`](Self::create_general_status_reporter)
/// and [`create_download_status_reporter`](Self::create_download_status_reporter);
/// registering further reporters after Execute has begun is unsupported.
///
/// # Examples
///
/// ```rust
/// use patchup::status::StatusMonitor;
///
/// let monitor = StatusMonitor::new();
/// let copy = monitor.create_general_status_reporter(3.0);
/// let unarchive = monitor.create_general_status_reporter(1.0);
///
/// unarchive.report(1.0);
/// copy.report(0.5);
/// // (0.5 * 3 + 1.0 * 1) / 4
/// assert!((monitor.overall_status().progress - 0.625).abs() < 1e-9);
/// ```
#[derive(Clone, Default)]
pub struct StatusMonitor {
    inner: Arc<Mutex<MonitorInner>>,
}

impl StatusMonitor {
    /// Creates an empty monitor with no reporters and no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh general-purpose reporter with the given weight.
    ///
    /// # Panics
    ///
    /// Panics if `weight` is negative or not finite. Zero weight is legal:
    /// the operation is tracked but never moves the overall value.
    #[must_use]
    pub fn create_general_status_reporter(&self, weight: f64) -> super::GeneralStatusReporter {
        let index = self.register(weight, false);
        super::reporter::general(Arc::clone(&self.inner), index)
    }

    /// Registers a fresh download reporter with the given weight.
    ///
    /// Download reporters surface byte counters and a transfer rate alongside
    /// the fractional value; their aggregation contract is otherwise
    /// identical to general reporters.
    ///
    /// # Panics
    ///
    /// Panics if `weight` is negative or not finite.
    #[must_use]
    pub fn create_download_status_reporter(&self, weight: f64) -> super::DownloadStatusReporter {
        let index = self.register(weight, true);
        super::reporter::download(Arc::clone(&self.inner), index)
    }

    fn register(&self, weight: f64, download: bool) -> usize {
        assert!(weight.is_finite() && weight >= 0.0, "reporter weight must be non-negative");
        let mut inner = self.inner.lock().expect("status monitor lock");
        inner.register_slot(weight, download)
    }

    /// Subscribes to overall status changes.
    ///
    /// The callback runs synchronously under the monitor lock on every
    /// reporter update and must not call back into the monitor. Dropping the
    /// returned subscription unsubscribes.
    #[must_use]
    pub fn subscribe(
        &self,
        observer: impl FnMut(&OverallStatus) + Send + 'static,
    ) -> StatusSubscription {
        let mut inner = self.inner.lock().expect("status monitor lock");
        let id = inner.next_observer_id;
        inner.next_observer_id += 1;
        inner.observers.push((id, Box::new(observer)));
        StatusSubscription { id, inner: Arc::downgrade(&self.inner) }
    }

    /// A snapshot of the current aggregated status.
    #[must_use]
    pub fn overall_status(&self) -> OverallStatus {
        self.inner.lock().map(|inner| inner.status()).unwrap_or_default()
    }
}

/// RAII handle for a status subscription.
///
/// The observer registered through [`StatusMonitor::subscribe`] is removed
/// when this handle is dropped, scoping subscriptions to their owner's
/// lifetime instead of a global registry.
pub struct StatusSubscription {
    id: u64,
    inner: Weak<Mutex<MonitorInner>>,
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade()
            && let Ok(mut inner) = inner.lock()
        {
            inner.observers.retain(|(id, _)| *id != self.id);
        }
    }
}

pub(super) fn shared_publish(inner: &Arc<Mutex<MonitorInner>>, update: impl FnOnce(&mut MonitorInner) -> bool) {
    if let Ok(mut inner) = inner.lock()
        && update(&mut inner)
    {
        inner.publish();
    }
}
