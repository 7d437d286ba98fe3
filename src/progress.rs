//! Shared state behind a progress bar.
//!
//! [`Progress`] is the long-lived state of one bar. Like the rest of the crate it
//! splits data by access pattern:
//!
//! * **Hot Data:** the counter, the target and the lifecycle live in atomics, so
//!   producers advancing the bar from tight loops never take a lock.
//! * **Cold Data:** the label sits behind an [`RwLock`](parking_lot::RwLock). It is
//!   written rarely and read once per redraw by the render worker.
//!
//! # Snapshots
//!
//! The render worker reads state through [`Progress::snapshot`], which returns an
//! owned [`ProgressSnapshot`] with the derived ratio and estimate helpers.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};

use compact_str::CompactString;
use parking_lot::RwLock;
use web_time::Instant;

/// A thread-safe, cloneable handle to the state of one bar.
///
/// Cloning is cheap (Arc bump) and every clone observes the same counter, target,
/// label and lifecycle.
#[derive(Clone)]
pub struct Progress {
    /// Captured once at creation.
    pub(crate) start: Instant,

    pub(crate) label: Arc<RwLock<CompactString>>,

    // Atomic fields for wait-free updates on the hot path.
    pub(crate) position: Arc<AtomicU64>,
    pub(crate) target: Arc<AtomicU64>,
    pub(crate) lifecycle: Arc<AtomicU8>,
}

/// Shutdown state machine of a bar.
///
/// Transitions only ever go forward: `Running -> Finishing -> Finished`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "rkyv",
    derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "rkyv", rkyv(derive(Debug, Eq, PartialEq)))]
pub enum Lifecycle {
    /// The render worker is cycling.
    #[default]
    Running = 0,
    /// A finish request won the race; cleanup is in flight.
    Finishing = 1,
    /// The terminal has been restored.
    Finished = 2,
}

impl Lifecycle {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Finishing,
            _ => Self::Finished,
        }
    }
}

impl Progress {
    /// Creates a new state with the counter at zero.
    ///
    /// A `target` of zero puts the bar in indeterminate mode.
    pub fn new(label: impl Into<CompactString>, target: impl Into<u64>) -> Self {
        Self::with_parts(
            label.into(),
            Arc::new(AtomicU64::new(0)),
            target.into(),
            Instant::now(),
        )
    }

    pub(crate) fn with_parts(
        label: CompactString,
        position: Arc<AtomicU64>,
        target: u64,
        start: Instant,
    ) -> Self {
        Self {
            start,
            label: Arc::new(RwLock::new(label)),
            position,
            target: Arc::new(AtomicU64::new(target)),
            lifecycle: Arc::new(AtomicU8::new(Lifecycle::Running as u8)),
        }
    }

    // ========================================================================
    // Label (Cold Path)
    // ========================================================================

    /// Gets the current label.
    #[must_use]
    pub fn label(&self) -> CompactString {
        self.label.read().clone()
    }

    /// Replaces the label. The render worker picks it up on its next cycle.
    pub fn set_label(&self, label: impl Into<CompactString>) {
        *self.label.write() = label.into();
    }

    // ========================================================================
    // Counter & Target (Hot Path)
    // ========================================================================

    /// Adds `amount` to the counter.
    ///
    /// No upper bound is enforced; ratios clamp at 1.0 when the counter passes the target.
    pub fn advance(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
    }

    /// Advances the counter by one.
    pub fn inc(&self) {
        self.advance(1);
    }

    /// Gets the current counter value.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Gets the target (zero means indeterminate).
    #[must_use]
    pub fn target(&self) -> u64 {
        self.target.load(Ordering::Relaxed)
    }

    /// Updates the target.
    pub fn set_target(&self, target: u64) {
        self.target.store(target, Ordering::Relaxed);
    }

    /// Returns `true` when no target is known.
    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        self.target() == 0
    }

    /// Returns a shared reference to the atomic counter.
    #[must_use]
    pub fn atomic_pos(&self) -> Arc<AtomicU64> {
        self.position.clone()
    }

    // ========================================================================
    // Timing & Lifecycle
    // ========================================================================

    /// The instant the bar was created.
    #[must_use]
    pub const fn start(&self) -> Instant {
        self.start
    }

    /// Wall-clock time since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        // Acquire pairs with the Release stores in the transitions below.
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    /// Returns `true` once a finish has been requested.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lifecycle() != Lifecycle::Running
    }

    /// Attempts the `Running -> Finishing` transition.
    ///
    /// Returns `true` for exactly one caller over the life of the state.
    pub(crate) fn begin_finish(&self) -> bool {
        self.lifecycle
            .compare_exchange(
                Lifecycle::Running as u8,
                Lifecycle::Finishing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Records that the terminal has been restored.
    pub(crate) fn mark_finished(&self) {
        self.lifecycle
            .store(Lifecycle::Finished as u8, Ordering::Release);
    }

    /// Creates a consistent snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.into()
    }
}

/// A plain-data snapshot of a [`Progress`] state at a specific point in time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "rkyv",
    derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "rkyv", rkyv(derive(Debug, Eq, PartialEq)))]
pub struct ProgressSnapshot {
    label: CompactString,

    elapsed: Duration,

    position: u64,
    target: u64,

    lifecycle: Lifecycle,
}

impl From<&Progress> for ProgressSnapshot {
    fn from(progress: &Progress) -> Self {
        Self {
            label: progress.label(),
            elapsed: progress.elapsed(),
            position: progress.position(),
            target: progress.target(),
            lifecycle: progress.lifecycle(),
        }
    }
}

impl ProgressSnapshot {
    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the wall-clock time elapsed when the snapshot was taken.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the counter value.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns the target.
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns `true` when no target is known.
    #[must_use]
    pub const fn is_indeterminate(&self) -> bool {
        self.target == 0
    }

    /// Completion ratio in `0.0..=1.0`; `0.0` in indeterminate mode.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        ratio(self.position, self.target)
    }

    /// Estimated time remaining.
    ///
    /// Returns `None` when the target is unknown or the ratio sits on 0 or 1.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        estimates(self.elapsed, self.ratio(), self.target).map(|(_, remaining)| remaining)
    }
}

/// Clamped completion ratio.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(position: u64, target: u64) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (position as f64 / target as f64).min(1.0)
}

/// `(total, remaining)` estimates derived from `elapsed / ratio`.
///
/// The ratio guard, not clamping, keeps the division away from 0 and 1. A total
/// too large for a [`Duration`] yields `None`.
#[allow(clippy::float_cmp)]
pub(crate) fn estimates(elapsed: Duration, ratio: f64, target: u64) -> Option<(Duration, Duration)> {
    if target == 0 || ratio == 0.0 || ratio == 1.0 {
        return None;
    }
    let total = elapsed.as_secs_f64() / ratio;
    let remaining = total * (1.0 - ratio);
    Some((
        Duration::try_from_secs_f64(total).ok()?,
        Duration::try_from_secs_f64(remaining).ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::{Lifecycle, Progress, estimates, ratio};

    /// Basic Lifecycle
    /// Verifies the fundamental state machine: New -> Advance -> Finishing -> Finished.
    #[test]
    fn test_basic_lifecycle() {
        let p = Progress::new("test_job", 100u64);

        assert_eq!(p.position(), 0);
        assert_eq!(p.lifecycle(), Lifecycle::Running);

        p.advance(50);
        p.inc();
        assert_eq!(p.position(), 51);

        assert!(p.begin_finish());
        assert_eq!(p.lifecycle(), Lifecycle::Finishing);
        assert!(p.is_finished());

        p.mark_finished();
        assert_eq!(p.lifecycle(), Lifecycle::Finished);
    }

    /// Concurrency & Atomics
    /// Ensures that high-contention updates from multiple threads are lossless.
    #[test]
    fn test_concurrency_atomics() {
        let p = Progress::new("concurrent_job", 0u64);
        let mut handles = vec![];

        for n in 1..=10u64 {
            let p_ref = p.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    p_ref.advance(n);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        // 100 * (1 + 2 + ... + 10)
        assert_eq!(p.position(), 5500, "Atomic updates should be lossless");
    }

    /// One-Shot Finish
    /// Only one of many racing callers wins the Running -> Finishing transition.
    #[test]
    fn test_begin_finish_once() {
        let p = Progress::new("race", 10u64);
        let winners: usize = (0..8)
            .map(|_| {
                let p = p.clone();
                thread::spawn(move || p.begin_finish())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();

        assert_eq!(winners, 1);
    }

    /// Snapshot Metadata
    /// Verifies that the label propagates to snapshots and snapshots are owned copies.
    #[test]
    fn test_snapshot_metadata() {
        let p = Progress::new("initial", 100u64);
        p.set_label("updated");
        p.advance(10);

        let snap = p.snapshot();
        p.advance(20);

        assert_eq!(snap.label(), "updated");
        assert_eq!(snap.position(), 10, "Old snapshot should remain immutable");
        assert_eq!(p.snapshot().position(), 30);
    }

    /// Ratio & Estimate Guards
    /// Zero targets and saturated ratios never reach the division.
    #[allow(clippy::float_cmp)]
    #[test]
    fn test_math_safety() {
        assert_eq!(ratio(37, 0), 0.0);
        assert_eq!(ratio(150, 100), 1.0);
        assert_eq!(ratio(25, 100), 0.25);

        let ten = Duration::from_secs(10);
        assert!(estimates(ten, 0.0, 100).is_none());
        assert!(estimates(ten, 1.0, 100).is_none());
        assert!(estimates(ten, 0.5, 0).is_none());
        assert!(
            estimates(ten, 1e-30, u64::MAX).is_none(),
            "totals beyond Duration::MAX are unknown, not a panic"
        );

        let (total, remaining) = estimates(ten, 0.25, 100).unwrap();
        assert_eq!(total, Duration::from_secs(40));
        assert_eq!(remaining, Duration::from_secs(30));

        let p = Progress::new("zero_target", 0u64);
        p.advance(37);
        let snap = p.snapshot();
        assert!(snap.is_indeterminate());
        assert!(snap.eta().is_none());
    }
}
