//! Per-cycle sampling of bar state.
//!
//! The render worker owns one [`Sampler`]. Each cycle it turns the live
//! [`Progress`] into a [`Sample`]: an owned, immutable view that every formatter
//! reads from. Two clocks are tracked:
//!
//! * **Settled time:** the instant the counter was last seen changing. Averages and
//!   estimates divide by this, so a stalled counter freezes them instead of letting
//!   them drift.
//! * **Rate window:** a rolling window re-anchored only after `rate_window` has
//!   passed, which keeps the current-rate readout away from near-zero intervals.

use std::time::Duration;

use compact_str::CompactString;
use web_time::Instant;

use crate::progress::{self, Progress};

/// Delta observed over the last closed rate window.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RateWindow {
    /// Span of the window.
    pub span: Duration,
    /// Counter increase across the window.
    pub delta: u64,
}

impl RateWindow {
    /// Items per second, or `None` when the window is empty.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        let secs = self.span.as_secs_f64();
        (self.delta > 0 && secs > 0.0).then(|| self.delta as f64 / secs)
    }
}

/// Everything a formatter may look at for one redraw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sample {
    /// Label at sampling time.
    pub label: CompactString,
    /// Counter value.
    pub position: u64,
    /// Target (zero: indeterminate).
    pub target: u64,
    /// Wall-clock time since start.
    pub elapsed: Duration,
    /// Start to the last observed counter change.
    pub settled: Duration,
    /// Most recent closed rate window.
    pub window: RateWindow,
}

impl Sample {
    /// Returns `true` when no target is known.
    #[must_use]
    pub const fn is_indeterminate(&self) -> bool {
        self.target == 0
    }

    /// Completion ratio clamped to `0.0..=1.0`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        progress::ratio(self.position, self.target)
    }

    /// Returns `true` when the ratio sits exactly on 0 or 1.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        let ratio = self.ratio();
        ratio == 0.0 || ratio == 1.0
    }

    /// Average items per second over the settled time.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn average_rate(&self) -> Option<f64> {
        let secs = self.settled.as_secs_f64();
        (self.position > 0 && secs > 0.0).then(|| self.position as f64 / secs)
    }

    /// `(total, remaining)` estimates; `None` in indeterminate mode or at ratio 0 or 1.
    #[must_use]
    pub fn estimates(&self) -> Option<(Duration, Duration)> {
        progress::estimates(self.settled, self.ratio(), self.target)
    }
}

/// Turns live state into [`Sample`]s, carrying the clocks between cycles.
#[derive(Debug)]
pub struct Sampler {
    start: Instant,
    window: Duration,

    last_position: u64,
    last_change: Instant,

    anchor_position: u64,
    anchor_time: Instant,
    closed: RateWindow,
}

impl Sampler {
    /// Creates a sampler anchored at `start`.
    #[must_use]
    pub const fn new(start: Instant, window: Duration) -> Self {
        Self {
            start,
            window,
            last_position: 0,
            last_change: start,
            anchor_position: 0,
            anchor_time: start,
            closed: RateWindow {
                span: Duration::ZERO,
                delta: 0,
            },
        }
    }

    /// Samples `progress` as of `now`.
    pub fn observe(&mut self, progress: &Progress, now: Instant) -> Sample {
        self.record(
            progress.label(),
            progress.position(),
            progress.target(),
            now,
        )
    }

    pub(crate) fn record(
        &mut self,
        label: CompactString,
        position: u64,
        target: u64,
        now: Instant,
    ) -> Sample {
        if position != self.last_position {
            self.last_position = position;
            self.last_change = now;
        }

        let since_anchor = now.saturating_duration_since(self.anchor_time);
        if since_anchor > self.window {
            self.closed = RateWindow {
                span: since_anchor,
                delta: position.saturating_sub(self.anchor_position),
            };
            self.anchor_position = position;
            self.anchor_time = now;
        }

        Sample {
            label,
            position,
            target,
            elapsed: now.saturating_duration_since(self.start),
            settled: self.last_change.saturating_duration_since(self.start),
            window: self.closed,
        }
    }
}
