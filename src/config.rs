//! Per-bar configuration.
//!
//! Every knob that shapes a bar's output lives in [`BarConfig`], passed at
//! construction through [`ProgressBuilder::with_config`](crate::ProgressBuilder::with_config).
//! Nothing is global, so two bars in one process may be configured differently.

use std::time::Duration;

use compact_str::CompactString;

use crate::readout::Readout;

/// Explicit configuration for one bar.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BarConfig {
    /// Text placed between segments.
    pub separator: CompactString,
    /// Redraw cadence of the render worker.
    pub tick_interval: Duration,
    /// Bar cells below which the bar refuses to shrink further.
    pub min_bar_width: usize,
    /// Emit color escapes.
    pub color_enabled: bool,
    /// Paint the label inside the bar instead of as its own segment.
    pub label_overlay: bool,
    /// Keep the final frame on screen at shutdown (otherwise it is erased).
    pub leave_on_finish: bool,
    /// Columns held back from the terminal width.
    pub margin: usize,
    /// Minimum span of the rolling window behind the current-rate readout.
    pub rate_window: Duration,
    /// Readouts to compose, in emission order.
    pub readouts: Vec<Readout>,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            separator: CompactString::const_new(" "),
            tick_interval: Duration::from_millis(50),
            min_bar_width: 5,
            color_enabled: std::env::var_os("NO_COLOR").is_none(),
            label_overlay: true,
            leave_on_finish: true,
            margin: 1,
            rate_window: Duration::from_millis(500),
            readouts: Readout::DEFAULT.to_vec(),
        }
    }
}

impl BarConfig {
    /// Sets the text placed between segments.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<CompactString>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the redraw cadence (clamped to at least one millisecond).
    #[must_use]
    pub fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick.max(Duration::from_millis(1));
        self
    }

    /// Sets the floor of bar cells (at least one).
    #[must_use]
    pub fn with_min_bar_width(mut self, cells: usize) -> Self {
        self.min_bar_width = cells.max(1);
        self
    }

    /// Turns color escapes on or off.
    #[must_use]
    pub const fn with_color(mut self, enabled: bool) -> Self {
        self.color_enabled = enabled;
        self
    }

    /// Chooses between painting the label inside the bar or beside it.
    #[must_use]
    pub const fn with_label_overlay(mut self, overlay: bool) -> Self {
        self.label_overlay = overlay;
        self
    }

    /// Keeps (`true`) or erases (`false`) the final frame at shutdown.
    #[must_use]
    pub const fn with_leave_on_finish(mut self, leave: bool) -> Self {
        self.leave_on_finish = leave;
        self
    }

    /// Sets the columns held back from the terminal width.
    #[must_use]
    pub const fn with_margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }

    /// Sets the minimum span of the current-rate window.
    #[must_use]
    pub const fn with_rate_window(mut self, window: Duration) -> Self {
        self.rate_window = window;
        self
    }

    /// Chooses the readouts and their emission order.
    #[must_use]
    pub fn with_readouts(mut self, readouts: impl Into<Vec<Readout>>) -> Self {
        self.readouts = readouts.into();
        self
    }
}
