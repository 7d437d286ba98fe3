//! Readouts and the formatters that render them.
//!
//! Every formatter is a pure function of a [`Sample`] returning one [`Segment`].
//! A formatter that does not apply this cycle (a percentage without a target, an
//! estimate at ratio 0) returns a hidden segment instead of failing.
//!
//! | Readout | Priority | Align |
//! |---|---|---|
//! | [`Readout::Label`] | 12 | 0 |
//! | [`Readout::Percentage`] | 11 | 0 |
//! | [`Readout::Bar`] | 10 | 1 |
//! | [`Readout::Remaining`] | 9 | 2 |
//! | [`Readout::CurrentRate`], [`Readout::AverageRate`], [`Readout::TotalEstimate`] | 8 | 0, 0, 2 |
//! | [`Readout::Elapsed`] | 7 | 2 |
//! | [`Readout::Counts`] | 4 | 0 |

use unicode_width::UnicodeWidthChar;

use crate::{
    config::BarConfig,
    format::{format_clock, format_elapsed, format_float, format_int},
    sample::Sample,
    segment::Segment,
    style::{Color, Style},
};

/// Empty, then eighth-steps up to a full cell.
const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
const UNFILLED: char = '·';
const START_CAP: &str = "▌";
const END_CAP: &str = "▐";

/// The kinds of readout a bar line can carry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Readout {
    /// The label as a standalone segment.
    Label,
    /// `42%`.
    Percentage,
    /// `current/target`, or bare `current` when indeterminate.
    Counts,
    /// Throughput over the last rate window.
    CurrentRate,
    /// Throughput since start.
    AverageRate,
    /// The elastic bar glyph.
    Bar,
    /// Time since start.
    Elapsed,
    /// Estimated total duration.
    TotalEstimate,
    /// Estimated time left.
    Remaining,
}

impl Readout {
    /// The default line, in emission order.
    pub const DEFAULT: [Self; 9] = [
        Self::Label,
        Self::Percentage,
        Self::Counts,
        Self::CurrentRate,
        Self::AverageRate,
        Self::Bar,
        Self::Elapsed,
        Self::TotalEstimate,
        Self::Remaining,
    ];

    /// Drop ranking under space pressure; lower goes first.
    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            Self::Label => 12,
            Self::Percentage => 11,
            Self::Bar => 10,
            Self::Remaining => 9,
            Self::CurrentRate | Self::AverageRate | Self::TotalEstimate => 8,
            Self::Elapsed => 7,
            Self::Counts => 4,
        }
    }

    /// Placement group; survivors are ordered by it left to right.
    #[must_use]
    pub const fn align(self) -> i32 {
        match self {
            Self::Label
            | Self::Percentage
            | Self::Counts
            | Self::CurrentRate
            | Self::AverageRate => 0,
            Self::Bar => 1,
            Self::Elapsed | Self::TotalEstimate | Self::Remaining => 2,
        }
    }

    /// Renders this readout. The bar is rendered at its minimum width.
    #[must_use]
    pub fn format(self, sample: &Sample, config: &BarConfig, style: Style) -> Segment {
        match self {
            Self::Label => label(sample, config),
            Self::Percentage => percentage(sample),
            Self::Counts => counts(sample),
            Self::CurrentRate => current_rate(sample),
            Self::AverageRate => average_rate(sample),
            Self::Bar => bar(sample, 0, config, style),
            Self::Elapsed => elapsed(sample),
            Self::TotalEstimate => total_estimate(sample),
            Self::Remaining => remaining(sample),
        }
    }

    fn segment(self, text: String) -> Segment {
        Segment::new(self, text, self.priority(), self.align())
    }
}

/// Produces one segment per configured readout, in configuration order.
#[must_use]
pub fn compose(sample: &Sample, config: &BarConfig, style: Style) -> Vec<Segment> {
    config
        .readouts
        .iter()
        .map(|readout| readout.format(sample, config, style))
        .collect()
}

fn overlays_label(sample: &Sample, config: &BarConfig) -> bool {
    config.label_overlay && !sample.is_indeterminate() && config.readouts.contains(&Readout::Bar)
}

/// The label on its own; hidden when empty or painted inside the bar.
#[must_use]
pub fn label(sample: &Sample, config: &BarConfig) -> Segment {
    if sample.label.is_empty() || overlays_label(sample, config) {
        return Segment::hidden(Readout::Label);
    }
    Readout::Label.segment(sample.label.to_string())
}

/// `100%`; hidden in indeterminate mode.
#[must_use]
pub fn percentage(sample: &Sample) -> Segment {
    if sample.is_indeterminate() {
        return Segment::hidden(Readout::Percentage);
    }
    let pct = format!("{:.0}", sample.ratio() * 100.0);
    Readout::Percentage.segment(format!("{pct:>3}%"))
}

/// `current/target`, padded so the slash stays put; bare `current` when indeterminate.
#[must_use]
pub fn counts(sample: &Sample) -> Segment {
    let text = if sample.is_indeterminate() {
        format_int(sample.position)
    } else {
        format!(
            "{:>5}/{:<5}",
            format_int(sample.position),
            format_int(sample.target)
        )
    };
    Readout::Counts.segment(text)
}

/// Throughput since start, `---` until there is something to divide.
#[must_use]
pub fn average_rate(sample: &Sample) -> Segment {
    let rate = sample
        .average_rate()
        .map_or_else(|| "---".to_owned(), format_float);
    Readout::AverageRate.segment(format!("{rate:>5}/s avg"))
}

/// Throughput over the rolling window; hidden at ratio 0 or 1 when a target is known.
#[must_use]
pub fn current_rate(sample: &Sample) -> Segment {
    if !sample.is_indeterminate() && sample.is_saturated() {
        return Segment::hidden(Readout::CurrentRate);
    }
    let rate = sample
        .window
        .rate()
        .map_or_else(|| "---/s".to_owned(), |r| format!("{}/s", format_float(r)));
    Readout::CurrentRate.segment(format!("{rate:>7}"))
}

/// `+2m05s`.
#[must_use]
pub fn elapsed(sample: &Sample) -> Segment {
    Readout::Elapsed.segment(format!("+{}", format_elapsed(sample.elapsed)))
}

/// Estimated total duration as `HH:MM:SS`.
#[must_use]
pub fn total_estimate(sample: &Sample) -> Segment {
    match sample.estimates() {
        Some((total, _)) => Readout::TotalEstimate.segment(format_clock(total)),
        None => Segment::hidden(Readout::TotalEstimate),
    }
}

/// Estimated time left as `-HH:MM:SS`.
#[must_use]
pub fn remaining(sample: &Sample) -> Segment {
    match sample.estimates() {
        Some((_, left)) => Readout::Remaining.segment(format!("-{}", format_clock(left))),
        None => Segment::hidden(Readout::Remaining),
    }
}

/// The elastic bar glyph, sized to fill `available` columns.
///
/// Two columns go to the caps; the cells in between never drop below
/// `config.min_bar_width`. The fill position is split into whole cells and an
/// eighth-step partial cell. With overlay enabled the label is painted over the
/// first cells, inverted where the fill has already passed.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn bar(sample: &Sample, available: usize, config: &BarConfig, style: Style) -> Segment {
    if sample.is_indeterminate() {
        return Segment::hidden(Readout::Bar);
    }

    let cells = available.saturating_sub(2).max(config.min_bar_width);
    let ratio = sample.ratio();
    let fill = ratio * cells as f64;
    let whole = fill.trunc() as usize;
    let fraction = fill.fract();
    let part = (fraction * (BLOCKS.len() - 1) as f64) as usize;

    let mut text = style.paint(&style.bright(Color::White), START_CAP);
    let mut overlay = if config.label_overlay {
        sample.label.chars()
    } else {
        "".chars()
    };
    let mut pending = overlay.next();

    let mut i = 0;
    while i < cells {
        if let Some(ch) = pending {
            let w = ch.width().unwrap_or(0);
            if w == 0 {
                pending = overlay.next();
                continue;
            }
            if i + w <= cells {
                let open = if i < whole {
                    style.bright_on(Color::White, Color::Blue)
                } else {
                    style.fg(Color::Cyan)
                };
                text.push_str(&style.paint(&open, ch.encode_utf8(&mut [0; 4])));
                pending = overlay.next();
                i += w;
                continue;
            }
            pending = None;
        }

        if i < whole {
            text.push_str(&style.paint(&style.fg(Color::Blue), "█"));
        } else if i == whole {
            let glyph = BLOCKS[part.min(BLOCKS.len() - 1)];
            text.push_str(&style.paint(&style.fg(Color::Blue), glyph.encode_utf8(&mut [0; 4])));
        } else {
            // The cell right after the fill fades in with the fraction.
            let open = if i == whole + 1 && fraction >= 0.66 {
                style.bright(Color::Black)
            } else if i == whole + 1 && fraction >= 0.33 {
                style.fg(Color::White)
            } else {
                style.bright(Color::White)
            };
            text.push_str(&style.paint(&open, UNFILLED.encode_utf8(&mut [0; 4])));
        }
        i += 1;
    }

    text.push_str(&style.paint(&style.bright(Color::White), END_CAP));
    Readout::Bar.segment(text).elastic()
}
