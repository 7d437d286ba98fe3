//! Packing segments into the terminal width.
//!
//! [`fit`] takes one cycle's segments and a column budget and decides what
//! survives:
//!
//! 1. Measure every visible segment plus the separators between them.
//! 2. Regrow the elastic segment (the bar) into whatever is left over.
//! 3. While the line is still too wide, hide the visible segment with the lowest
//!    priority (earliest wins ties), hand back its columns and its separator, and
//!    regrow the elastic segment again.
//! 4. Stable-sort survivors by alignment group and join them.
//!
//! When the elastic segment survives, the result is exactly as wide as the
//! budget. The elastic segment has a floor of its own, so narrow terminals lose
//! auxiliary readouts before the bar turns into an unreadable sliver.

use crate::{readout::Readout, segment::Segment, width::display_width};

/// Result of one layout pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Fitted {
    /// The joined line, escape sequences included.
    pub line: String,
    /// Printable columns of `line`.
    pub width: usize,
    /// Readouts on the line, left to right.
    pub shown: Vec<Readout>,
    /// Readouts dropped for lack of space, in drop order.
    pub dropped: Vec<Readout>,
}

#[allow(clippy::cast_possible_wrap)]
const fn signed(n: usize) -> isize {
    n as isize
}

/// Columns used by the visible segments and the separators between them.
fn footprint(segments: &[Segment], separator_width: usize) -> usize {
    let (count, width) = segments
        .iter()
        .filter(|s| !s.hidden)
        .fold((0usize, 0usize), |(count, width), s| (count + 1, width + s.width));
    width + separator_width * count.saturating_sub(1)
}

/// Lays `segments` out within `width` columns.
///
/// `regrow` rebuilds the elastic segment for a given column allowance. It is only
/// consulted when exactly one segment is elastic.
pub fn fit<F>(mut segments: Vec<Segment>, width: usize, separator: &str, mut regrow: F) -> Fitted
where
    F: FnMut(usize) -> Segment,
{
    let separator_width = display_width(separator);
    let mut available = signed(width) - signed(footprint(&segments, separator_width));

    let elastic = {
        let mut candidates = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.elastic && !s.hidden)
            .map(|(i, _)| i);
        match (candidates.next(), candidates.next()) {
            (Some(index), None) => Some(index),
            _ => None,
        }
    };

    // Reclaim the elastic segment's current footprint and regrow it into the slack.
    let mut stretch = |segments: &mut [Segment], available: &mut isize| {
        let Some(index) = elastic else { return };
        if segments[index].hidden {
            return;
        }
        *available += signed(segments[index].width);
        let allowance = usize::try_from(*available).unwrap_or(0);
        segments[index] = regrow(allowance);
        *available -= signed(segments[index].width);
    };

    stretch(&mut segments, &mut available);

    let mut dropped = Vec::new();
    while available < 0 {
        let mut victim: Option<usize> = None;
        for (i, segment) in segments.iter().enumerate() {
            if segment.hidden {
                continue;
            }
            if victim.is_none_or(|v| segment.priority < segments[v].priority) {
                victim = Some(i);
            }
        }
        let Some(victim) = victim else { break };

        let visible = segments.iter().filter(|s| !s.hidden).count();
        segments[victim].hidden = true;
        dropped.push(segments[victim].kind);
        available += signed(segments[victim].width);
        if visible > 1 {
            available += signed(separator_width);
        }

        stretch(&mut segments, &mut available);
    }

    segments.retain(|s| !s.hidden);
    segments.sort_by_key(|s| s.align);

    let width = footprint(&segments, separator_width);
    let shown = segments.iter().map(|s| s.kind).collect();
    let line = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(separator);

    Fitted {
        line,
        width,
        shown,
        dropped,
    }
}
