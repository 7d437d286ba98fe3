//! The unit of layout: one readout's text plus its sizing metadata.

use crate::{readout::Readout, width::display_width};

/// One piece of a rendered line, produced fresh every redraw.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Segment {
    pub(crate) kind: Readout,
    pub(crate) text: String,
    /// Printable columns, escape sequences excluded.
    pub(crate) width: usize,
    /// Lower is dropped first under pressure.
    pub(crate) priority: i32,
    /// Left-to-right ordering key for survivors.
    pub(crate) align: i32,
    pub(crate) hidden: bool,
    /// Granted all leftover width by the layout fitter.
    pub(crate) elastic: bool,
}

impl Segment {
    /// Creates a visible segment, measuring `text`.
    #[must_use]
    pub fn new(kind: Readout, text: String, priority: i32, align: i32) -> Self {
        Self {
            kind,
            width: display_width(&text),
            text,
            priority,
            align,
            hidden: false,
            elastic: false,
        }
    }

    /// A segment whose readout does not apply this cycle.
    #[must_use]
    pub const fn hidden(kind: Readout) -> Self {
        Self {
            kind,
            text: String::new(),
            width: 0,
            priority: 0,
            align: 0,
            hidden: true,
            elastic: false,
        }
    }

    /// Marks the segment as the one that absorbs leftover width.
    #[must_use]
    pub const fn elastic(mut self) -> Self {
        self.elastic = true;
        self
    }

    /// Which readout produced this segment.
    #[must_use]
    pub const fn kind(&self) -> Readout {
        self.kind
    }

    /// Rendered text, possibly with escape sequences.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Printable columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Drop ranking; lower goes first.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Left-to-right ordering key.
    #[must_use]
    pub const fn align(&self) -> i32 {
        self.align
    }

    /// Whether the segment is left out of the line.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the segment absorbs leftover width.
    #[must_use]
    pub const fn is_elastic(&self) -> bool {
        self.elastic
    }
}
