//! Iterator adapters for automatic progress display.
//!
//! [`ProgressIteratorExt`] adds helper methods to any [`Iterator`], so a loop gets
//! a live bar with a single method call.
//!
//! # Heuristics
//!
//! The adapters check [`Iterator::size_hint`]:
//! * If the iterator reports an exact size, the bar gets that target.
//! * Otherwise the bar runs in indeterminate mode.
//!
//! Exhausting the iterator finishes the bar.
//!
//! # Example
//!
//! ```no_run
//! use flexbar::ProgressIteratorExt;
//!
//! for item in vec![1, 2, 3].into_iter().progress_with_label("Crunching") {
//!     // ...
//! #   let _ = item;
//! }
//! ```

use compact_str::CompactString;

use crate::{ProgressBuilder, bar::Bar};

/// An iterator adapter that advances a bar on every item.
#[derive(Debug)]
pub struct ProgressIter<I> {
    iter: I,
    bar: Bar,
}

impl<I> ProgressIter<I> {
    /// Creates a new `ProgressIter`.
    ///
    /// Usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, bar: Bar) -> Self {
        Self { iter, bar }
    }

    /// The bar driven by this iterator.
    pub const fn bar(&self) -> &Bar {
        &self.bar
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next();

        if item.is_some() {
            self.bar.inc();
        } else {
            self.bar.finish();
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach a bar to any Iterator.
pub trait ProgressIteratorExt: Sized {
    /// Wraps the iterator in a new, unlabeled bar on standard output.
    fn progress(self) -> ProgressIter<Self>;

    /// Wraps the iterator in a new bar with the given label.
    fn progress_with_label(self, label: impl Into<CompactString>) -> ProgressIter<Self>;

    /// Wraps the iterator using an existing [`Bar`].
    fn progress_with(self, bar: Bar) -> ProgressIter<Self>;

    /// The target implied by `size_hint`; zero when the size is not exact.
    fn target_from_size_hint(&self) -> u64;
}

impl<I: Iterator> ProgressIteratorExt for I {
    fn progress(self) -> ProgressIter<Self> {
        self.progress_with_label(CompactString::default())
    }

    fn progress_with_label(self, label: impl Into<CompactString>) -> ProgressIter<Self> {
        let bar = ProgressBuilder::new_bar(label, self.target_from_size_hint()).start();
        ProgressIter::new(self, bar)
    }

    fn progress_with(self, bar: Bar) -> ProgressIter<Self> {
        ProgressIter::new(self, bar)
    }

    fn target_from_size_hint(&self) -> u64 {
        match self.size_hint() {
            (lower, Some(upper)) if lower == upper => upper as u64,
            _ => 0,
        }
    }
}
