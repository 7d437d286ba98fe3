//! # `flexbar`
//!
//! A single-line terminal progress bar that reflows itself to the terminal width.
//!
//! `flexbar` draws one status line made of independent readouts (percentage, counts,
//! rates, elapsed time, estimates and an elastic bar glyph) and is designed to be:
//!
//! * **Cheap to drive**: producers advance the bar with one atomic add and never wait
//!   on the terminal. Handles are [`Arc`](std::sync::Arc)-based and safe to share.
//! * **Adaptive**: every redraw fits the readouts into the current width. Low-priority
//!   readouts drop first and the bar stretches into whatever is left.
//! * **Quiet on the wire**: an unchanged line is never rewritten, and changed lines are
//!   repainted in place with backspaces.
//! * **Log-friendly**: [`Bar::log_line`] prints ordinary lines above the bar.
//!
//! ```no_run
//! let bar = flexbar::Bar::new(100, "Copying");
//! for i in 0..100 {
//!     if i == 50 {
//!         bar.log_line("halfway there");
//!     }
//!     bar.advance(1);
//! }
//! bar.finish();
//! ```
//!
//! ## Modules
//!
//! * [`bar`]: The [`Bar`] handle and its render worker.
//! * [`builder`]: Fluent interface for bars with custom output, width or state.
//! * [`config`]: [`BarConfig`], the display settings.
//! * [`iter`]: Extension traits for drawing a bar over an Iterator.
//! * [`progress`]: The shared [`Progress`] state and snapshot logic.
//! * [`readout`], [`layout`], [`render`]: The redraw pipeline, usable on its own.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bar;
pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod iter;
pub mod layout;
pub mod progress;
pub mod readout;
pub mod render;
mod resize;
pub mod sample;
pub mod segment;
pub mod style;
pub mod width;

pub use bar::Bar;
pub use builder::ProgressBuilder;
pub use config::BarConfig;
pub use error::Error;
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use layout::Fitted;
pub use progress::{Lifecycle, Progress, ProgressSnapshot};
pub use readout::Readout;
pub use render::Renderer;
pub use segment::Segment;
