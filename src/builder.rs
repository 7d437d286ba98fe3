//! Fluent interface for starting a [`Bar`].
//!
//! [`Bar::new`] covers the common case. The [`ProgressBuilder`] exists for
//! everything else.
//!
//! # Key Features
//!
//! * **Output Injection:** Draw to any `Write + Send` sink instead of standard output.
//!   Tests use this to capture frames; applications can point it at standard error.
//! * **Width Source:** Replace the terminal query with any function returning a column
//!   count, which together with [`Bar::notify_resize`] makes resize behavior testable.
//! * **Shared State:** Inject an existing `Arc<AtomicU64>` when another part of the
//!   application already counts the work the bar should display.
//! * **Time Travel:** Set the start time explicitly when resuming an earlier task.

use std::{
    io::{self, Write},
    sync::{Arc, atomic::AtomicU64},
};

use compact_str::CompactString;
use tracing::warn;
use web_time::Instant;

use crate::{
    bar::{Bar, Launch, Output, WidthSource},
    config::BarConfig,
    error::Error,
    progress::Progress,
    width,
};

/// A builder for bars that need more than [`Bar::new`] offers.
pub struct ProgressBuilder {
    label: CompactString,
    target: u64,
    start: Option<Instant>,
    atomic_pos: Option<Arc<AtomicU64>>,
    config: BarConfig,
    output: Option<Output>,
    width_source: Option<WidthSource>,
    watch_resize: bool,
}

impl Default for ProgressBuilder {
    fn default() -> Self {
        Self {
            label: CompactString::default(),
            target: 0,
            start: None,
            atomic_pos: None,
            config: BarConfig::default(),
            output: None,
            width_source: None,
            watch_resize: true,
        }
    }
}

impl ProgressBuilder {
    /// Starts building a bar with a known target.
    #[must_use]
    pub fn new_bar(label: impl Into<CompactString>, target: impl Into<u64>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    /// Starts building a bar without a target.
    #[must_use]
    pub fn new_indeterminate(label: impl Into<CompactString>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: BarConfig) -> Self {
        self.config = config;
        self
    }

    /// Draws to `output` instead of standard output.
    #[must_use]
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Uses `source` instead of the terminal to learn the line width.
    ///
    /// A source returning zero is treated as an unknown width.
    #[must_use]
    pub fn with_width_source(mut self, source: impl Fn() -> usize + Send + Sync + 'static) -> Self {
        self.width_source = Some(Arc::new(source));
        self
    }

    /// Enables or disables listening for terminal resize signals. Enabled by default.
    ///
    /// [`Bar::notify_resize`] works either way.
    #[must_use]
    pub const fn watch_resize(mut self, watch: bool) -> Self {
        self.watch_resize = watch;
        self
    }

    /// Sets a pre-existing atomic counter for the position.
    ///
    /// Anything holding the same `Arc` can advance the bar, or read what it shows.
    #[must_use]
    pub fn with_atomic_pos(mut self, atomic_pos: Arc<AtomicU64>) -> Self {
        self.atomic_pos = Some(atomic_pos);
        self
    }

    /// Sets the start time explicitly.
    #[must_use]
    pub const fn with_start_time(mut self, start: Instant) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the start time to `Instant::now()`.
    #[must_use]
    pub fn with_start_time_now(self) -> Self {
        self.with_start_time(Instant::now())
    }

    /// Starts the bar.
    ///
    /// Never fails: if the render worker cannot be spawned the failure is logged and
    /// the returned bar still counts, but draws nothing.
    #[must_use]
    pub fn start(self) -> Bar {
        let (bar, error) = self.launch();
        if let Some(err) = error {
            warn!(error = %err, "progress bar running without a display");
        }
        bar
    }

    /// Starts the bar, reporting a render worker spawn failure as an error.
    pub fn try_start(self) -> Result<Bar, Error> {
        match self.launch() {
            (bar, None) => Ok(bar),
            (_, Some(err)) => Err(err),
        }
    }

    fn launch(self) -> (Bar, Option<Error>) {
        let progress = Progress::with_parts(
            self.label,
            self.atomic_pos
                .unwrap_or_else(|| Arc::new(AtomicU64::new(0))),
            self.target,
            self.start.unwrap_or_else(Instant::now),
        );
        let output = self
            .output
            .unwrap_or_else(|| Box::new(io::stdout()) as Output);
        let width_source = self
            .width_source
            .unwrap_or_else(|| Arc::new(width::terminal_width) as WidthSource);

        Bar::launch(Launch {
            progress,
            config: self.config,
            output,
            width_source,
            watch_resize: self.watch_resize,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use web_time::Instant;

    use super::ProgressBuilder;
    use crate::config::BarConfig;

    fn quiet(builder: ProgressBuilder) -> ProgressBuilder {
        builder
            .with_config(BarConfig::default().with_tick_interval(Duration::from_millis(5)))
            .with_output(io::sink())
            .with_width_source(|| 80)
            .watch_resize(false)
    }

    /// Shared State Injection
    /// Two bars built on the SAME atomic counter see each other's updates, and so
    /// does the code that owns the counter.
    #[test]
    fn test_shared_atomics() {
        let shared_pos = Arc::new(AtomicU64::new(0));

        let b1 = quiet(ProgressBuilder::new_bar("worker_1", 100u64))
            .with_atomic_pos(shared_pos.clone())
            .start();
        let b2 = quiet(ProgressBuilder::new_bar("worker_2", 100u64))
            .with_atomic_pos(shared_pos.clone())
            .start();

        b1.advance(10);
        assert_eq!(b2.position(), 10, "b2 should see b1's updates via shared atomic");

        shared_pos.fetch_add(5, Ordering::Relaxed);
        assert_eq!(b1.position(), 15);

        b1.finish();
        b2.finish();
    }

    #[test]
    fn test_indeterminate_and_start_time() {
        let earlier = Instant::now()
            .checked_sub(Duration::from_secs(60))
            .unwrap_or_else(Instant::now);
        let bar = quiet(ProgressBuilder::new_indeterminate("scan"))
            .with_start_time(earlier)
            .try_start()
            .unwrap();

        assert_eq!(bar.target(), 0);
        assert!(bar.snapshot().is_indeterminate());
        assert_eq!(bar.progress().start(), earlier);
        assert_eq!(bar.label(), "scan");
        bar.finish();
        assert!(bar.is_finished());
    }
}
