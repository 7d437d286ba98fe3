//! The live bar: a producer-facing handle and the worker that draws it.
//!
//! [`Bar`] is what callers hold. Advancing it is a single atomic add; nothing a
//! producer does waits on the terminal except [`Bar::finish`].
//!
//! # Render Worker
//!
//! One background thread owns the terminal for the lifetime of the bar. It is a
//! small state machine fed by three channels and a timer, consumed in a fixed
//! priority order so shutdown is never starved by a chatty producer:
//!
//! 1. **finish**: closed (never sent on) by the one caller that wins the
//!    `Running -> Finishing` transition.
//! 2. **log**: lines to print above the bar.
//! 3. **resize**: capacity one; the width is re-queried when it fires.
//! 4. **tick**: the timeout when nothing else arrives.
//!
//! Every wake-up ends in one redraw cycle: sample, compose, fit, paint.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
    thread::{self, JoinHandle},
};

use compact_str::CompactString;
use crossbeam_channel::{Receiver, Select, Sender, TryRecvError, bounded, unbounded};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::{
    ProgressBuilder,
    config::BarConfig,
    error::Error,
    layout,
    progress::{Progress, ProgressSnapshot},
    readout,
    render::Renderer,
    resize::ResizeWatcher,
    sample::Sampler,
    style::Style,
    width::DEFAULT_WIDTH,
};

pub(crate) type Output = Box<dyn Write + Send>;
pub(crate) type WidthSource = Arc<dyn Fn() -> usize + Send + Sync>;

/// A running progress bar.
///
/// Cloning is cheap and every clone drives the same bar. When the last clone is
/// dropped without an explicit [`finish`](Self::finish), the bar finishes itself.
#[derive(Clone)]
pub struct Bar {
    inner: Arc<Control>,
}

struct Control {
    progress: Progress,
    renderer: Arc<Mutex<Renderer<Output>>>,
    /// Taken and dropped by the caller that wins the finish race.
    finish_tx: Mutex<Option<Sender<()>>>,
    /// `None` once the worker has stopped accepting lines.
    log_gate: Arc<Mutex<Option<Sender<String>>>>,
    resize_tx: Sender<()>,
    /// Disconnects when the worker exits; `None` for a detached bar.
    done_rx: Option<Receiver<()>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Everything [`ProgressBuilder`] hands over to get a bar running.
pub(crate) struct Launch {
    pub(crate) progress: Progress,
    pub(crate) config: BarConfig,
    pub(crate) output: Output,
    pub(crate) width_source: WidthSource,
    pub(crate) watch_resize: bool,
}

impl Bar {
    /// Starts a bar on standard output with the default configuration.
    ///
    /// A `target` of zero runs the bar in indeterminate mode.
    #[must_use]
    pub fn new(target: u64, label: impl Into<CompactString>) -> Self {
        ProgressBuilder::new_bar(label, target).start()
    }

    /// Spawns the worker. A spawn failure still yields a usable, detached bar.
    pub(crate) fn launch(launch: Launch) -> (Self, Option<Error>) {
        let Launch {
            progress,
            config,
            output,
            width_source,
            watch_resize,
        } = launch;

        let renderer = Arc::new(Mutex::new(Renderer::new(output)));
        let (finish_tx, finish_rx) = bounded::<()>(0);
        let (log_tx, log_rx) = unbounded();
        let (resize_tx, resize_rx) = bounded(1);
        let (done_tx, done_rx) = bounded::<()>(0);
        let log_gate = Arc::new(Mutex::new(Some(log_tx)));

        let resize = if watch_resize {
            ResizeWatcher::spawn(resize_tx.clone())
                .inspect_err(|err| warn!(error = %err, "resize notifications unavailable"))
                .ok()
        } else {
            None
        };

        let width = measure(&width_source);
        let worker = Worker {
            sampler: Sampler::new(progress.start(), config.rate_window),
            style: Style::new(config.color_enabled),
            progress: progress.clone(),
            config,
            renderer: renderer.clone(),
            width_source,
            width,
            finish_rx,
            log_rx,
            log_gate: log_gate.clone(),
            resize_rx,
            resize,
            done_tx,
            write_failed: false,
        };

        let spawned = thread::Builder::new()
            .name("flexbar-render".into())
            .spawn(move || worker.run());

        let (handle, done_rx, error) = match spawned {
            Ok(handle) => {
                debug!(width, target = progress.target(), "progress bar started");
                (Some(handle), Some(done_rx), None)
            }
            Err(err) => {
                log_gate.lock().take();
                (None, None, Some(Error::Spawn(err)))
            }
        };

        let control = Control {
            progress,
            renderer,
            finish_tx: Mutex::new(Some(finish_tx)),
            log_gate,
            resize_tx,
            done_rx,
            worker: Mutex::new(handle),
        };
        (
            Self {
                inner: Arc::new(control),
            },
            error,
        )
    }

    // ========================================================================
    // Producer API
    // ========================================================================

    /// Adds `n` to the counter. Never blocks.
    pub fn advance(&self, n: u64) {
        self.inner.progress.advance(n);
    }

    /// Adds one to the counter.
    pub fn inc(&self) {
        self.inner.progress.inc();
    }

    /// Replaces the label; visible from the next redraw.
    pub fn set_label(&self, label: impl Into<CompactString>) {
        self.inner.progress.set_label(label);
    }

    /// Changes the target; zero switches to indeterminate mode.
    pub fn set_target(&self, target: u64) {
        self.inner.progress.set_target(target);
    }

    /// Prints `text` as an ordinary line above the bar.
    ///
    /// While the bar is live the line goes through the render worker, which erases
    /// the bar, prints the line and repaints. Once the bar is gone the line is
    /// written directly.
    pub fn log_line(&self, text: impl Into<String>) {
        let mut text = text.into();
        {
            let gate = self.inner.log_gate.lock();
            if let Some(tx) = gate.as_ref() {
                match tx.send(text) {
                    Ok(()) => return,
                    Err(returned) => text = returned.into_inner(),
                }
            }
        }
        if let Err(err) = self.inner.renderer.lock().write_line(&text) {
            debug!(error = %err, "dropped log line");
        }
    }

    /// Asks the worker to re-measure the terminal, as a resize signal would.
    pub fn notify_resize(&self) {
        let _ = self.inner.resize_tx.try_send(());
    }

    /// Stops the bar and restores the terminal.
    ///
    /// Blocks until the worker has painted its last frame and exited. Safe to call
    /// any number of times from any number of threads; only the first call does the
    /// shutdown, every call waits for it.
    pub fn finish(&self) {
        self.inner.shutdown();
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Current counter value.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.progress.position()
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> u64 {
        self.inner.progress.target()
    }

    /// Current label.
    #[must_use]
    pub fn label(&self) -> CompactString {
        self.inner.progress.label()
    }

    /// Returns `true` once a finish has been requested.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.progress.is_finished()
    }

    /// The shared state behind this bar.
    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.inner.progress
    }

    /// A point-in-time copy of the bar's state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.progress.snapshot()
    }
}

impl fmt::Debug for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bar")
            .field("progress", &self.inner.progress.snapshot())
            .finish_non_exhaustive()
    }
}

impl Control {
    fn shutdown(&self) {
        if self.progress.begin_finish() {
            // Dropping the only sender is the signal.
            drop(self.finish_tx.lock().take());
            if self.done_rx.is_none() {
                self.progress.mark_finished();
            }
        }

        if let Some(done) = &self.done_rx {
            // Nothing is ever sent; this returns when the worker drops its end.
            let _ = done.recv();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("render worker panicked");
            }
        }
    }
}

impl Drop for Control {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn measure(source: &WidthSource) -> usize {
    match source() {
        0 => DEFAULT_WIDTH,
        w => w,
    }
}

enum Event {
    Finish,
    Log(String),
    Resize,
    Tick,
}

struct Worker {
    progress: Progress,
    config: BarConfig,
    style: Style,
    sampler: Sampler,
    renderer: Arc<Mutex<Renderer<Output>>>,
    width_source: WidthSource,
    width: usize,

    finish_rx: Receiver<()>,
    log_rx: Receiver<String>,
    log_gate: Arc<Mutex<Option<Sender<String>>>>,
    resize_rx: Receiver<()>,
    resize: Option<ResizeWatcher>,
    done_tx: Sender<()>,

    write_failed: bool,
}

impl Worker {
    fn run(mut self) {
        loop {
            let force = match self.next_event() {
                Event::Finish => break,
                Event::Log(line) => {
                    let result = self.renderer.lock().interject(&line);
                    self.check(result);
                    true
                }
                Event::Resize => {
                    self.width = measure(&self.width_source);
                    debug!(width = self.width, "terminal resized");
                    let result = self.renderer.lock().erase();
                    self.check(result);
                    true
                }
                Event::Tick => false,
            };
            self.cycle(force);
        }
        self.shutdown();
    }

    fn next_event(&self) -> Event {
        if let Some(event) = self.poll() {
            return event;
        }

        let mut select = Select::new();
        select.recv(&self.finish_rx);
        select.recv(&self.log_rx);
        select.recv(&self.resize_rx);
        // Readiness only; `poll` decides what gets consumed.
        let _ = select.ready_timeout(self.config.tick_interval);

        self.poll().unwrap_or(Event::Tick)
    }

    fn poll(&self) -> Option<Event> {
        match self.finish_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return Some(Event::Finish),
            Err(TryRecvError::Empty) => {}
        }
        if let Ok(line) = self.log_rx.try_recv() {
            return Some(Event::Log(line));
        }
        if self.resize_rx.try_recv().is_ok() {
            return Some(Event::Resize);
        }
        None
    }

    fn cycle(&mut self, force: bool) {
        let sample = self.sampler.observe(&self.progress, Instant::now());
        let budget = self.width.saturating_sub(self.config.margin);

        let config = &self.config;
        let style = self.style;
        let segments = readout::compose(&sample, config, style);
        let fitted = layout::fit(segments, budget, &config.separator, |w| {
            readout::bar(&sample, w, config, style)
        });

        if !fitted.dropped.is_empty() {
            trace!(budget, dropped = ?fitted.dropped, "readouts dropped");
        }

        let result = self
            .renderer
            .lock()
            .paint(&fitted.line, fitted.width, force)
            .map(drop);
        self.check(result);
    }

    fn check(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if !self.write_failed {
                warn!(error = %err, "terminal write failed");
                self.write_failed = true;
            }
        }
    }

    fn shutdown(mut self) {
        // Closing the gate first guarantees every accepted line is already queued.
        drop(self.log_gate.lock().take());
        let pending: Vec<String> = self.log_rx.try_iter().collect();
        for line in pending {
            let result = self.renderer.lock().interject(&line);
            self.check(result);
        }

        self.cycle(true);
        let result = self.renderer.lock().finish(self.config.leave_on_finish);
        self.check(result);

        self.progress.mark_finished();
        debug!(position = self.progress.position(), "progress bar finished");

        drop(self.resize.take());
        // Releases every caller blocked in `finish`.
        drop(self.done_tx);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::{Duration, Instant},
    };

    use parking_lot::Mutex;

    use super::Bar;
    use crate::{
        ProgressBuilder,
        config::BarConfig,
        progress::Lifecycle,
        render::{CURSOR_HIDE, CURSOR_SHOW},
        width::display_width,
    };

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    /// The most recently painted line in a raw output stream.
    fn last_frame(output: &str) -> String {
        let output = output.strip_suffix(CURSOR_SHOW).unwrap_or(output);
        let output = output.strip_suffix('\n').unwrap_or(output);
        output.rsplit('\x08').next().unwrap_or_default().replace(CURSOR_HIDE, "")
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn test_config() -> BarConfig {
        BarConfig::default()
            .with_color(false)
            .with_tick_interval(Duration::from_millis(5))
    }

    fn start(label: &str, target: u64, width: Arc<AtomicUsize>) -> (Bar, SharedBuffer) {
        let out = SharedBuffer::default();
        let bar = ProgressBuilder::new_bar(label, target)
            .with_config(test_config())
            .with_output(out.clone())
            .with_width_source(move || width.load(Ordering::Relaxed))
            .watch_resize(false)
            .start();
        (bar, out)
    }

    fn fixed_width(columns: usize) -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(columns))
    }

    /// Complete Run
    /// 100 single steps end on a full bar reading 100/100 and 100% with no estimate.
    #[test]
    fn test_sequential_run_to_completion() {
        let (bar, out) = start("", 100, fixed_width(80));
        for _ in 0..100 {
            bar.advance(1);
        }
        bar.finish();

        let frame = last_frame(&out.contents());
        assert!(frame.contains("100/100"), "{frame:?}");
        assert!(frame.contains("100%"), "{frame:?}");
        assert!(frame.contains("▌█"), "{frame:?}");
        assert!(!frame.contains('·'), "bar should be completely filled: {frame:?}");
        assert!(!frame.contains(" -00:"), "remaining estimate should be hidden: {frame:?}");
        assert_eq!(display_width(&frame), 79);
        assert_eq!(bar.progress().lifecycle(), Lifecycle::Finished);
    }

    /// Indeterminate Run
    /// Without a target the line shows bare counts and no ratio readouts.
    #[test]
    fn test_indeterminate_run() {
        let (bar, out) = start("Scanning", 0, fixed_width(80));
        bar.advance(37);
        bar.finish();

        let frame = last_frame(&out.contents());
        assert!(frame.starts_with("Scanning 37 "), "{frame:?}");
        assert!(!frame.contains('%'), "{frame:?}");
        assert!(!frame.contains('▌'), "{frame:?}");
        assert_eq!(bar.position(), 37);
    }

    /// Relabeling and retargeting show up in the final frame.
    #[test]
    fn test_relabel_and_retarget() {
        let (bar, out) = start("First", 0, fixed_width(80));
        bar.set_target(10);
        bar.set_label("Second");
        bar.advance(5);
        bar.finish();

        let frame = last_frame(&out.contents());
        assert!(frame.starts_with(" 50%"), "{frame:?}");
        assert!(frame.contains("▌Second"), "label overlays the bar: {frame:?}");
        assert_eq!(bar.label(), "Second");
    }

    /// Vast Targets
    /// A target so large that estimates overflow still renders, finishes and
    /// restores the cursor.
    #[test]
    fn test_vast_target_restores_terminal() {
        let out = SharedBuffer::default();
        let earlier = web_time::Instant::now()
            .checked_sub(Duration::from_secs(100))
            .unwrap();
        let bar = ProgressBuilder::new_bar("Vast", u64::MAX)
            .with_config(test_config())
            .with_output(out.clone())
            .with_width_source(|| 80)
            .with_start_time(earlier)
            .watch_resize(false)
            .start();
        bar.advance(1);
        bar.finish();

        let contents = out.contents();
        assert!(contents.ends_with(&format!("\n{CURSOR_SHOW}")), "{contents:?}");
        assert_eq!(bar.progress().lifecycle(), Lifecycle::Finished);
        let frame = last_frame(&contents);
        assert!(frame.contains("  0%"), "{frame:?}");
        assert!(frame.contains("1/18447P"), "{frame:?}");
    }

    /// Concurrent Producers
    /// Advances from many threads sum exactly.
    #[test]
    fn test_concurrent_advances_sum_exactly() {
        let (bar, _out) = start("work", 0, fixed_width(80));
        let handles: Vec<_> = (1..=8u64)
            .map(|n| {
                let bar = bar.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        bar.advance(n);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        bar.finish();

        assert_eq!(bar.position(), 36_000);
    }

    /// Idempotent Finish
    /// Two racing finish calls both return and the terminal is restored once.
    #[test]
    fn test_concurrent_finish_runs_once() {
        let (bar, out) = start("race", 10, fixed_width(80));
        bar.advance(5);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let bar = bar.clone();
                thread::spawn(move || bar.finish())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        bar.finish();

        assert_eq!(out.contents().matches(CURSOR_SHOW).count(), 1);
        assert_eq!(bar.progress().lifecycle(), Lifecycle::Finished);
    }

    /// Resize
    /// Narrowing the terminal from 80 to 20 columns drops readouts until the line fits.
    #[test]
    fn test_resize_narrows_line() {
        let width = fixed_width(80);
        let (bar, out) = start("Resizing", 100, width.clone());
        bar.advance(30);

        assert!(wait_for(|| display_width(&last_frame(&out.contents())) == 79));

        width.store(20, Ordering::Relaxed);
        bar.notify_resize();
        assert!(wait_for(|| {
            let w = display_width(&last_frame(&out.contents()));
            w > 0 && w <= 19
        }));

        bar.finish();
        let frame = last_frame(&out.contents());
        assert!(display_width(&frame) <= 19, "{frame:?}");
        assert!(frame.contains("30%"), "{frame:?}");
    }

    /// Log Interjection
    /// A logged line replaces the bar, ends with a newline and is followed by a full repaint.
    #[test]
    fn test_log_line_interjects_above_bar() {
        let (bar, out) = start("Logging", 100, fixed_width(80));
        bar.advance(10);
        assert!(wait_for(|| !out.contents().is_empty()));

        bar.log_line("note");
        assert!(wait_for(|| {
            let contents = out.contents();
            contents
                .split_once("note\n")
                .is_some_and(|(_, after)| after.contains("/100"))
        }));
        bar.finish();

        let contents = out.contents();
        let (before, after) = contents.split_once("note\n").unwrap();
        // The bar was blanked right before the line.
        assert!(before.ends_with("\x08"), "{before:?}");
        // The repaint starts from a clean slate: blanks, rewind, full line.
        let repaint = after.trim_start_matches(' ').trim_start_matches('\x08');
        assert!(repaint.starts_with(" 10%"), "{repaint:?}");
    }

    /// Lines logged right before finishing are printed before the final frame.
    #[test]
    fn test_pending_log_lines_survive_finish() {
        let (bar, out) = start("Draining", 10, fixed_width(80));
        bar.log_line("first");
        bar.log_line("second");
        bar.advance(10);
        bar.finish();

        let contents = out.contents();
        let first = contents.find("first\n").unwrap();
        let second = contents.find("second\n").unwrap();
        assert!(first < second);
        assert!(last_frame(&contents).contains("10/10"));
    }

    /// After shutdown a log line is written directly.
    #[test]
    fn test_log_after_finish_writes_directly() {
        let (bar, out) = start("Late", 10, fixed_width(80));
        bar.finish();
        bar.log_line("late");
        assert!(out.contents().ends_with(&format!("{CURSOR_SHOW}late\n")));
    }

    /// Dropping every handle finishes the bar.
    #[test]
    fn test_drop_finishes() {
        let (bar, out) = start("Dropped", 10, fixed_width(80));
        let clone = bar.clone();
        drop(bar);
        assert!(!out.contents().contains(CURSOR_SHOW));
        drop(clone);
        assert!(out.contents().ends_with(CURSOR_SHOW));
    }

    /// A zero-width terminal report falls back to 80 columns.
    #[test]
    fn test_zero_width_falls_back() {
        let (bar, out) = start("Fallback", 100, fixed_width(0));
        bar.advance(50);
        bar.finish();
        assert_eq!(display_width(&last_frame(&out.contents())), 79);
    }

    /// With `leave_on_finish` off the last frame is erased.
    #[test]
    fn test_erase_on_finish() {
        let out = SharedBuffer::default();
        let bar = ProgressBuilder::new_bar("Erased", 10u64)
            .with_config(test_config().with_leave_on_finish(false))
            .with_output(out.clone())
            .with_width_source(|| 40)
            .watch_resize(false)
            .start();
        bar.advance(3);
        bar.finish();

        let contents = out.contents();
        let tail = contents.strip_suffix(CURSOR_SHOW).unwrap();
        assert!(tail.ends_with("\x08"));
        assert!(!tail.ends_with('\n'));
    }
}
