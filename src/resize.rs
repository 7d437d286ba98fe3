//! Terminal-resize notifications.
//!
//! On unix a [`ResizeWatcher`] forwards `SIGWINCH` into a bounded channel of
//! capacity one. A full channel already carries a pending notification, so bursts
//! of resizes coalesce into a single wake-up; the worker re-queries the width
//! when it gets there. Dropping the watcher deregisters the handler.

use crossbeam_channel::Sender;

use crate::error::Error;

#[cfg(unix)]
pub(crate) struct ResizeWatcher {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl ResizeWatcher {
    pub(crate) fn spawn(notify: Sender<()>) -> Result<Self, Error> {
        use signal_hook::{consts::SIGWINCH, iterator::Signals};

        let mut signals = Signals::new([SIGWINCH]).map_err(Error::ResizeWatch)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("flexbar-resize".into())
            .spawn(move || {
                for _ in signals.forever() {
                    let _ = notify.try_send(());
                }
            })
            .map_err(Error::ResizeWatch)?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for ResizeWatcher {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// No resize signal to listen for; [`Bar::notify_resize`](crate::Bar::notify_resize)
/// is the only source.
#[cfg(not(unix))]
pub(crate) struct ResizeWatcher;

#[cfg(not(unix))]
impl ResizeWatcher {
    #[allow(clippy::unnecessary_wraps)]
    pub(crate) fn spawn(_notify: Sender<()>) -> Result<Self, Error> {
        Ok(Self)
    }
}
