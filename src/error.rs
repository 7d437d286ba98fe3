//! Errors surfaced by [`ProgressBuilder::try_start`](crate::ProgressBuilder::try_start).
//!
//! Bar operations themselves never fail: terminal trouble degrades to a quieter
//! bar, and these errors only exist for callers that want to know why.

use std::io;

/// Why a bar could not start with its full machinery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The background render thread could not be spawned.
    #[error("failed to spawn the render thread")]
    Spawn(#[source] io::Error),

    /// Terminal resize notifications could not be registered.
    #[error("failed to register for terminal resize notifications")]
    ResizeWatch(#[source] io::Error),
}
