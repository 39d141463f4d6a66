//! File watching capability
//!
//! Watch mode depends on an optional backend (the `notify` crate behind the
//! `watch` feature). Acquisition is explicit: [`FileWatcher::new`] fails
//! with a typed error when the backend is not compiled in, and watch-mode
//! callers treat that as fatal.

use std::error;
use std::fmt::{Display, Formatter};

/// Error related to file watching
#[derive(Debug)]
pub enum WatchError {
    /// The optional watch backend is not available
    Unavailable,
    /// The watch backend reported an error
    Backend,
}

impl Display for WatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::Unavailable => write!(f, "File watching is not available"),
            WatchError::Backend => write!(f, "Error in the file watching backend"),
        }
    }
}

impl error::Error for WatchError {}

pub use imp::FileWatcher;

#[cfg(feature = "watch")]
mod imp {
    use super::WatchError;
    use error_stack::{IntoReport, Result, ResultExt};
    use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use std::path::{Path, PathBuf};
    use std::sync::mpsc;

    /// A recursive filesystem watcher delivering changed file paths.
    pub struct FileWatcher {
        watcher: RecommendedWatcher,
        recv: mpsc::Receiver<PathBuf>,
    }

    impl FileWatcher {
        /// Acquire the watch backend.
        pub fn new() -> Result<Self, WatchError> {
            let (send, recv) = mpsc::channel();
            let watcher = notify::recommended_watcher(
                move |result: notify::Result<notify::Event>| match result {
                    Ok(event) => {
                        if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                            for path in event.paths {
                                let _ = send.send(path);
                            }
                        }
                    }
                    Err(e) => log::warn!("watch backend error: {e}"),
                },
            )
            .into_report()
            .change_context(WatchError::Backend)
            .attach_printable("failed to initialize the watch backend")?;
            Ok(Self { watcher, recv })
        }

        /// Start watching a directory tree.
        pub fn watch(&mut self, dir: &Path) -> Result<(), WatchError> {
            self.watcher
                .watch(dir, RecursiveMode::Recursive)
                .into_report()
                .change_context(WatchError::Backend)
                .attach_printable_lazy(|| format!("failed to watch `{}`", dir.display()))?;
            log::info!("watching directory: {}", dir.display());
            Ok(())
        }

        /// Block until the next created or modified path, or `None` when the
        /// backend shuts down.
        pub fn next(&self) -> Option<PathBuf> {
            self.recv.recv().ok()
        }
    }
}

#[cfg(not(feature = "watch"))]
mod imp {
    use super::WatchError;
    use error_stack::{Report, Result};
    use std::path::{Path, PathBuf};

    /// Stub watcher used when the optional backend is not compiled in.
    /// Construction always fails with a diagnostic.
    pub struct FileWatcher {
        _private: (),
    }

    impl FileWatcher {
        pub fn new() -> Result<Self, WatchError> {
            Err(Report::new(WatchError::Unavailable).attach_printable(
                "the optional watch backend failed to load and is required for watch mode; \
                 rebuild with the `watch` feature enabled",
            ))
        }

        pub fn watch(&mut self, _dir: &Path) -> Result<(), WatchError> {
            Err(Report::new(WatchError::Unavailable))
        }

        pub fn next(&self) -> Option<PathBuf> {
            None
        }
    }
}
