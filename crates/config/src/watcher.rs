use crate::{properties::PropertyMap, resolver::ConfigProvider};
use arc_swap::ArcSwap;
use std::{path::PathBuf, sync::Arc, time::Duration};

/// How often the watch task checks whether its owner is gone.
const LIVENESS_POLL: Duration = Duration::from_millis(250);

/// Process-wide variable store backed by a YAML file, hot-reloaded on change.
///
/// Readers always see a complete snapshot; a failed reload keeps the previous
/// one.
pub struct VariableWatcher {
    /// Current variables, atomically swappable.
    current: Arc<ArcSwap<PropertyMap>>,
    /// Path to the variable file.
    path: PathBuf,
}

impl VariableWatcher {
    /// Creates a new watcher from a file path, loading the initial variables immediately.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the variable file cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn new(path: PathBuf) -> Result<Self, figment::Error> {
        let vars = PropertyMap::load_variables(Some(&path))?;
        Ok(Self {
            current: Arc::new(ArcSwap::from_pointee(vars)),
            path,
        })
    }

    /// Returns a snapshot of the current variables.
    #[must_use]
    pub fn load(&self) -> arc_swap::Guard<Arc<PropertyMap>> {
        self.current.load()
    }

    /// Manually reloads the variables from disk.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the variable file cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn reload(&self) -> Result<(), figment::Error> {
        let vars = PropertyMap::load_variables(Some(&self.path))?;
        tracing::debug!(path = %self.path.display(), count = vars.len(), "variables reloaded");
        self.current.store(Arc::new(vars));
        Ok(())
    }

    /// Starts background file watching (spawns a blocking tokio task) that
    /// reloads the variables whenever the file changes.
    ///
    /// The task holds only a weak reference and exits once the last
    /// `Arc<VariableWatcher>` is dropped.
    pub fn watch(self: Arc<Self>) {
        use notify::{RecursiveMode, Watcher as _};
        use std::sync::mpsc::RecvTimeoutError;
        let weak = Arc::downgrade(&self);
        let path = self.path.clone();
        drop(self);

        tokio::task::spawn_blocking(move || {
            let (tx, rx) = std::sync::mpsc::channel();
            let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                if res.is_ok() {
                    let _ = tx.send(());
                }
            });
            let mut watcher = match watcher {
                Ok(w) => w,
                Err(e) => {
                    tracing::error!(error = %e, "failed to create variable file watcher");
                    return;
                }
            };

            if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
                tracing::error!(path = %path.display(), error = %e, "failed to watch variable file");
                return;
            }

            loop {
                match rx.recv_timeout(LIVENESS_POLL) {
                    Ok(()) => {
                        let Some(this) = weak.upgrade() else { break };
                        if let Err(e) = this.reload() {
                            tracing::warn!(error = %e, "variable reload failed, keeping previous values");
                        }
                    }
                    Err(RecvTimeoutError::Timeout) if weak.strong_count() > 0 => {}
                    Err(_) => break,
                }
            }
            tracing::debug!(path = %path.display(), "variable watcher stopped");
        });
    }
}

impl ConfigProvider for VariableWatcher {
    fn get(&self, name: &str) -> Option<String> {
        PropertyMap::get(&self.current.load(), name).map(str::to_owned)
    }
}
