use std::path::{Path, PathBuf};
use std::thread;

use super::{AssetLoader, FailureCallback, LoadProgress, ProgressCallback, SuccessCallback};

/// Reads assets from a directory on a background thread.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `url` under the root. Leading slashes are ignored.
    pub fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl AssetLoader for FsLoader {
    fn load(
        &self,
        url: &str,
        mut on_success: SuccessCallback,
        mut on_progress: ProgressCallback,
        mut on_failure: FailureCallback,
    ) {
        let path = self.resolve(url);
        let spawned = thread::Builder::new()
            .name(format!("load {url}"))
            .spawn(move || match std::fs::read(&path) {
                Ok(bytes) => {
                    let len = bytes.len() as u64;
                    on_progress(LoadProgress {
                        loaded: len,
                        total: Some(len),
                    });
                    on_success(bytes);
                }
                Err(err) => on_failure(format!("{}: {err}", path.display())),
            });
        if let Err(err) = spawned {
            // The closure, and with it both callbacks, is dropped here, so
            // the load resolves as abandoned.
            log::error!("could not start loader thread for {url}: {err}");
        }
    }
}
