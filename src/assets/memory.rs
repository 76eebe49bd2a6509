use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{AssetLoader, FailureCallback, LoadProgress, ProgressCallback, SuccessCallback};

struct PendingLoad {
    url: String,
    on_success: SuccessCallback,
    on_progress: ProgressCallback,
    on_failure: FailureCallback,
}

#[derive(Default)]
struct MemoryState {
    assets: HashMap<String, Vec<u8>>,
    deferred: bool,
    pending: Vec<PendingLoad>,
    requests: usize,
}

/// Serves assets from memory.
///
/// By default a load resolves inside the `load` call. A deferred loader
/// queues every load until [`MemoryLoader::flush`], [`MemoryLoader::fail_pending`]
/// or [`MemoryLoader::abandon_pending`] is called, which lets tests choose
/// the tick a load lands on. Clones share the same store and queue.
#[derive(Clone, Default)]
pub struct MemoryLoader {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that queues loads until flushed.
    pub fn deferred() -> Self {
        let loader = Self::default();
        loader.state.lock().deferred = true;
        loader
    }

    pub fn with_asset(self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.state.lock().assets.insert(url.into(), bytes.into());
    }

    /// Loads waiting for a flush.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Total number of `load` calls.
    pub fn requests(&self) -> usize {
        self.state.lock().requests
    }

    /// Resolves every queued load from the store and returns how many ran.
    pub fn flush(&self) -> usize {
        let pending = std::mem::take(&mut self.state.lock().pending);
        let count = pending.len();
        for load in pending {
            let bytes = self.state.lock().assets.get(&load.url).cloned();
            Self::deliver(load, bytes);
        }
        count
    }

    /// Fails every queued load with `reason`.
    pub fn fail_pending(&self, reason: &str) -> usize {
        let pending = std::mem::take(&mut self.state.lock().pending);
        let count = pending.len();
        for mut load in pending {
            (load.on_failure)(reason.to_string());
        }
        count
    }

    /// Drops every queued load without calling back.
    pub fn abandon_pending(&self) -> usize {
        let pending = std::mem::take(&mut self.state.lock().pending);
        pending.len()
    }

    fn deliver(mut load: PendingLoad, bytes: Option<Vec<u8>>) {
        match bytes {
            Some(bytes) => {
                let len = bytes.len() as u64;
                (load.on_progress)(LoadProgress {
                    loaded: len,
                    total: Some(len),
                });
                (load.on_success)(bytes);
            }
            None => (load.on_failure)(format!("{} not found", load.url)),
        }
    }
}

impl AssetLoader for MemoryLoader {
    fn load(
        &self,
        url: &str,
        on_success: SuccessCallback,
        on_progress: ProgressCallback,
        on_failure: FailureCallback,
    ) {
        let load = PendingLoad {
            url: url.to_string(),
            on_success,
            on_progress,
            on_failure,
        };
        let mut state = self.state.lock();
        state.requests += 1;
        if state.deferred {
            state.pending.push(load);
            return;
        }
        let bytes = state.assets.get(url).cloned();
        drop(state);
        Self::deliver(load, bytes);
    }
}
