use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SchedulerError;

/// Called once with the refresh timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

/// Source of display refresh callbacks.
pub trait RefreshSignal {
    /// Schedules `callback` for the next refresh.
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameRequestId, SchedulerError>;

    /// Drops a pending request. Unknown ids are ignored.
    fn cancel_frame(&self, id: FrameRequestId);
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    pending: Vec<(FrameRequestId, FrameCallback)>,
    unavailable: Option<String>,
    fired: u64,
    cancelled: u64,
}

/// Refresh signal driven by hand, with caller-chosen timestamps.
///
/// Clones share the same queue, so the engine can own one while a test or
/// the command line keeps another to call [`ManualRefresh::fire`].
#[derive(Clone, Default)]
pub struct ManualRefresh {
    state: Rc<RefCell<ManualState>>,
}

impl ManualRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every callback queued so far with `timestamp_ms` and returns how
    /// many ran. Callbacks queued while firing wait for the next call.
    pub fn fire(&self, timestamp_ms: f64) -> usize {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        let count = pending.len();
        self.state.borrow_mut().fired += count as u64;
        for (_, callback) in pending {
            callback(timestamp_ms);
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Callbacks run so far.
    pub fn fired(&self) -> u64 {
        self.state.borrow().fired
    }

    /// Requests dropped through `cancel_frame`.
    pub fn cancelled(&self) -> u64 {
        self.state.borrow().cancelled
    }

    /// Makes later `request_frame` calls fail with `reason`, or succeed again
    /// with `None`.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.state.borrow_mut().unavailable = reason.map(str::to_string);
    }
}

impl RefreshSignal for ManualRefresh {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameRequestId, SchedulerError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.unavailable {
            return Err(SchedulerError::RefreshUnavailable(reason.clone()));
        }
        let id = FrameRequestId(state.next_id);
        state.next_id += 1;
        state.pending.push((id, callback));
        Ok(id)
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|(pending, _)| *pending != id);
        if state.pending.len() < before {
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fire_runs_each_callback_once() {
        let refresh = ManualRefresh::new();
        let seen = Rc::new(Cell::new(0.0));
        let slot = Rc::clone(&seen);
        refresh
            .request_frame(Box::new(move |ms| slot.set(ms)))
            .unwrap();
        assert_eq!(refresh.fire(16.0), 1);
        assert_eq!(seen.get(), 16.0);
        assert_eq!(refresh.fire(32.0), 0);
        assert_eq!(refresh.fired(), 1);
    }

    #[test]
    fn cancelled_requests_never_run() {
        let refresh = ManualRefresh::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let id = refresh
            .request_frame(Box::new(move |_| flag.set(true)))
            .unwrap();
        refresh.cancel_frame(id);
        refresh.cancel_frame(id);
        assert_eq!(refresh.fire(0.0), 0);
        assert!(!ran.get());
        assert_eq!(refresh.cancelled(), 1);
    }

    #[test]
    fn requests_made_while_firing_wait() {
        let refresh = ManualRefresh::new();
        let inner = refresh.clone();
        refresh
            .request_frame(Box::new(move |_| {
                inner.request_frame(Box::new(|_| {})).unwrap();
            }))
            .unwrap();
        assert_eq!(refresh.fire(0.0), 1);
        assert_eq!(refresh.pending(), 1);
    }

    #[test]
    fn unavailable_signal_refuses_requests() {
        let refresh = ManualRefresh::new();
        refresh.set_unavailable(Some("hidden"));
        let err = refresh.request_frame(Box::new(|_| {})).unwrap_err();
        assert_eq!(err, SchedulerError::RefreshUnavailable("hidden".into()));
    }
}
