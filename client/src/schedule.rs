//! Cancellable scheduling seam. The browser implementation wraps
//! `setTimeout` and `spawn_local`; tests drive a manual scheduler.

use futures::future::LocalBoxFuture;

/// Handle to a scheduled-but-unfired task. Dropping it cancels the task;
/// replacing the handle of a pending refresh is how bursts coalesce.
pub struct TaskHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TaskHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub trait Scheduler {
    /// Run `callback` after `delay_ms`, unless the returned handle is
    /// dropped first.
    fn delay(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskHandle;
    /// Run a local future to completion on the event loop.
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

/// Browser scheduler: gloo timers plus `spawn_local`.
#[derive(Debug, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn delay(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskHandle {
        let timeout = gloo_timers::callback::Timeout::new(delay_ms, callback);
        TaskHandle::new(move || {
            // Consumes the timeout; clearing an already-fired timer is a no-op.
            drop(timeout.cancel());
        })
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}
