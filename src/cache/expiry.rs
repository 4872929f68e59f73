//! Cancellable expiry timers backed by Tokio tasks.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::{runtime::Handle, task::JoinHandle};

/// Scoped handle to a pending expiry; dropping it aborts the timer task.
#[derive(Debug)]
pub(crate) struct ExpiryTimer {
	task: JoinHandle<()>,
}
impl ExpiryTimer {
	/// Runs `on_fire` on `runtime` once `delay` elapses, unless cancelled first.
	pub(crate) fn schedule<F>(runtime: &Handle, delay: StdDuration, on_fire: F) -> Self
	where
		F: 'static + Send + FnOnce(),
	{
		let task = runtime.spawn(async move {
			tokio::time::sleep(delay).await;

			on_fire();
		});

		Self { task }
	}

	/// Cancels the timer; a no-op when it already fired.
	pub(crate) fn cancel(self) {
		drop(self);
	}
}
impl Drop for ExpiryTimer {
	fn drop(&mut self) {
		self.task.abort();
	}
}
