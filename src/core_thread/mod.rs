//! Core Thread
//!
//! Work that touches the device runs on one dedicated render thread. Other
//! threads hand it closures through a [`CommandQueue`] and get results back
//! through [`AsyncOp`]s.
//!
//! ```rust,ignore
//! let core = CoreThread::spawn(&settings)?;
//! let op = core.queue().queue_return_command(|op| {
//!     op.complete_operation(upload_count()).ok();
//! })?;
//! op.wait();
//! let count: u32 = op.return_value()?;
//! core.shutdown()?;
//! ```

pub mod async_op;
pub mod command_queue;

pub use async_op::{AsyncOp, AsyncValue, FromAsyncValue};
pub use command_queue::CommandQueue;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::errors::{Error, Result};
use crate::settings::CoreSettings;

/// Owns the render thread and the queue feeding it.
pub struct CoreThread {
    queue: CommandQueue,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CoreThread {
    /// Starts the render thread.
    pub fn spawn(settings: &CoreSettings) -> Result<Self> {
        let queue = CommandQueue::new(settings.command_queue_capacity);
        let consumer = queue.clone();
        let running = Arc::new(AtomicBool::new(true));
        let keep_going = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name(settings.render_thread_name.clone())
            .spawn(move || {
                log::debug!("Render thread started");
                while keep_going.load(Ordering::Acquire) && consumer.play_next_blocking() {}
                log::debug!("Render thread stopped");
            })
            .map_err(|e| Error::Device(format!("failed to spawn render thread: {e}")))?;

        Ok(Self {
            queue,
            running,
            handle: Some(handle),
        })
    }

    /// Queue drained by the render thread.
    #[inline]
    #[must_use]
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Runs every command queued so far, then stops and joins the thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        // Queued behind everything already submitted; the thread exits after it.
        let running = Arc::clone(&self.running);
        self.queue
            .queue_command(move || running.store(false, Ordering::Release))?;

        handle
            .join()
            .map_err(|_| Error::Device("render thread panicked".to_string()))
    }
}

impl Drop for CoreThread {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("Failed to stop render thread: {err}");
        }
    }
}

impl std::fmt::Debug for CoreThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreThread")
            .field("queue", &self.queue)
            .field("running", &self.handle.is_some())
            .finish()
    }
}
