use flume::{Receiver, Sender};

use super::AsyncOp;
use crate::errors::{Error, Result};

type Command = Box<dyn FnOnce() + Send + 'static>;

/// FIFO of work submitted to the render thread.
///
/// Cloning yields another handle to the same queue, so producers on other
/// threads can submit while one consumer plays commands back.
#[derive(Clone)]
pub struct CommandQueue {
    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl CommandQueue {
    /// `capacity == 0` creates an unbounded queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = if capacity == 0 {
            flume::unbounded()
        } else {
            flume::bounded(capacity)
        };
        Self { sender, receiver }
    }

    /// Queues a command with no result.
    pub fn queue_command(&self, command: impl FnOnce() + Send + 'static) -> Result<()> {
        self.sender
            .send(Box::new(command))
            .map_err(|_| Error::CoreThreadStopped)
    }

    /// Queues a command that reports its result through the returned [`AsyncOp`].
    ///
    /// The command receives the operation and is expected to complete it. If
    /// it returns without doing so the operation is completed with no value.
    pub fn queue_return_command(
        &self,
        command: impl FnOnce(&AsyncOp) + Send + 'static,
    ) -> Result<AsyncOp> {
        let op = AsyncOp::new();
        let handle = op.clone();
        self.queue_command(move || {
            command(&handle);
            if !handle.has_completed() {
                log::debug!(
                    "Async operation return value wasn't resolved by its command, completing without a value"
                );
                if let Err(err) = handle.complete() {
                    log::error!("Failed to resolve async operation: {err}");
                }
            }
        })?;
        Ok(op)
    }

    /// Runs every queued command on the calling thread, in submission order.
    ///
    /// Returns the number of commands executed.
    pub fn play_back(&self) -> usize {
        let mut executed = 0;
        for command in self.receiver.try_iter() {
            command();
            executed += 1;
        }
        executed
    }

    /// Blocks until the next command arrives and runs it.
    ///
    /// Returns `false` once the queue can no longer receive commands.
    pub(crate) fn play_next_blocking(&self) -> bool {
        match self.receiver.recv() {
            Ok(command) => {
                command();
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.len())
            .finish()
    }
}
