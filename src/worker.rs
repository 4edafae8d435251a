//! Background worker threads fed through bounded queues.

use std::{
    io,
    panic::resume_unwind,
    thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// What to do when a message is pushed into a [`Worker`] whose queue is full.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    /// Evict the oldest queued message to make room for the new one.
    #[default]
    DropOldest,
    /// Discard the new message.
    DropNewest,
}

/// A builder object that can be used to configure and spawn a [`Worker`].
#[derive(Clone)]
pub struct WorkerBuilder {
    name: Option<String>,
    capacity: usize,
    overflow: Overflow,
}

impl WorkerBuilder {
    /// Sets the name of the [`Worker`] thread.
    pub fn name<N: Into<String>>(self, name: N) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the queue capacity of the [`Worker`].
    ///
    /// A capacity of 0 is treated as 1, since a rendezvous channel would make every
    /// [`Worker::push`] overflow unless the thread happens to be waiting.
    pub fn capacity(self, capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ..self
        }
    }

    /// Sets the policy applied by [`Worker::push`] when the queue is full.
    pub fn overflow(self, overflow: Overflow) -> Self {
        Self { overflow, ..self }
    }

    /// Spawns a [`Worker`] thread that uses `handler` to process incoming messages.
    pub fn spawn<I, F>(self, mut handler: F) -> io::Result<Worker<I>>
    where
        I: Send + 'static,
        F: FnMut(I) + Send + 'static,
    {
        let (sender, recv) = crossbeam::channel::bounded(self.capacity);
        let thread_recv = recv.clone();
        let mut builder = thread::Builder::new();
        if let Some(name) = self.name.clone() {
            builder = builder.name(name);
        }
        let name = self.name.unwrap_or_else(|| "<unnamed>".into());
        let handle = builder.spawn(move || {
            log::trace!("worker '{name}' starting");
            for message in thread_recv {
                handler(message);
            }
            log::trace!("worker '{name}' exiting");
        })?;

        Ok(Worker {
            sender: Some(sender),
            recv,
            overflow: self.overflow,
            dropped: 0,
            handle: Some(handle),
        })
    }
}

/// Outcome of [`Worker::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    /// The message was queued without dropping anything.
    Queued,
    /// The queue was full and a message was dropped according to the [`Overflow`] policy.
    Dropped,
    /// The worker thread has exited; the message was discarded.
    Closed,
}

/// A handle to a worker thread that processes messages of type `I`.
///
/// When dropped, the queue is closed, the thread processes the remaining messages and is then
/// joined. If the thread has panicked, the panic will be forwarded to the thread dropping the
/// `Worker`.
pub struct Worker<I: Send + 'static> {
    sender: Option<Sender<I>>,
    /// Used to evict queued messages under [`Overflow::DropOldest`].
    recv: Receiver<I>,
    overflow: Overflow,
    dropped: u64,
    handle: Option<JoinHandle<()>>,
}

impl<I: Send + 'static> Drop for Worker<I> {
    fn drop(&mut self) {
        // Close the channel to signal the thread to exit.
        drop(self.sender.take());

        self.wait_for_exit();
    }
}

impl Worker<()> {
    /// Returns a builder that can be used to configure and spawn a [`Worker`].
    #[inline]
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder {
            name: None,
            capacity: 1,
            overflow: Overflow::default(),
        }
    }
}

impl<I: Send + 'static> Worker<I> {
    fn wait_for_exit(&mut self) {
        // Wait for it to exit and propagate its panic if it panicked.
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => {}
                Err(payload) => {
                    if !thread::panicking() {
                        resume_unwind(payload);
                    }
                }
            }
        }
    }

    /// Queues a message for the worker thread without blocking.
    ///
    /// If the queue is full, the [`Overflow`] policy decides which message is lost.
    ///
    /// Returns [`Pushed::Closed`] once the worker thread has exited. A panic of the thread is
    /// forwarded when the [`Worker`] is finished or dropped.
    pub fn push(&mut self, msg: I) -> Pushed {
        if self.handle.as_ref().map_or(true, |h| h.is_finished()) {
            self.sender = None;
        }
        let Some(sender) = &self.sender else {
            return Pushed::Closed;
        };
        let msg = match sender.try_send(msg) {
            Ok(()) => return Pushed::Queued,
            Err(TrySendError::Full(msg)) => msg,
            Err(TrySendError::Disconnected(_)) => {
                self.sender = None;
                return Pushed::Closed;
            }
        };

        self.dropped += 1;
        match self.overflow {
            Overflow::DropNewest => Pushed::Dropped,
            Overflow::DropOldest => {
                // The worker may have drained the queue in the meantime, so this can fail to
                // evict anything. The retry below then just succeeds.
                self.recv.try_recv().ok();
                match sender.try_send(msg) {
                    Ok(()) | Err(TrySendError::Full(_)) => Pushed::Dropped,
                    Err(TrySendError::Disconnected(_)) => Pushed::Closed,
                }
            }
        }
    }

    /// Returns the number of messages lost to queue overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Closes the queue and waits for the thread to process the remaining messages and exit.
    pub fn finish(mut self) {
        drop(self.sender.take());
        self.wait_for_exit();
    }
}
