//! Serial link to the external device.
//!
//! Messages are written by a dedicated worker thread, so a slow or stalled port never blocks the
//! frame loop. The queue between the two is bounded; when the port can't keep up, messages are
//! dropped according to the configured [`Overflow`] policy.

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::fingers::FingerStates;
use crate::wire::{self, Message};
use crate::worker::{Overflow, Pushed, Worker};

/// How long a single write may block before it is reported as failed.
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration of the queue feeding the writer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueOptions {
    pub capacity: usize,
    pub overflow: Overflow,
}

impl QueueOptions {
    pub const DEFAULT_CAPACITY: usize = 4;
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            overflow: Overflow::default(),
        }
    }
}

/// An open, writable link that finger states are streamed to.
pub struct Transport {
    name: String,
    worker: Worker<Message>,
}

impl Transport {
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// Opens the serial port at `path` (8 data bits, no parity, 1 stop bit).
    pub fn open(path: &str, baud_rate: u32, queue: QueueOptions) -> anyhow::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port '{path}'"))?;
        log::info!("serial port '{path}' opened at {baud_rate} baud");

        Ok(Self::from_writer(path, port, queue)?)
    }

    /// Creates a transport that writes messages to an arbitrary byte sink.
    pub fn from_writer<W>(name: &str, mut writer: W, queue: QueueOptions) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        let port_name = name.to_string();
        let mut failing = false;
        let worker = Worker::builder()
            .name(format!("serial writer ({name})"))
            .capacity(queue.capacity)
            .overflow(queue.overflow)
            .spawn(move |msg: Message| {
                match writer.write_all(&msg).and_then(|()| writer.flush()) {
                    Ok(()) => {
                        if failing {
                            log::info!("writes to '{port_name}' are succeeding again");
                            failing = false;
                        }
                    }
                    // Only the first of a series of failures is worth a warning.
                    Err(e) if !failing => {
                        log::warn!("failed to write to '{port_name}': {e}");
                        failing = true;
                    }
                    Err(e) => log::debug!("failed to write to '{port_name}': {e}"),
                }
            })?;

        Ok(Self {
            name: name.to_string(),
            worker,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues `states` for transmission and returns immediately.
    pub fn send(&mut self, states: &FingerStates) -> Pushed {
        self.send_message(wire::encode(states))
    }

    /// Queues an already encoded message for transmission and returns immediately.
    pub fn send_message(&mut self, msg: Message) -> Pushed {
        let pushed = self.worker.push(msg);
        match pushed {
            Pushed::Queued => {}
            Pushed::Dropped => log::debug!(
                "'{}' is falling behind, {} messages dropped so far",
                self.name,
                self.worker.dropped()
            ),
            Pushed::Closed => log::warn!("writer thread for '{}' has exited", self.name),
        }
        pushed
    }

    /// Returns the number of messages dropped because the link couldn't keep up.
    pub fn dropped(&self) -> u64 {
        self.worker.dropped()
    }

    /// Writes out all queued messages and closes the link.
    pub fn close(self) {
        log::debug!("closing '{}'", self.name);
        self.worker.finish();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::hand::Finger;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_encoded_states() {
        let buf = SharedBuf::default();
        let mut link = Transport::from_writer("mem", buf.clone(), QueueOptions::default()).unwrap();
        let mut states = FingerStates::CLOSED;
        states.set(Finger::Index, true);
        link.send(&states);
        link.send(&FingerStates::OPEN);
        link.close();
        assert_eq!(&*buf.0.lock().unwrap(), b"$01000$11111");
    }

    #[test]
    fn write_errors_are_not_fatal() {
        let mut link = Transport::from_writer("broken", Broken, QueueOptions::default()).unwrap();
        assert_ne!(link.send(&FingerStates::OPEN), Pushed::Closed);
        link.send(&FingerStates::CLOSED);
        link.close();
    }

    #[test]
    fn missing_port_fails_to_open() {
        let err = Transport::open(
            "/dev/this-port-does-not-exist",
            Transport::DEFAULT_BAUD_RATE,
            QueueOptions::default(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("this-port-does-not-exist"));
    }
}
