//! The per-frame processing loop.

use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use image::RgbImage;

use crate::config::Config;
use crate::fingers::{Extractor, FingerStates};
use crate::gesture::Recognition;
use crate::landmark::{Hand, InvalidInput};
use crate::locale::Labeler;
use crate::overlay::{self, Style};
use crate::readout::{Readout, Status};
use crate::recognizer::{Recognizer, RunningMode};
use crate::timer::{FpsCounter, Timer};
use crate::transport::Transport;
use crate::wire::{self, Message};
use crate::worker::Pushed;

/// Error returned when starting a [`Session`] before the recognition engine has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotReady {
    _priv: (),
}

impl fmt::Display for NotReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the recognition engine has not finished loading")
    }
}

impl Error for NotReady {}

/// Stops a running [`Session`] from anywhere, eg. another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Makes the session's frame loop exit after the frame it is currently processing.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What a processed frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub timestamp_ms: f64,
    /// Finger states derived from the landmark geometry alone.
    pub geometric: FingerStates,
    /// Finger states after the classifier's closed-fist override.
    pub states: FingerStates,
    /// The message handed to the transport, if it accepted one.
    pub payload: Option<Message>,
    /// The status shown on the readout, if the frame had a gesture classification.
    pub status: Option<Status>,
}

/// Counters returned by [`Session::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    /// Frames skipped because their timestamp didn't advance.
    pub duplicates: usize,
    /// Frames skipped because the engine produced malformed landmarks.
    pub invalid: usize,
}

/// State of one recognition session, from the user enabling recognition to disabling it.
pub struct Session {
    extractor: Extractor,
    labeler: Labeler,
    transport: Option<Transport>,
    warned_no_transport: bool,
    mode: RunningMode,
    last_timestamp: Option<f64>,
    running: Arc<AtomicBool>,
    overlay: Option<RgbImage>,
    overlay_style: Style,
    fps: FpsCounter,
    t_extract: Timer,
    t_overlay: Timer,
}

impl Session {
    /// Creates a stopped session.
    ///
    /// If `transport` is `None`, finger states are computed and displayed, but not sent anywhere.
    pub fn new(config: &Config, transport: Option<Transport>) -> Self {
        Self {
            extractor: Extractor::with_thresholds(config.thresholds()),
            labeler: Labeler::new(config.locale, config.mirror_handedness),
            transport,
            warned_no_transport: false,
            mode: RunningMode::Image,
            last_timestamp: None,
            running: Arc::new(AtomicBool::new(false)),
            overlay: config
                .overlay_size
                .map(|size| RgbImage::new(size.width, size.height)),
            overlay_style: Style::default(),
            fps: FpsCounter::new("frame loop"),
            t_extract: Timer::new("extract"),
            t_overlay: Timer::new("overlay"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn running_mode(&self) -> RunningMode {
        self.mode
    }

    /// Starts the session, refusing to do so if `recognizer` isn't ready yet.
    pub fn start<R: Recognizer + ?Sized>(&mut self, recognizer: &R) -> Result<(), NotReady> {
        if !recognizer.is_ready() {
            return Err(NotReady { _priv: () });
        }
        if !self.is_running() {
            log::info!("recognition enabled");
            self.last_timestamp = None;
            self.running.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("recognition disabled");
        }
    }

    /// Starts the session if it's stopped and stops it if it's running.
    ///
    /// Returns whether the session is running afterwards.
    pub fn toggle<R: Recognizer + ?Sized>(&mut self, recognizer: &R) -> Result<bool, NotReady> {
        if self.is_running() {
            self.stop();
        } else {
            self.start(recognizer)?;
        }
        Ok(self.is_running())
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.running.clone())
    }

    /// Returns the overlay rendered for the most recent frame, if overlay rendering is enabled.
    pub fn overlay(&self) -> Option<&RgbImage> {
        self.overlay.as_ref()
    }

    pub fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }

    /// Processes the engine's result for one frame.
    ///
    /// Returns `Ok(None)` without doing anything if the frame has the same timestamp as the
    /// previous one.
    pub fn process(
        &mut self,
        rec: &Recognition,
        readout: &mut dyn Readout,
    ) -> Result<Option<FrameOutput>, InvalidInput> {
        if self.last_timestamp == Some(rec.timestamp_ms) {
            log::trace!("frame at {}ms was already processed", rec.timestamp_ms);
            return Ok(None);
        }
        self.last_timestamp = Some(rec.timestamp_ms);

        let hand = rec.first_hand()?;
        let geometric = self.t_extract.time(|| self.extractor.extract(hand.as_ref()));
        let states = if rec.is_closed_fist() {
            FingerStates::CLOSED
        } else {
            geometric
        };
        log::trace!("finger states: {states} (geometry: {geometric})");

        if let Some(canvas) = &mut self.overlay {
            self.t_overlay.time(|| {
                canvas.fill(0);
                // Hands past the first are only drawn; they don't have to be valid for the
                // frame to be processed.
                let rest = rec.landmarks.iter().skip(1).filter_map(|lms| Hand::new(lms).ok());
                let hands: Vec<Hand> = hand.iter().cloned().chain(rest).collect();
                overlay::draw_hands(canvas, &hands, &self.overlay_style);
            });
        }

        let payload = if rec.has_hands() {
            self.transmit(&states)
        } else {
            None
        };

        let status = rec.top_gesture().map(|gesture| Status {
            hand: rec
                .top_handedness()
                .map(|c| self.labeler.hand(c.name()))
                .unwrap_or_default(),
            gesture: self.labeler.gesture(&gesture.category_name),
            finger_count: states.count(),
        });
        if let Some(status) = &status {
            readout.show(status);
        }

        Ok(Some(FrameOutput {
            timestamp_ms: rec.timestamp_ms,
            geometric,
            states,
            payload,
            status,
        }))
    }

    fn transmit(&mut self, states: &FingerStates) -> Option<Message> {
        let Some(transport) = &mut self.transport else {
            if !self.warned_no_transport {
                log::warn!("serial port not open, finger states will not be transmitted");
                self.warned_no_transport = true;
            }
            return None;
        };
        let msg = wire::encode(states);
        match transport.send_message(msg) {
            Pushed::Closed => None,
            Pushed::Queued | Pushed::Dropped => Some(msg),
        }
    }

    /// Runs the frame loop until `recognizer` runs out of frames or the session is stopped.
    ///
    /// Frames with malformed landmarks are logged and skipped. Errors reported by the engine end
    /// the loop.
    pub fn run<R: Recognizer + ?Sized>(
        &mut self,
        recognizer: &mut R,
        readout: &mut dyn Readout,
    ) -> anyhow::Result<RunSummary> {
        self.start(&*recognizer)?;
        if self.mode == RunningMode::Image {
            recognizer.set_running_mode(RunningMode::Video)?;
            self.mode = RunningMode::Video;
        }

        let mut summary = RunSummary::default();
        let result = loop {
            if !self.is_running() {
                break Ok(());
            }
            let rec = match recognizer.next_frame() {
                Ok(Some(rec)) => rec,
                Ok(None) => {
                    log::info!("recognition engine has no more frames");
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            match self.process(&rec, readout) {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.duplicates += 1,
                Err(e) => {
                    log::warn!("skipping frame at {}ms: {e}", rec.timestamp_ms);
                    summary.invalid += 1;
                }
            }

            self.fps.tick_with([&self.t_extract, &self.t_overlay]);
        };
        self.stop();

        log::debug!("{summary:?}");
        if let Some(transport) = &self.transport {
            if transport.dropped() > 0 {
                log::warn!(
                    "'{}' could not keep up, {} messages were dropped",
                    transport.name(),
                    transport.dropped()
                );
            }
        }
        result.map(|()| summary)
    }

    /// Ends the session, waiting for queued messages to be written.
    pub fn finish(mut self) {
        self.stop();
        if let Some(transport) = self.transport.take() {
            transport.close();
        }
    }
}
