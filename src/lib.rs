//! Hand finger tracking for serial-connected devices.
//!
//! A hand gesture recognition engine reports 21 landmarks per detected hand for every video
//! frame. This crate turns the first hand's landmarks into an open/closed state per finger
//! ([`fingers`]), shows the result to the user, and streams it to an external device over a
//! serial port using a tiny ASCII protocol ([`wire`]).
//!
//! # Coordinates
//!
//! Landmark coordinates are normalized to the video frame: X points to the right, Y points
//! *down*, and both range from 0.0 to 1.0.
//!
//! # Environment Variables
//!
//! Every command line option of the `fingerlink` binary can also be set through an environment
//! variable:
//!
//! * `FINGERLINK_SERIAL_PORT`: The serial device to stream finger states to (eg.
//!   `/dev/ttyACM0`). If unset, nothing is transmitted.
//! * `FINGERLINK_BAUD_RATE`: Baud rate of the serial port. Defaults to 9600.
//! * `FINGERLINK_LOCALE`: Language of gesture and hand names, `en` or `es`.
//! * `RUST_LOG`: Overrides the log filter, see [`env_logger`].
//!
//! [`env_logger`]: https://docs.rs/env_logger

use log::LevelFilter;

pub mod config;
pub mod fingers;
pub mod gesture;
pub mod hand;
pub mod landmark;
pub mod locale;
pub mod overlay;
pub mod readout;
pub mod recognizer;
pub mod session;
pub mod timer;
pub mod transport;
pub mod wire;
pub mod worker;

#[cfg(test)]
mod test;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and this crate will log at *trace*
/// level. Otherwise, they will log at *debug* level. Everything else logs at *info* level.
///
/// The `RUST_LOG` environment variable takes precedence over these defaults.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
