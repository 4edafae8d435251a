//! Serial wire format.
//!
//! Every message is the ASCII character `$` followed by one digit (`0` or `1`) per finger, in
//! the order thumb, index, middle, ring, pinky. For example, `$01100` means that the index and
//! middle fingers are extended. There is no terminator or checksum; receivers synchronize on the
//! `$`.

use std::{error::Error, fmt};

use crate::fingers::FingerStates;

/// Start-of-message marker.
pub const MARKER: u8 = b'$';

/// Length of an encoded message in bytes.
pub const MESSAGE_LEN: usize = 6;

/// An encoded message.
pub type Message = [u8; MESSAGE_LEN];

pub fn encode(states: &FingerStates) -> Message {
    let mut msg = [MARKER; MESSAGE_LEN];
    for (out, bit) in msg[1..].iter_mut().zip(states.to_array()) {
        *out = b'0' + bit;
    }
    msg
}

/// Decodes a complete message.
pub fn decode(msg: &[u8]) -> Result<FingerStates, DecodeError> {
    if msg.len() != MESSAGE_LEN {
        return Err(DecodeError::Length(msg.len()));
    }
    if msg[0] != MARKER {
        return Err(DecodeError::Marker(msg[0]));
    }
    let mut bits = [false; 5];
    for (bit, &b) in bits.iter_mut().zip(&msg[1..]) {
        *bit = match b {
            b'0' => false,
            b'1' => true,
            _ => return Err(DecodeError::Digit(b)),
        };
    }
    Ok(FingerStates::from_bits(bits))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    Length(usize),
    Marker(u8),
    Digit(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Length(len) => {
                write!(f, "message has {len} bytes, expected {MESSAGE_LEN}")
            }
            DecodeError::Marker(b) => write!(f, "expected '$' marker, got byte {b:#04x}"),
            DecodeError::Digit(b) => write!(f, "expected '0' or '1', got byte {b:#04x}"),
        }
    }
}

impl Error for DecodeError {}

/// Receiver-side stream parser.
///
/// Bytes can be fed in arbitrary chunks. Garbage before a `$` and messages interrupted by a new
/// `$` or an invalid digit are skipped.
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `bytes` into the decoder, returning all messages completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<FingerStates> {
        let mut out = Vec::new();
        for &b in bytes {
            if b == MARKER {
                if !self.buf.is_empty() {
                    log::trace!("discarding truncated message {:?}", self.buf);
                }
                self.buf.clear();
                self.buf.push(b);
                continue;
            }
            if self.buf.is_empty() {
                continue;
            }

            self.buf.push(b);
            if self.buf.len() == MESSAGE_LEN {
                match decode(&self.buf) {
                    Ok(states) => out.push(states),
                    Err(e) => log::trace!("discarding malformed message: {e}"),
                }
                self.buf.clear();
            } else if b != b'0' && b != b'1' {
                log::trace!("discarding malformed message {:?}", self.buf);
                self.buf.clear();
            }
        }
        out
    }
}
