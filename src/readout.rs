//! Where per-frame results are shown to the user.

use std::fmt;

/// The information shown for each classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Display name of the detected hand.
    pub hand: String,
    /// Display name of the classified gesture.
    pub gesture: String,
    /// Number of extended fingers.
    pub finger_count: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hand: {}, gesture: {}, fingers: {}",
            self.hand, self.gesture, self.finger_count
        )
    }
}

/// A surface that displays [`Status`] updates.
pub trait Readout {
    fn show(&mut self, status: &Status);
}

/// Logs every change of the status at *info* level.
///
/// Unchanged statuses are only logged at *trace* level, since they arrive at the camera's frame
/// rate.
#[derive(Debug, Default)]
pub struct LogReadout {
    last: Option<Status>,
}

impl LogReadout {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Readout for LogReadout {
    fn show(&mut self, status: &Status) {
        if self.last.as_ref() == Some(status) {
            log::trace!("{status}");
        } else {
            log::info!("{status}");
            self.last = Some(status.clone());
        }
    }
}

/// Collects all statuses it is shown.
impl Readout for Vec<Status> {
    fn show(&mut self, status: &Status) {
        self.push(status.clone());
    }
}

impl<R: Readout + ?Sized> Readout for &mut R {
    fn show(&mut self, status: &Status) {
        (**self).show(status);
    }
}
