//! Human-readable names for gestures and hands.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gesture::Gesture;
use crate::hand::Handedness;

/// Language used for gesture and handedness names shown to the user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Shows the engine's labels as-is.
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn gesture_name<'a>(&self, gesture: &'a Gesture) -> &'a str {
        match self {
            Locale::En => gesture.label(),
            Locale::Es => match gesture {
                Gesture::None => "-",
                Gesture::Unknown => "Desconocido",
                Gesture::ClosedFist => "Puño cerrado",
                Gesture::OpenPalm => "Palma abierta",
                Gesture::PointingUp => "Apuntando hacia arriba",
                Gesture::ThumbDown => "Pulgar abajo",
                Gesture::ThumbUp => "Pulgar arriba",
                Gesture::Victory => "Victoria",
                Gesture::ILoveYou => "Te quiero",
                Gesture::Other(label) => label,
            },
        }
    }

    pub fn hand_name(&self, hand: Handedness) -> &'static str {
        match (self, hand) {
            (Locale::En, _) => hand.label(),
            (Locale::Es, Handedness::Left) => "Izquierda",
            (Locale::Es, Handedness::Right) => "Derecha",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            _ => Err(format!("unsupported locale '{s}' (expected 'en' or 'es')")),
        }
    }
}

/// Turns engine labels into the strings shown on screen.
#[derive(Debug, Clone, Copy)]
pub struct Labeler {
    locale: Locale,
    mirror_handedness: bool,
}

impl Labeler {
    /// Creates a labeler.
    ///
    /// If `mirror_handedness` is set, the engine's handedness is swapped before display. This is
    /// needed when the user looks at a mirrored camera preview: the engine reports the hand as
    /// it appears in the unmirrored frame, which is the opposite of the hand the user raised.
    pub fn new(locale: Locale, mirror_handedness: bool) -> Self {
        Self {
            locale,
            mirror_handedness,
        }
    }

    pub fn gesture(&self, label: &str) -> String {
        self.locale.gesture_name(&Gesture::from_label(label)).to_string()
    }

    /// Names the hand described by the engine's handedness `label`.
    ///
    /// Labels that are not `Left` or `Right` are passed through unchanged.
    pub fn hand(&self, label: &str) -> String {
        match Handedness::from_label(label) {
            Some(hand) => {
                let hand = if self.mirror_handedness {
                    hand.mirrored()
                } else {
                    hand
                };
                self.locale.hand_name(hand).to_string()
            }
            None => label.to_string(),
        }
    }
}
