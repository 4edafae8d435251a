//! Gesture classification results of the recognition engine.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::hand::Handedness;
use crate::landmark::{Hand, InvalidInput, Landmark};

/// A gesture the engine's classifier knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// A hand was found, but no gesture applies.
    None,
    Unknown,
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    ILoveYou,
    /// A label this crate doesn't know. Custom classifier models may emit these.
    Other(String),
}

impl Gesture {
    /// Returns the label used by the engine for this gesture.
    pub fn label(&self) -> &str {
        match self {
            Gesture::None => "None",
            Gesture::Unknown => "Unknown",
            Gesture::ClosedFist => "Closed_Fist",
            Gesture::OpenPalm => "Open_Palm",
            Gesture::PointingUp => "Pointing_Up",
            Gesture::ThumbDown => "Thumb_Down",
            Gesture::ThumbUp => "Thumb_Up",
            Gesture::Victory => "Victory",
            Gesture::ILoveYou => "ILoveYou",
            Gesture::Other(label) => label,
        }
    }

    /// Parses an engine label. Matching is exact and case-sensitive.
    pub fn from_label(label: &str) -> Self {
        match label {
            "None" => Gesture::None,
            "Unknown" => Gesture::Unknown,
            "Closed_Fist" => Gesture::ClosedFist,
            "Open_Palm" => Gesture::OpenPalm,
            "Pointing_Up" => Gesture::PointingUp,
            "Thumb_Down" => Gesture::ThumbDown,
            "Thumb_Up" => Gesture::ThumbUp,
            "Victory" => Gesture::Victory,
            "ILoveYou" => Gesture::ILoveYou,
            other => Gesture::Other(other.to_string()),
        }
    }
}

impl FromStr for Gesture {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a ranked classification list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_name: String,
    #[serde(default)]
    pub display_name: String,
    pub score: f32,
}

impl Category {
    pub fn new(category_name: impl Into<String>, score: f32) -> Self {
        Self {
            category_name: category_name.into(),
            display_name: String::new(),
            score,
        }
    }

    /// Returns the display name, falling back to the category name when the engine left it
    /// empty.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.category_name
        } else {
            &self.display_name
        }
    }
}

/// Everything the engine reports for one video frame.
///
/// The three lists are indexed by hand; the inner classification lists are sorted by descending
/// score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recognition {
    /// Presentation time of the video frame the result belongs to.
    pub timestamp_ms: f64,
    #[serde(default)]
    pub landmarks: Vec<Vec<Landmark>>,
    #[serde(default)]
    pub gestures: Vec<Vec<Category>>,
    #[serde(default)]
    pub handednesses: Vec<Vec<Category>>,
}

impl Recognition {
    /// Creates an empty result (no hands) for the frame at `timestamp_ms`.
    pub fn empty(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }

    pub fn has_hands(&self) -> bool {
        !self.landmarks.is_empty()
    }

    /// Validates and returns the first detected hand, if any.
    pub fn first_hand(&self) -> Result<Option<Hand>, InvalidInput> {
        self.landmarks
            .first()
            .map(|lms| Hand::new(lms))
            .transpose()
    }

    /// Validates every detected hand.
    pub fn hands(&self) -> Result<Vec<Hand>, InvalidInput> {
        self.landmarks.iter().map(|lms| Hand::new(lms)).collect()
    }

    /// Returns the highest ranked gesture classification of the first hand.
    pub fn top_gesture(&self) -> Option<&Category> {
        self.gestures.first()?.first()
    }

    /// Returns the highest ranked handedness classification of the first hand.
    pub fn top_handedness(&self) -> Option<&Category> {
        self.handednesses.first()?.first()
    }

    pub fn handedness(&self) -> Option<Handedness> {
        Handedness::from_label(&self.top_handedness()?.category_name)
    }

    /// Whether the classifier judged the first hand to be a closed fist.
    ///
    /// Its holistic judgment takes precedence over the per-finger geometry.
    pub fn is_closed_fist(&self) -> bool {
        self.top_gesture()
            .map_or(false, |c| Gesture::from_label(&c.category_name) == Gesture::ClosedFist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_roundtrip() {
        for gesture in [
            Gesture::None,
            Gesture::Unknown,
            Gesture::ClosedFist,
            Gesture::OpenPalm,
            Gesture::PointingUp,
            Gesture::ThumbDown,
            Gesture::ThumbUp,
            Gesture::Victory,
            Gesture::ILoveYou,
        ] {
            assert_eq!(gesture.label().parse::<Gesture>().unwrap(), gesture);
        }
        assert_eq!(
            Gesture::from_label("closed_fist"),
            Gesture::Other("closed_fist".into())
        );
    }

    #[test]
    fn parses_engine_json() {
        let json = r#"{
            "timestampMs": 12.5,
            "landmarks": [[{"x": 0.1, "y": 0.2}]],
            "gestures": [[{"categoryName": "Closed_Fist", "score": 0.8},
                          {"categoryName": "None", "score": 0.1}]],
            "handednesses": [[{"categoryName": "Right", "displayName": "Right", "score": 0.9}]]
        }"#;
        let rec: Recognition = serde_json::from_str(json).unwrap();
        assert_eq!(rec.timestamp_ms, 12.5);
        assert_eq!(rec.landmarks[0][0], Landmark::new(0.1, 0.2));
        assert!(rec.is_closed_fist());
        assert_eq!(rec.handedness(), Some(Handedness::Right));
        assert_eq!(rec.top_gesture().unwrap().name(), "Closed_Fist");
        assert!(rec.first_hand().is_err());
    }

    #[test]
    fn closed_fist_must_be_top_ranked() {
        let mut rec = Recognition::empty(0.0);
        assert!(!rec.is_closed_fist());

        rec.gestures = vec![vec![
            Category::new("Open_Palm", 0.6),
            Category::new("Closed_Fist", 0.3),
        ]];
        assert!(!rec.is_closed_fist());

        rec.gestures[0].swap(0, 1);
        assert!(rec.is_closed_fist());
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let rec: Recognition = serde_json::from_str(r#"{"timestampMs": 1}"#).unwrap();
        assert!(!rec.has_hands());
        assert_eq!(rec.first_hand(), Ok(None));
        assert_eq!(rec.hands(), Ok(Vec::new()));
        assert!(rec.top_gesture().is_none());
    }
}
