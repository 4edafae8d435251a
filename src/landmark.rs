//! Hand landmarks as reported by the recognition engine.

use std::{error::Error, fmt, ops::Index};

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::hand::LandmarkIdx;

/// A tracked point on a hand.
///
/// `x` and `y` are normalized to the video frame (`0.0` to `1.0`, Y pointing *down*). `z` is the
/// engine's relative depth estimate; nothing in this crate uses it.
#[derive(Debug, Default, PartialEq, PartialOrd, Clone, Copy, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Returns the landmark's position in the image plane, ignoring depth.
    #[inline]
    pub fn planar(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }

    /// Euclidean distance to `other` in the image plane.
    #[inline]
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        nalgebra::distance(&self.planar(), &other.planar())
    }
}

/// The 21 landmarks of a single detected hand.
///
/// A [`Hand`] can only be created from a complete and well-formed set of landmarks, so indexing
/// it with a [`LandmarkIdx`] never fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    landmarks: [Landmark; LandmarkIdx::COUNT],
}

impl Hand {
    /// Validates the engine's landmark list for one hand.
    ///
    /// Fails if the list does not contain exactly 21 landmarks, or if any X or Y coordinate is
    /// NaN or infinite.
    pub fn new(landmarks: &[Landmark]) -> Result<Self, InvalidInput> {
        let len = landmarks.len();
        if len > LandmarkIdx::COUNT {
            return Err(InvalidInput::ExtraLandmarks { len });
        }
        let array: [Landmark; LandmarkIdx::COUNT] = match landmarks.try_into() {
            Ok(array) => array,
            Err(_) => {
                return Err(InvalidInput::MissingLandmark {
                    index: LandmarkIdx::ALL[len],
                    len,
                });
            }
        };

        for (idx, lm) in LandmarkIdx::ALL.iter().zip(&array) {
            if !lm.x.is_finite() || !lm.y.is_finite() {
                return Err(InvalidInput::NonFinite { index: *idx });
            }
        }

        Ok(Self { landmarks: array })
    }

    pub fn landmarks(&self) -> &[Landmark; LandmarkIdx::COUNT] {
        &self.landmarks
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkIdx, &Landmark)> + '_ {
        LandmarkIdx::ALL.into_iter().zip(&self.landmarks)
    }
}

impl Index<LandmarkIdx> for Hand {
    type Output = Landmark;

    #[inline]
    fn index(&self, index: LandmarkIdx) -> &Landmark {
        &self.landmarks[index.index()]
    }
}

impl TryFrom<&[Landmark]> for Hand {
    type Error = InvalidInput;

    fn try_from(landmarks: &[Landmark]) -> Result<Self, InvalidInput> {
        Hand::new(landmarks)
    }
}

/// Error returned when the engine's landmark output for a hand is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    /// Fewer than 21 landmarks were supplied; `index` is the first one that is absent.
    MissingLandmark { index: LandmarkIdx, len: usize },
    /// More than 21 landmarks were supplied.
    ExtraLandmarks { len: usize },
    /// A landmark has a NaN or infinite planar coordinate.
    NonFinite { index: LandmarkIdx },
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInput::MissingLandmark { index, len } => write!(
                f,
                "hand has {len} landmarks, landmark {} ({index:?}) is missing",
                index.index()
            ),
            InvalidInput::ExtraLandmarks { len } => write!(
                f,
                "hand has {len} landmarks, expected {}",
                LandmarkIdx::COUNT
            ),
            InvalidInput::NonFinite { index } => write!(
                f,
                "landmark {} ({index:?}) has a non-finite coordinate",
                index.index()
            ),
        }
    }
}

impl Error for InvalidInput {}
