//! Per-finger open/closed classification.
//!
//! The classification is purely geometric and stateless: every frame is judged on its own, using
//! only the first detected hand.
//!
//! - The index, middle, ring and pinky fingers count as extended when their tip is *above* their
//!   PIP joint in the image (smaller Y, since Y points down).
//! - The thumb mostly moves within the image plane, so it instead has to pass two tests: its tip
//!   must be meaningfully farther away from the thumb's base (CMC) than its IP joint is, and the
//!   tip must not be close to the center of the palm (which happens when the thumb is curled
//!   across the palm).
//!
//! Additional hands in the input are ignored. Tracking multiple hands is not supported.

use std::{fmt, ops::Index};

use crate::hand::{Finger, LandmarkIdx};
use crate::landmark::{Hand, InvalidInput, Landmark};

/// Extension state of all five fingers of a hand.
///
/// Positions are `[thumb, index, middle, ring, pinky]`. The [`Default`] value has every finger
/// closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerStates([bool; 5]);

impl FingerStates {
    /// All fingers closed.
    pub const CLOSED: Self = Self([false; 5]);

    /// All fingers extended.
    pub const OPEN: Self = Self([true; 5]);

    pub fn from_bits(bits: [bool; 5]) -> Self {
        Self(bits)
    }

    #[inline]
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger.position()]
    }

    #[inline]
    pub fn set(&mut self, finger: Finger, extended: bool) {
        self.0[finger.position()] = extended;
    }

    /// Returns the states as integers, where `1` means extended and `0` means closed.
    pub fn to_array(&self) -> [u8; 5] {
        self.0.map(u8::from)
    }

    /// Returns the number of extended fingers.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Finger, bool)> + '_ {
        Finger::ALL.into_iter().zip(self.0)
    }
}

impl Index<Finger> for FingerStates {
    type Output = bool;

    fn index(&self, finger: Finger) -> &bool {
        &self.0[finger.position()]
    }
}

/// Formats the states as 5 digits, eg. `01100`.
impl fmt::Display for FingerStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for extended in self.0 {
            f.write_str(if extended { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Tunable constants of the thumb classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// How much farther from the CMC joint the thumb tip has to be than the IP joint.
    pub thumb_extension_ratio: f32,
    /// Minimum distance between the thumb tip and the palm center, in normalized image units.
    pub thumb_palm_clearance: f32,
}

impl Thresholds {
    pub const DEFAULT_THUMB_EXTENSION_RATIO: f32 = 1.1;
    pub const DEFAULT_THUMB_PALM_CLEARANCE: f32 = 0.06;
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            thumb_extension_ratio: Self::DEFAULT_THUMB_EXTENSION_RATIO,
            thumb_palm_clearance: Self::DEFAULT_THUMB_PALM_CLEARANCE,
        }
    }
}

/// Computes [`FingerStates`] from hand landmarks.
#[derive(Debug, Default, Clone, Copy)]
pub struct Extractor {
    thresholds: Thresholds,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classifies the fingers of the first hand in `hands`.
    ///
    /// If there is no hand, all fingers are reported as closed.
    pub fn extract<'a, I>(&self, hands: I) -> FingerStates
    where
        I: IntoIterator<Item = &'a Hand>,
    {
        match hands.into_iter().next() {
            Some(hand) => self.classify(hand),
            None => FingerStates::CLOSED,
        }
    }

    /// Classifies the fingers of a single hand.
    pub fn classify(&self, hand: &Hand) -> FingerStates {
        let mut states = FingerStates::CLOSED;
        states.set(Finger::Thumb, self.thumb_extended(hand));
        for finger in &Finger::ALL[1..] {
            // Y points down, so "above" means smaller.
            states.set(*finger, hand[finger.tip()].y < hand[finger.pip()].y);
        }
        states
    }

    fn thumb_extended(&self, hand: &Hand) -> bool {
        let tip = &hand[LandmarkIdx::ThumbTip];
        let ip = &hand[LandmarkIdx::ThumbIp];
        let cmc = &hand[LandmarkIdx::ThumbCmc];
        let palm = &hand[LandmarkIdx::PALM_CENTER];

        let reaches_out = tip.planar_distance(cmc)
            > ip.planar_distance(cmc) * self.thresholds.thumb_extension_ratio;
        let clears_palm = tip.planar_distance(palm) > self.thresholds.thumb_palm_clearance;

        reaches_out && clears_palm
    }
}

/// Classifies the fingers of the first hand in `hands` using the default [`Thresholds`].
///
/// Accepts anything that yields [`Hand`] references: a slice, a `Vec`, or an [`Option`] when the
/// hand may be absent. Without a hand, the result is [`FingerStates::CLOSED`].
pub fn extract<'a, I>(hands: I) -> FingerStates
where
    I: IntoIterator<Item = &'a Hand>,
{
    Extractor::new().extract(hands)
}

/// Like [`extract`], but takes the engine's unvalidated per-hand landmark lists.
///
/// Only the first hand is validated, since the others are never looked at.
pub fn from_raw<L: AsRef<[Landmark]>>(hands: &[L]) -> Result<FingerStates, InvalidInput> {
    let hand = hands.first().map(|lms| Hand::new(lms.as_ref())).transpose()?;
    Ok(extract(hand.as_ref()))
}

#[cfg(test)]
mod tests {
    use crate::landmark::tests::flat_hand;
    use crate::test;

    use super::*;

    const EPS: f32 = 1e-4;

    fn hand_with(points: &[(LandmarkIdx, f32, f32)]) -> Hand {
        let mut lms = flat_hand();
        for &(idx, x, y) in points {
            lms[idx.index()] = Landmark::new(x, y);
        }
        Hand::new(&lms).unwrap()
    }

    #[test]
    fn no_hands_means_closed() {
        assert_eq!(extract(&[]), FingerStates::CLOSED);
        assert_eq!(extract(None), FingerStates::CLOSED);
        assert_eq!(extract(Vec::new().iter()), FingerStates::CLOSED);
        assert_eq!(from_raw::<Vec<Landmark>>(&[]), Ok(FingerStates::CLOSED));
        assert_eq!(extract(None).to_array(), [0, 0, 0, 0, 0]);
    }

    #[test]
    fn vertical_fingers() {
        for finger in &Finger::ALL[1..] {
            let pip = finger.pip();
            let tip = finger.tip();

            let above = hand_with(&[(pip, 0.5, 0.5), (tip, 0.5, 0.5 - EPS)]);
            let states = extract(Some(&above));
            assert!(states.is_extended(*finger), "{finger:?} should be extended");
            assert_eq!(states.count(), 1, "{states}");

            let below = hand_with(&[(pip, 0.5, 0.5), (tip, 0.5, 0.5 + EPS)]);
            assert!(!extract(Some(&below)).is_extended(*finger));

            // Equal heights are not "above".
            let level = hand_with(&[(pip, 0.5, 0.5), (tip, 0.2, 0.5)]);
            assert!(!extract(Some(&level)).is_extended(*finger));
        }
    }

    fn thumb_hand(palm: (f32, f32)) -> Hand {
        hand_with(&[
            (LandmarkIdx::ThumbCmc, 0.0, 0.0),
            (LandmarkIdx::ThumbIp, 0.0, 0.05),
            (LandmarkIdx::ThumbTip, 0.0, 0.12),
            (LandmarkIdx::MiddleFingerMcp, palm.0, palm.1),
        ])
    }

    #[test]
    fn thumb_extended() {
        let states = extract(Some(&thumb_hand((0.3, 0.3))));
        assert!(states[Finger::Thumb]);
    }

    #[test]
    fn thumb_curled_across_palm() {
        let states = extract(Some(&thumb_hand((0.0, 0.10))));
        assert!(!states[Finger::Thumb]);
    }

    #[test]
    fn thumb_barely_bent() {
        // tip is farther from the CMC than the IP joint, but by less than 10%
        let hand = hand_with(&[
            (LandmarkIdx::ThumbCmc, 0.0, 0.0),
            (LandmarkIdx::ThumbIp, 0.0, 0.10),
            (LandmarkIdx::ThumbTip, 0.0, 0.105),
            (LandmarkIdx::MiddleFingerMcp, 0.5, 0.5),
        ]);
        assert!(!extract(Some(&hand))[Finger::Thumb]);

        let lenient = Extractor::with_thresholds(Thresholds {
            thumb_extension_ratio: 1.0,
            ..Thresholds::default()
        });
        assert!(lenient.extract(Some(&hand))[Finger::Thumb]);
    }

    #[test]
    fn only_first_hand_counts() {
        let open = test::open_palm();
        let fist = test::closed_fist();
        assert_eq!(extract(&[fist.clone(), open.clone()]), FingerStates::CLOSED);
        assert_eq!(extract(&[open, fist]), FingerStates::OPEN);
    }

    #[test]
    fn fixtures() {
        assert_eq!(extract(Some(&test::open_palm())).to_array(), [1, 1, 1, 1, 1]);
        assert_eq!(extract(Some(&test::closed_fist())).to_array(), [0, 0, 0, 0, 0]);
    }

    #[test]
    fn random_hands_stay_in_range() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..1000 {
            let lms: Vec<_> = (0..LandmarkIdx::COUNT)
                .map(|_| Landmark::new(rng.f32(), rng.f32()))
                .collect();
            let states = extract(Some(&Hand::new(&lms).unwrap()));
            assert!(states.to_array().iter().all(|v| *v <= 1));
            assert!(states.count() <= 5);
            assert_eq!(states.to_string().len(), 5);
        }
    }

    #[test]
    fn raw_input_is_validated() {
        let short = vec![flat_hand()[..4].to_vec()];
        assert_eq!(
            from_raw(&short),
            Err(InvalidInput::MissingLandmark {
                index: LandmarkIdx::ThumbTip,
                len: 4
            })
        );

        // Only the first hand is looked at.
        let hands = vec![test::open_palm().landmarks().to_vec(), Vec::new()];
        assert_eq!(from_raw(&hands), Ok(FingerStates::OPEN));
    }

    #[test]
    fn display() {
        let mut states = FingerStates::CLOSED;
        states.set(Finger::Index, true);
        states.set(Finger::Middle, true);
        assert_eq!(states.to_string(), "01100");
        assert_eq!(states.count(), 2);
        assert_eq!(
            states.iter().filter(|(_, e)| *e).map(|(f, _)| f).collect::<Vec<_>>(),
            [Finger::Index, Finger::Middle]
        );
    }
}
