use crate::landmark::{Hand, Landmark};

fn load(json: &str) -> Hand {
    let lms: Vec<Landmark> = serde_json::from_str(json).unwrap();
    Hand::new(&lms).unwrap()
}

/// A right hand held up with all fingers spread.
pub fn open_palm() -> Hand {
    load(include_str!("../tests/data/open_palm.json"))
}

/// A fist with the thumb folded in front of the palm.
pub fn closed_fist() -> Hand {
    load(include_str!("../tests/data/closed_fist.json"))
}
