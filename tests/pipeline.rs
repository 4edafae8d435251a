//! Replays recorded engine output through a session and checks what reaches the device.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use fingerlink::{
    config::Config,
    fingers::FingerStates,
    gesture::{Category, Recognition},
    landmark::Landmark,
    readout::Status,
    recognizer::{JsonLines, Scripted},
    session::{RunSummary, Session},
    transport::{QueueOptions, Transport},
    wire::Decoder,
};

/// The device end of the serial link.
#[derive(Clone, Default)]
struct Device(Arc<Mutex<Vec<u8>>>);

impl Write for Device {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Device {
    fn received(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

fn session(config: &Config, device: &Device) -> Session {
    let transport =
        Transport::from_writer("device", device.clone(), QueueOptions::default()).unwrap();
    Session::new(config, Some(transport))
}

fn hand(json: &str) -> Vec<Landmark> {
    serde_json::from_str(json).unwrap()
}

fn frame(ts: f64, landmarks: Vec<Landmark>, gesture: &str) -> Recognition {
    Recognition {
        timestamp_ms: ts,
        landmarks: vec![landmarks],
        gestures: vec![vec![Category::new(gesture, 0.9)]],
        handednesses: vec![vec![Category::new("Right", 0.95)]],
    }
}

#[test]
fn replay_recording() {
    fingerlink::init_logger!();

    let device = Device::default();
    let mut session = session(&Config::default(), &device);
    let mut rec = JsonLines::open(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/session.jsonl"
    ))
    .unwrap();
    let mut shown: Vec<Status> = Vec::new();

    let summary = session.run(&mut rec, &mut shown).unwrap();
    session.finish();

    assert_eq!(
        summary,
        RunSummary {
            processed: 4,
            duplicates: 1,
            invalid: 0,
        }
    );
    // Nothing is sent for the empty frame, and the last frame's open hand is overridden by the
    // classifier's "Closed_Fist".
    assert_eq!(device.received(), b"$11111$00000$00000");

    let counts: Vec<_> = shown.iter().map(|s| s.finger_count).collect();
    assert_eq!(counts, [5, 0, 0]);
    let hands: Vec<_> = shown.iter().map(|s| s.hand.as_str()).collect();
    assert_eq!(hands, ["Right", "Right", "Left"]);
}

#[test]
fn open_palm_end_to_end() {
    let device = Device::default();
    let mut session = session(&Config::default(), &device);
    let mut engine = Scripted::new([frame(
        10.0,
        hand(include_str!("data/open_palm.json")),
        "Open_Palm",
    )]);
    let mut shown: Vec<Status> = Vec::new();

    session.run(&mut engine, &mut shown).unwrap();
    session.finish();

    let states = Decoder::new().feed(&device.received());
    assert_eq!(states, [FingerStates::OPEN]);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].finger_count, 5);
    assert!(shown[0].to_string().ends_with("fingers: 5"), "{}", shown[0]);
}

#[test]
fn closed_fist_end_to_end() {
    let device = Device::default();
    let mut session = session(&Config::default(), &device);
    let mut engine = Scripted::new([frame(
        10.0,
        hand(include_str!("data/closed_fist.json")),
        "Closed_Fist",
    )]);
    let mut shown: Vec<Status> = Vec::new();

    session.run(&mut engine, &mut shown).unwrap();
    session.finish();

    assert_eq!(device.received(), b"$00000");
    assert_eq!(shown[0].finger_count, 0);
}

#[test]
fn malformed_frames_are_skipped() {
    let device = Device::default();
    let mut session = session(&Config::default(), &device);
    let open = hand(include_str!("data/open_palm.json"));
    let mut engine = Scripted::new([
        frame(1.0, open[..9].to_vec(), "Open_Palm"),
        frame(2.0, open, "Open_Palm"),
    ]);

    let summary = session.run(&mut engine, &mut Vec::<Status>::new()).unwrap();
    session.finish();

    assert_eq!(summary.invalid, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(device.received(), b"$11111");
}

#[test]
fn overlay_is_rendered() {
    let config = Config {
        overlay_size: Some("64x48".parse().unwrap()),
        ..Config::default()
    };
    let mut session = Session::new(&config, None);
    let mut engine = Scripted::new([frame(
        10.0,
        hand(include_str!("data/open_palm.json")),
        "Open_Palm",
    )]);

    session.run(&mut engine, &mut Vec::<Status>::new()).unwrap();

    let overlay = session.overlay().unwrap();
    assert_eq!(overlay.dimensions(), (64, 48));
    assert!(overlay.pixels().any(|p| p.0 != [0, 0, 0]));
    session.finish();
}
