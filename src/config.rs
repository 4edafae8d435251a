//! Runtime configuration.

use std::{fs, path::Path, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::fingers::Thresholds;
use crate::locale::Locale;
use crate::transport::{QueueOptions, Transport};

/// Everything that can be configured about a session.
///
/// Missing fields in a configuration file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the serial port to stream finger states to. No data is sent if unset.
    pub serial_port: Option<String>,
    pub baud_rate: u32,
    pub queue: QueueOptions,
    pub locale: Locale,
    /// Swap left and right hands when displaying handedness.
    pub mirror_handedness: bool,
    pub thumb_extension_ratio: f32,
    pub thumb_palm_clearance: f32,
    /// Size of the overlay canvas in pixels. No overlay is rendered if unset.
    pub overlay_size: Option<OverlaySize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial_port: None,
            baud_rate: Transport::DEFAULT_BAUD_RATE,
            queue: QueueOptions::default(),
            locale: Locale::default(),
            mirror_handedness: true,
            thumb_extension_ratio: Thresholds::DEFAULT_THUMB_EXTENSION_RATIO,
            thumb_palm_clearance: Thresholds::DEFAULT_THUMB_PALM_CLEARANCE,
            overlay_size: None,
        }
    }
}

impl Config {
    /// Loads a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config file '{}'", path.display()))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            thumb_extension_ratio: self.thumb_extension_ratio,
            thumb_palm_clearance: self.thumb_palm_clearance,
        }
    }
}

/// Width and height of a canvas, written as `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySize {
    pub width: u32,
    pub height: u32,
}

impl Default for OverlaySize {
    /// The size of the camera preview.
    fn default() -> Self {
        Self {
            width: 480,
            height: 360,
        }
    }
}

impl FromStr for OverlaySize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("invalid size '{s}', expected WIDTHxHEIGHT");
        let (w, h) = s.split_once('x').ok_or_else(err)?;
        let width = w.trim().parse().map_err(|_| err())?;
        let height = h.trim().parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self { width, height })
    }
}

#[cfg(test)]
mod tests {
    use crate::worker::Overflow;

    use super::*;

    #[test]
    fn partial_config_file() {
        let config: Config = serde_json::from_str(
            r#"{
                "serial_port": "/dev/ttyACM0",
                "locale": "es",
                "queue": { "overflow": "drop-newest" },
                "overlay_size": { "width": 640, "height": 480 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.serial_port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.locale, Locale::Es);
        assert_eq!(config.queue.overflow, Overflow::DropNewest);
        assert_eq!(config.queue.capacity, QueueOptions::DEFAULT_CAPACITY);
        assert!(config.mirror_handedness);
        assert_eq!(config.thresholds(), Thresholds::default());
        assert_eq!(
            config.overlay_size,
            Some(OverlaySize {
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_json::from_str::<Config>(r#"{"baudrate": 115200}"#).is_err());
    }

    #[test]
    fn parse_overlay_size() {
        assert_eq!(
            "480x360".parse::<OverlaySize>(),
            Ok(OverlaySize::default())
        );
        assert!("480".parse::<OverlaySize>().is_err());
        assert!("0x360".parse::<OverlaySize>().is_err());
        assert!("axb".parse::<OverlaySize>().is_err());
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load("/nonexistent/fingerlink.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/fingerlink.json"));
    }
}
