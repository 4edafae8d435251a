use std::{
    io::{self, BufReader},
    path::PathBuf,
};

use anyhow::{bail, Context};
use clap::Parser;
use fingerlink::{
    config::{Config, OverlaySize},
    locale::Locale,
    readout::LogReadout,
    recognizer::{JsonLines, Recognizer, Subprocess},
    session::Session,
    transport::Transport,
    worker::Overflow,
};

/// Streams the finger states of a tracked hand to a serial device.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON configuration file. Command line options override its values.
    #[arg(long, env = "FINGERLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Replay recognition results from a JSON lines file (`-` reads stdin).
    #[arg(long, env = "FINGERLINK_REPLAY", conflicts_with = "engine")]
    replay: Option<PathBuf>,

    /// Recognition engine command to run; it must print `READY`, then one JSON line per frame.
    #[arg(long, env = "FINGERLINK_ENGINE", num_args = 1.., allow_hyphen_values = true)]
    engine: Option<Vec<String>>,

    /// Serial port to stream finger states to.
    #[arg(long, env = "FINGERLINK_SERIAL_PORT")]
    serial_port: Option<String>,

    #[arg(long, env = "FINGERLINK_BAUD_RATE")]
    baud_rate: Option<u32>,

    /// Number of messages that may wait for the serial port.
    #[arg(long, env = "FINGERLINK_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,

    /// Which message to drop when the serial port falls behind.
    #[arg(long, env = "FINGERLINK_BACKPRESSURE", value_parser = parse_overflow)]
    backpressure: Option<Overflow>,

    /// Language of gesture and hand names (`en` or `es`).
    #[arg(long, env = "FINGERLINK_LOCALE")]
    locale: Option<Locale>,

    /// Swap left and right when displaying handedness.
    #[arg(long, env = "FINGERLINK_MIRROR_HANDEDNESS")]
    mirror_handedness: Option<bool>,

    /// Save the hand overlay of the last frame to this PNG file on exit.
    #[arg(long, env = "FINGERLINK_OVERLAY")]
    overlay: Option<PathBuf>,

    /// Size of the overlay canvas, as WIDTHxHEIGHT.
    #[arg(long, env = "FINGERLINK_OVERLAY_SIZE")]
    overlay_size: Option<OverlaySize>,
}

fn parse_overflow(s: &str) -> Result<Overflow, String> {
    match s {
        "drop-oldest" => Ok(Overflow::DropOldest),
        "drop-newest" => Ok(Overflow::DropNewest),
        _ => Err(format!(
            "unknown policy '{s}' (expected 'drop-oldest' or 'drop-newest')"
        )),
    }
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(port) = &self.serial_port {
            config.serial_port = Some(port.clone());
        }
        if let Some(baud_rate) = self.baud_rate {
            config.baud_rate = baud_rate;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue.capacity = capacity;
        }
        if let Some(overflow) = self.backpressure {
            config.queue.overflow = overflow;
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(mirror) = self.mirror_handedness {
            config.mirror_handedness = mirror;
        }
        if let Some(size) = self.overlay_size {
            config.overlay_size = Some(size);
        } else if self.overlay.is_some() && config.overlay_size.is_none() {
            config.overlay_size = Some(OverlaySize::default());
        }

        Ok(config)
    }

    fn recognizer(&self) -> anyhow::Result<Box<dyn Recognizer>> {
        if let Some(cmd) = &self.engine {
            let Some((program, args)) = cmd.split_first() else {
                bail!("`--engine` needs a command to run");
            };
            return Ok(Box::new(Subprocess::spawn(program, args)?));
        }

        match &self.replay {
            Some(path) if path.as_os_str() == "-" => {
                Ok(Box::new(JsonLines::new(BufReader::new(io::stdin()))))
            }
            Some(path) => Ok(Box::new(JsonLines::open(path)?)),
            None => bail!("no recognition source given, use `--replay` or `--engine`"),
        }
    }
}

/// Opens the configured serial port. A port that fails to open only disables transmission.
fn open_transport(config: &Config) -> Option<Transport> {
    let port = config.serial_port.as_deref()?;
    match Transport::open(port, config.baud_rate, config.queue) {
        Ok(transport) => Some(transport),
        Err(e) => {
            log::warn!("{e:#}");
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    fingerlink::init_logger!();

    let args = Args::parse();
    let config = args.config()?;
    log::debug!("{config:?}");

    let transport = open_transport(&config);
    let mut recognizer = args.recognizer()?;
    let mut session = Session::new(&config, transport);
    let mut readout = LogReadout::new();
    let summary = session.run(&mut recognizer, &mut readout)?;
    log::info!(
        "processed {} frames ({} repeated, {} malformed)",
        summary.processed,
        summary.duplicates,
        summary.invalid
    );

    if let (Some(path), Some(overlay)) = (&args.overlay, session.overlay()) {
        overlay
            .save(path)
            .with_context(|| format!("failed to save overlay to '{}'", path.display()))?;
        log::info!("overlay saved to '{}'", path.display());
    }

    session.finish();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_port_disables_transmission() {
        assert!(open_transport(&Config::default()).is_none());

        let config = Config {
            serial_port: Some("/dev/this-port-does-not-exist".into()),
            ..Config::default()
        };
        assert!(open_transport(&config).is_none());
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "fingerlink",
            "--replay",
            "-",
            "--baud-rate",
            "115200",
            "--backpressure",
            "drop-newest",
            "--overlay",
            "out.png",
        ]);
        let config = args.config().unwrap();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.queue.overflow, Overflow::DropNewest);
        assert_eq!(config.overlay_size, Some(OverlaySize::default()));
    }
}
