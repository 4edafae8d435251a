//! Interface to the hand gesture recognition engine.
//!
//! The engine itself (camera access, palm detection, landmark estimation, gesture classification)
//! runs outside of this crate. It delivers one [`Recognition`] per video frame, either as a
//! recording or live from a helper process, encoded as one JSON object per line:
//!
//! ```json
//! {"timestampMs": 33.3, "landmarks": [[{"x": 0.5, "y": 0.9, "z": 0.0}, ...]],
//!  "gestures": [[{"categoryName": "Open_Palm", "score": 0.91}]],
//!  "handednesses": [[{"categoryName": "Left", "displayName": "Left", "score": 0.97}]]}
//! ```

use std::{
    collections::VecDeque,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path,
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use anyhow::{bail, Context};

use crate::gesture::Recognition;

/// How the engine is being fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningMode {
    /// Independent still images.
    Image,
    /// Consecutive frames of a video stream, which lets the engine track hands between frames.
    Video,
}

impl RunningMode {
    fn as_str(self) -> &'static str {
        match self {
            RunningMode::Image => "IMAGE",
            RunningMode::Video => "VIDEO",
        }
    }
}

/// A source of per-frame recognition results.
pub trait Recognizer {
    /// Whether the engine has finished loading its models and can process frames.
    fn is_ready(&self) -> bool {
        true
    }

    /// Switches the engine's running mode.
    fn set_running_mode(&mut self, mode: RunningMode) -> anyhow::Result<()> {
        let _ = mode;
        Ok(())
    }

    /// Returns the result for the next available video frame.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> anyhow::Result<Option<Recognition>>;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn set_running_mode(&mut self, mode: RunningMode) -> anyhow::Result<()> {
        (**self).set_running_mode(mode)
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Recognition>> {
        (**self).next_frame()
    }
}

/// Reads recognition results from a stream of JSON lines.
///
/// Empty lines are skipped.
pub struct JsonLines<R> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> JsonLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }
}

impl JsonLines<BufReader<File>> {
    /// Opens a recording made from the engine's output.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Recognizer for JsonLines<R> {
    fn next_frame(&mut self) -> anyhow::Result<Option<Recognition>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            let rec = serde_json::from_str(line)
                .with_context(|| format!("malformed recognition result on line {}", self.line_no))?;
            return Ok(Some(rec));
        }
    }
}

/// A recognition engine running as a child process.
///
/// The process has to print `READY` on its own line once its models are loaded, followed by one
/// JSON line per processed frame. Running mode switches are sent to its stdin as
/// `MODE <IMAGE|VIDEO>` lines. The process is killed when this value is dropped.
pub struct Subprocess {
    child: Child,
    stdin: Option<ChildStdin>,
    frames: JsonLines<BufReader<ChildStdout>>,
}

impl Subprocess {
    /// Starts `program` and waits until it reports that it is ready.
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S]) -> anyhow::Result<Self> {
        log::info!("starting recognition engine `{program}`...");
        let mut child = Command::new(program)
            .args(args.iter().map(AsRef::as_ref))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start `{program}`"))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().context("engine stdout is not captured")?;
        let mut reader = BufReader::new(stdout);

        let mut ready = String::new();
        reader.read_line(&mut ready)?;
        if ready.trim() != "READY" {
            child.kill().ok();
            bail!("engine did not signal readiness, got: {:?}", ready.trim());
        }
        log::info!("recognition engine ready");

        Ok(Self {
            child,
            stdin,
            frames: JsonLines::new(reader),
        })
    }
}

impl Recognizer for Subprocess {
    fn set_running_mode(&mut self, mode: RunningMode) -> anyhow::Result<()> {
        let Some(stdin) = &mut self.stdin else {
            return Ok(());
        };
        match writeln!(stdin, "MODE {}", mode.as_str()).and_then(|()| stdin.flush()) {
            Ok(()) => Ok(()),
            // The engine doesn't have to listen; a closed stdin just means it never will.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("engine closed its stdin, not sending mode switches");
                self.stdin = None;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Recognition>> {
        self.frames.next_frame()
    }
}

impl Drop for Subprocess {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            log::debug!("failed to kill engine process: {e}");
        }
        self.child.wait().ok();
    }
}

/// A recognizer that replays a fixed list of results.
///
/// Reports itself as not ready while `ready` is `false`.
#[derive(Debug, Default)]
pub struct Scripted {
    pub frames: VecDeque<Recognition>,
    pub ready: bool,
    /// Every running mode switch requested so far.
    pub modes: Vec<RunningMode>,
}

impl Scripted {
    pub fn new(frames: impl IntoIterator<Item = Recognition>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ready: true,
            modes: Vec::new(),
        }
    }
}

impl Recognizer for Scripted {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn set_running_mode(&mut self, mode: RunningMode) -> anyhow::Result<()> {
        self.modes.push(mode);
        Ok(())
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Recognition>> {
        Ok(self.frames.pop_front())
    }
}
