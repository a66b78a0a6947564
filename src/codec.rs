//! Invocation of the external codec program.
//!
//! The codec is a black box with a three-verb command line:
//!
//! | Verb | Meaning | Arguments |
//! |------|---------|-----------|
//! | `-e` | encode  | source image, destination compressed file |
//! | `-d` | decode  | source compressed file, destination image |
//! | `-c` | compare | image A, image B (pixel-exact) |
//!
//! Exit code `0` means success. [`CodecInvoker`] is the seam the batch
//! session talks to; [`ProcessInvoker`] is the real subprocess implementation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Codec command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Compress an image.
    Encode,
    /// Decompress to an image.
    Decode,
    /// Pixel-exact comparison of two images.
    Compare,
}

impl Verb {
    /// Command-line flag for this verb.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Encode => "-e",
            Self::Decode => "-d",
            Self::Compare => "-c",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode => write!(f, "encode"),
            Self::Decode => write!(f, "decode"),
            Self::Compare => write!(f, "compare"),
        }
    }
}

/// Captured outcome of one codec invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramResult {
    /// Everything the program wrote to stdout.
    pub stdout: String,
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ProgramResult {
    /// Create a new result.
    #[must_use]
    pub fn new(stdout: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code,
        }
    }

    /// Whether the program exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Something that can run a codec verb on two paths.
///
/// A non-zero exit code is returned as-is, not as an error; `Err` is reserved
/// for failing to run the codec at all.
pub trait CodecInvoker: Send + Sync {
    /// Run `verb` with `source` and `target` and wait for it to finish.
    fn invoke(&self, verb: Verb, source: &Path, target: &Path) -> Result<ProgramResult>;
}

/// Runs the codec as a child process.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: PathBuf,
}

impl ProcessInvoker {
    /// Create an invoker for the given codec program.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the codec program.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl CodecInvoker for ProcessInvoker {
    fn invoke(&self, verb: Verb, source: &Path, target: &Path) -> Result<ProgramResult> {
        debug!(
            program = %self.program.display(),
            verb = verb.flag(),
            source = %source.display(),
            target = %target.display(),
            "invoking codec"
        );

        // Arguments are passed as separate argv entries, so paths with spaces need no quoting.
        let output = Command::new(&self.program)
            .arg(verb.flag())
            .arg(source)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| Error::ProcessSpawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        Ok(ProgramResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
