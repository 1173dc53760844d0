// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF conversion via Ghostscript.
//
// Conversion shells out to `gs` as a black box.  The child process runs
// with a hard deadline: a hung or runaway converter is killed, and the
// spooled original is never touched regardless of what the converter does.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::info;

use papiertiger_core::error::{PrinterError, Result};

/// Poll interval while waiting on the converter child process.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts a spooled document into a PDF sitting next to it.
///
/// Narrow seam so tests can substitute a fake instead of spawning a real
/// process.
pub trait Convert: Send + Sync {
    /// Convert `input`, returning the path of the produced file.
    fn convert(&self, input: &Path) -> Result<PathBuf>;
}

/// Ghostscript-backed converter.
pub struct Ghostscript {
    program: String,
    timeout: Duration,
}

impl Ghostscript {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "gs".into(),
            timeout,
        }
    }

    /// Override the executable name (tests point this at a stand-in).
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Convert for Ghostscript {
    fn convert(&self, input: &Path) -> Result<PathBuf> {
        let output = input.with_extension("pdf");

        let mut child = Command::new(&self.program)
            .arg("-dSAFER")
            .arg("-dBATCH")
            .arg("-dNOPAUSE")
            .arg("-dQUIET")
            .arg("-sDEVICE=pdfwrite")
            .arg(format!("-sOutputFile={}", output.display()))
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PrinterError::ConversionFailure(format!(
                    "{} not found — install ghostscript to enable PDF conversion",
                    self.program
                )),
                _ => PrinterError::ConversionFailure(format!("spawn {}: {e}", self.program)),
            })?;

        let status = wait_bounded(&mut child, self.timeout)?;

        if !status.success() {
            let stderr = child
                .stderr
                .take()
                .and_then(|mut s| {
                    let mut buf = String::new();
                    std::io::Read::read_to_string(&mut s, &mut buf).ok()?;
                    Some(buf)
                })
                .unwrap_or_default();
            return Err(PrinterError::ConversionFailure(format!(
                "{} exited with {status}: {}",
                self.program,
                stderr.trim()
            )));
        }

        info!(output = %output.display(), "converted to PDF");
        Ok(output)
    }
}

/// Wait for a child process, killing it when the deadline passes.
fn wait_bounded(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| PrinterError::ConversionFailure(format!("wait: {e}")))?
        {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            // Best effort; the process may have exited in the meantime.
            child.kill().ok();
            child.wait().ok();
            return Err(PrinterError::ConversionFailure(format!(
                "converter timed out after {}s and was killed",
                timeout.as_secs()
            )));
        }
        std::thread::sleep(WAIT_POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_conversion_failure() {
        let gs = Ghostscript::with_program(
            "papiertiger-no-such-binary",
            Duration::from_secs(1),
        );
        let result = gs.convert(Path::new("/tmp/input.ps"));
        assert!(matches!(result, Err(PrinterError::ConversionFailure(_))));
    }

    #[test]
    fn wait_bounded_kills_overrunning_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::null())
            .spawn()
            .expect("spawn sleep");

        let start = Instant::now();
        let result = wait_bounded(&mut child, Duration::from_millis(200));
        assert!(matches!(result, Err(PrinterError::ConversionFailure(_))));
        // Came back promptly after the deadline, not after 30s.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn wait_bounded_returns_fast_exit_status() {
        let mut child = Command::new("true").spawn().expect("spawn true");
        let status = wait_bounded(&mut child, Duration::from_secs(5)).expect("wait");
        assert!(status.success());
    }

    #[test]
    fn failing_converter_reports_exit_status() {
        // `false` exits nonzero regardless of the gs-style arguments.
        let gs = Ghostscript::with_program("false", Duration::from_secs(5));
        let result = gs.convert(Path::new("/tmp/input.ps"));
        assert!(matches!(result, Err(PrinterError::ConversionFailure(_))));
    }
}
