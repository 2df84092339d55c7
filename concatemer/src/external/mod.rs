//! Process-backed collaborators.
//!
//! Every tool runs inside the workspace of the read. Its standard error goes to `<tool>.log`
//! in the workspace, and failures are classified into [ToolFailure] kinds.
use crate::error::{ConcatemerError, Result, ToolFailure};
use crate::workspace::Workspace;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

pub mod minimap2;
pub mod poa;
pub mod racon;
pub mod water;

pub use minimap2::Minimap2;
pub use poa::Poa;
pub use racon::Racon;
pub use water::Water;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// An executable and its time budget.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    name: &'static str,
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new<P: AsRef<Path>>(name: &'static str, program: P, timeout: Option<Duration>) -> Self {
        Self {
            name,
            program: program.as_ref().to_path_buf(),
            timeout,
        }
    }
    fn error(&self, kind: ToolFailure, detail: impl Into<String>) -> ConcatemerError {
        ConcatemerError::tool(self.name, kind, detail)
    }
    /// Run the tool in `ws`. The standard output goes to `stdout` if given, and is discarded otherwise.
    pub fn run<I, S>(&self, args: I, ws: &Workspace, stdout: Option<&Path>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let log = ws.file(&format!("{}.log", self.name));
        let stdout = match stdout {
            Some(path) => Stdio::from(File::create(path)?),
            None => Stdio::null(),
        };
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(ws.path())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::from(File::create(&log)?));
        trace!("RUN\t{:?}", command);
        let mut child = command
            .spawn()
            .map_err(|e| self.error(ToolFailure::Spawn, format!("{:?}: {}", self.program, e)))?;
        let status = match self.timeout {
            Some(timeout) => self.wait_timeout(&mut child, timeout)?,
            None => child.wait()?,
        };
        if !status.success() {
            let detail = format!("{} ({})", status, log_tail(&log));
            return Err(self.error(ToolFailure::NonZeroExit, detail));
        }
        Ok(())
    }
    fn wait_timeout(&self, child: &mut std::process::Child, timeout: Duration) -> Result<ExitStatus> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if timeout <= start.elapsed() {
                child.kill()?;
                child.wait()?;
                let detail = format!("killed after {} seconds", timeout.as_secs_f64());
                return Err(self.error(ToolFailure::TimedOut, detail));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Last line of a log file, for error messages.
fn log_tail(path: &Path) -> String {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|log| log.lines().rev().find(|l| !l.trim().is_empty()).map(String::from))
        .unwrap_or_default()
}
