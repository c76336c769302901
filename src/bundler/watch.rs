//! Handle to a running esbuild watch process.

use crate::bundler::error::Result;
use crate::bundler::process::WatchProcess;
use crate::bundler::settings::DEFAULT_STOP_GRACE;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

/// A live watch build and the dependency root it reads from.
///
/// [`stop`](Self::stop) ends the process; calling it again does nothing.
/// The dependency root is left in place. Dropping a session that was not
/// stopped kills the process.
#[derive(Debug)]
pub struct WatchSession {
    process: Option<WatchProcess>,
    work_dir: PathBuf,
    stop_grace: Duration,
}

impl WatchSession {
    pub(crate) fn new(process: WatchProcess, work_dir: PathBuf) -> Self {
        Self {
            process: Some(process),
            work_dir,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Sets the time the process gets to exit after the termination signal.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Dependency root the session builds from.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// `<work_dir>/dist`
    pub fn dist(&self) -> PathBuf {
        self.work_dir.join("dist")
    }

    /// OS process id while running.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(WatchProcess::id)
    }

    /// Whether the process is still alive.
    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            Some(process) => matches!(process.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Waits until the process exits by itself. Returns `None` once stopped.
    pub async fn wait(&mut self) -> Result<Option<ExitStatus>> {
        match self.process.as_mut() {
            Some(process) => Ok(Some(process.wait().await?)),
            None => Ok(None),
        }
    }

    /// Stops event delivery and terminates the process.
    ///
    /// Sends SIGTERM (Unix) and waits for the grace period before killing.
    /// Returns the exit status on the first call and `None` afterwards.
    pub async fn stop(&mut self) -> Result<Option<ExitStatus>> {
        let Some(process) = self.process.take() else {
            log::debug!("Watch session already stopped");
            return Ok(None);
        };

        log::debug!("Stopping watch session in {}", self.work_dir.display());
        let status = process.terminate(self.stop_grace).await?;
        log::debug!("Watch session stopped: {}", status);
        Ok(Some(status))
    }
}
