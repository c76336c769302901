//! esbuild subprocess supervision.
//!
//! One-shot runs capture stdout and stderr as one text in arrival order and
//! are bounded by a timeout. Watch runs return immediately with a
//! [`WatchProcess`]; a reader task decodes the event stream into
//! [`WatchEvent`]s and a blocking dispatcher hands them to the listener.

mod decoder;
mod events;
mod listener;

pub use decoder::{EventDecoder, EventFormat};
pub use events::{BuildEvent, BuildOutcome, Location, Problem, WatchEvent};
pub use listener::BuildEventListener;

use crate::bundler::error::ExecutionError;
use crate::bundler::settings::{DEFAULT_RUN_TIMEOUT, EsBuildConfig};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Result<T> = std::result::Result<T, ExecutionError>;

/// How long to keep collecting buffered output once the process is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Exit status and combined output of a one-shot run.
#[derive(Debug, Clone)]
pub struct ExecuteResult {
    status: ExitStatus,
    output: String,
}

impl ExecuteResult {
    /// Process exit status.
    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// stdout and stderr lines interleaved in arrival order.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs an esbuild executable inside a work directory.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    executable: PathBuf,
    work_dir: PathBuf,
    run_timeout: Duration,
    event_format: EventFormat,
}

impl ProcessSupervisor {
    /// Creates a supervisor running `executable` with `work_dir` as its
    /// current directory.
    pub fn new(executable: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            work_dir: work_dir.into(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
            event_format: EventFormat::default(),
        }
    }

    /// Bounds one-shot runs; the process is killed when it elapses.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Sets how watch output is decoded.
    pub fn with_event_format(mut self, format: EventFormat) -> Self {
        self.event_format = format;
        self
    }

    /// Executable being supervised.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, config: &EsBuildConfig) -> Command {
        let args = config.to_args();
        log::debug!("Running {} {}", self.executable.display(), args.join(" "));

        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn(&self, config: &EsBuildConfig) -> Result<Child> {
        self.command(config)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                executable: self.executable.clone(),
                source,
            })
    }

    /// Runs esbuild to completion.
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// [`ExecuteResult::status`] and the output directory.
    pub async fn run_once(&self, config: &EsBuildConfig) -> Result<ExecuteResult> {
        let mut child = self.spawn(config)?;

        let (tx, mut lines) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx));
        }

        let deadline = tokio::time::Instant::now() + self.run_timeout;
        let mut output = String::new();

        let waited = loop {
            tokio::select! {
                Some(line) = lines.recv() => push_line(&mut output, &line),
                status = child.wait() => break Some(status),
                _ = tokio::time::sleep_until(deadline) => break None,
            }
        };

        let status = match waited {
            Some(Ok(status)) => status,
            Some(Err(source)) => {
                return Err(ExecutionError::Wait {
                    executable: self.executable.clone(),
                    source,
                });
            }
            None => {
                log::warn!(
                    "esbuild timed out after {}s, terminating...",
                    self.run_timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill esbuild process: {}", e);
                }
                drain(&mut lines, &mut output).await;
                return Err(ExecutionError::Timeout {
                    seconds: self.run_timeout.as_secs(),
                    output,
                });
            }
        };

        // Pipes may still hold lines written just before exit
        drain(&mut lines, &mut output).await;

        log::debug!("esbuild exited with {}", status);
        Ok(ExecuteResult { status, output })
    }

    /// Starts esbuild in watch mode and returns without waiting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run_watched<L: BuildEventListener>(
        &self,
        config: &EsBuildConfig,
        listener: L,
    ) -> Result<WatchProcess> {
        let mut child = self.spawn(config)?;
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let reader = if self.event_format.reads_stdout() {
            if let Some(stderr) = stderr {
                tokio::spawn(log_lines(stderr, cancel.clone()));
            }
            stdout.map(|s| tokio::spawn(read_events(s, self.event_format, tx, cancel.clone())))
        } else {
            if let Some(stdout) = stdout {
                tokio::spawn(log_lines(stdout, cancel.clone()));
            }
            stderr.map(|s| tokio::spawn(read_events(s, self.event_format, tx, cancel.clone())))
        };

        let dispatcher = listener::spawn_dispatcher(rx, listener, cancel.clone());

        log::debug!(
            "esbuild watching (pid {:?}, {:?} events)",
            child.id(),
            self.event_format
        );
        Ok(WatchProcess {
            child,
            executable: self.executable.clone(),
            cancel,
            reader,
            dispatcher,
        })
    }
}

/// Live esbuild watch process with its reader and dispatcher tasks.
///
/// Dropping it kills the process.
#[derive(Debug)]
pub struct WatchProcess {
    child: Child,
    executable: PathBuf,
    cancel: CancellationToken,
    reader: Option<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
}

impl WatchProcess {
    /// OS process id, while the process is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether event delivery has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops event delivery. In-flight delivery may complete.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Exit status if the process has already exited.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.child.try_wait().map_err(|source| ExecutionError::Wait {
            executable: self.executable.clone(),
            source,
        })
    }

    /// Waits for the process to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.child.wait().await.map_err(|source| ExecutionError::Wait {
            executable: self.executable.clone(),
            source,
        })
    }

    /// Cancels delivery, asks the process to exit, and kills it if it is
    /// still running after `grace`.
    pub async fn terminate(mut self, grace: Duration) -> Result<ExitStatus> {
        self.cancel.cancel();

        if let Some(status) = self.try_wait()? {
            self.finish_reader().await;
            return Ok(status);
        }

        request_exit(&mut self.child);
        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(waited) => waited.map_err(|source| ExecutionError::Wait {
                executable: self.executable.clone(),
                source,
            })?,
            Err(_elapsed) => {
                log::warn!(
                    "esbuild did not exit within {}ms, killing",
                    grace.as_millis()
                );
                if let Err(e) = self.child.kill().await {
                    log::warn!("Failed to kill esbuild process: {}", e);
                }
                self.wait().await?
            }
        };

        self.finish_reader().await;
        if !self.dispatcher.is_finished() {
            log::debug!("Listener still running; no further events will be delivered");
        }
        Ok(status)
    }

    async fn finish_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                log::debug!("Event reader ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for WatchProcess {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.start_kill() {
                log::debug!("Failed to kill esbuild on drop: {}", e);
            }
        }
    }
}

/// SIGTERM on Unix; elsewhere there is no graceful request, so kill.
#[cfg(unix)]
fn request_exit(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        log::debug!("SIGTERM to esbuild (pid {}) failed: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        log::debug!("Failed to kill esbuild: {}", e);
    }
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}

async fn drain(lines: &mut mpsc::UnboundedReceiver<String>, output: &mut String) {
    let deadline = tokio::time::Instant::now() + DRAIN_GRACE;
    while let Ok(Some(line)) = tokio::time::timeout_at(deadline, lines.recv()).await {
        push_line(output, &line);
    }
}

/// Reads `reader` line by line, tolerating invalid UTF-8. Returns `None` at
/// end of stream or on a read error.
async fn next_line<R: AsyncRead + Unpin>(reader: &mut BufReader<R>, buf: &mut Vec<u8>) -> Option<String> {
    buf.clear();
    match reader.read_until(b'\n', buf).await {
        Ok(0) => None,
        Ok(_) => Some(
            String::from_utf8_lossy(buf)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        ),
        Err(e) => {
            log::debug!("Failed to read esbuild output: {}", e);
            None
        }
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(stream: R, tx: UnboundedSender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    while let Some(line) = next_line(&mut reader, &mut buf).await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// Logs the stream that carries no events so its pipe never fills.
async fn log_lines<R: AsyncRead + Unpin>(stream: R, cancel: CancellationToken) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = next_line(&mut reader, &mut buf) => match line {
                Some(line) => log::debug!("esbuild: {}", line),
                None => break,
            },
        }
    }
}

async fn read_events<R: AsyncRead + Unpin>(
    stream: R,
    format: EventFormat,
    tx: UnboundedSender<WatchEvent>,
    cancel: CancellationToken,
) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut decoder = EventDecoder::new(format);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = next_line(&mut reader, &mut buf) => {
                let Some(line) = line else { break };
                log::trace!("esbuild: {}", line);
                if let Some(event) = decoder.decode_line(&line) {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }
    }
    log::debug!("Event reader stopped");
}
