//! External command execution.
//!
//! Commands are run to completion with stdout and stderr streamed line by
//! line into an [`OutputSink`]. A run succeeds only when the process exits
//! with code zero **and** never wrote a non-empty line to stderr.

mod command;

pub use command::{CommandLine, SECRET_MASK};

use crate::error::CommandError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

/// Receives output lines as a command produces them.
pub trait OutputSink: Send + Sync {
    /// A line written to stdout
    fn output(&self, line: &str);

    /// A line written to stderr
    fn error(&self, line: &str);
}

/// Forwards stdout to `info!` and stderr to `error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn output(&self, line: &str) {
        log::info!("{}", line);
    }

    fn error(&self, line: &str) {
        log::error!("{}", line);
    }
}

/// Outcome of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code zero and nothing on stderr
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured stdout, one line per entry
    pub stdout: Vec<String>,
    /// Captured non-empty stderr lines
    pub stderr: Vec<String>,
}

impl CommandResult {
    /// Classify a finished process.
    ///
    /// Empty stderr lines are ignored; any other stderr line, whitespace
    /// included, fails the run regardless of the exit code.
    pub fn classify(exit_code: Option<i32>, stdout: Vec<String>, stderr: Vec<String>) -> Self {
        let stderr: Vec<String> = stderr
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect();
        let success = stderr.is_empty() && exit_code == Some(0);

        Self {
            success,
            exit_code,
            stdout,
            stderr,
        }
    }
}

/// Runs external commands.
///
/// The pipeline only talks to this trait so it can be driven by a fake in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion, streaming its output into `sink`.
    ///
    /// Returns `Err` only when the process could not be started or awaited;
    /// a process that ran and failed is an `Ok` result with `success == false`.
    async fn run(
        &self,
        command: &CommandLine,
        sink: &dyn OutputSink,
    ) -> Result<CommandResult, CommandError>;
}

/// [`CommandRunner`] backed by real subprocesses.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Runner without a timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: &CommandLine,
        sink: &dyn OutputSink,
    ) -> Result<CommandResult, CommandError> {
        sink.output(command.display());

        let mut child = Command::new(command.program())
            .args(command.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::SpawnFailed {
                command: command.display().to_string(),
                source,
            })?;

        let completion = wait_streaming(&mut child, sink);

        let finished = match self.timeout {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, completion).await;
                match timed {
                    Ok(finished) => finished,
                    Err(_elapsed) => {
                        if let Err(e) = child.kill().await {
                            log::warn!("Failed to kill '{}': {}", command.display(), e);
                        }
                        return Err(CommandError::TimedOut {
                            command: command.display().to_string(),
                            seconds: limit.as_secs(),
                        });
                    }
                }
            }
            None => completion.await,
        };

        let (exit_code, stdout, stderr) = finished.map_err(|source| CommandError::WaitFailed {
            command: command.display().to_string(),
            source,
        })?;

        Ok(CommandResult::classify(exit_code, stdout, stderr))
    }
}

/// Drain both pipes concurrently, then reap the child.
async fn wait_streaming(
    child: &mut Child,
    sink: &dyn OutputSink,
) -> std::io::Result<(Option<i32>, Vec<String>, Vec<String>)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr) = tokio::join!(
        read_lines(stdout, |line| sink.output(line)),
        read_lines(stderr, |line| sink.error(line)),
    );

    let status = child.wait().await?;
    let stdout = stdout.unwrap_or_else(|(lines, e)| {
        log::warn!("Failed reading command output: {}", e);
        lines
    });
    let stderr = stderr.unwrap_or_else(|(mut lines, e)| {
        let line = format!("failed reading error output: {}", e);
        sink.error(&line);
        lines.push(line);
        lines
    });
    Ok((status.code(), stdout, stderr))
}

/// Forward and capture every non-empty line until EOF.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the read,
/// so the pipe is always drained. On a read error the lines seen so far are
/// returned alongside it.
async fn read_lines<R, F>(
    pipe: Option<R>,
    forward: F,
) -> Result<Vec<String>, (Vec<String>, std::io::Error)>
where
    R: AsyncRead + Unpin,
    F: Fn(&str),
{
    let mut captured = Vec::new();
    let Some(pipe) = pipe else {
        return Ok(captured);
    };

    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return Ok(captured),
            Ok(_) => {}
            Err(e) => return Err((captured, e)),
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches('\n');
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        forward(line);
        captured.push(line.to_string());
    }
}
