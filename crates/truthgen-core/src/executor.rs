//! Shell command execution under a deadline.
//!
//! The command string is an opaque trust boundary: it is handed to the host
//! shell verbatim (`sh -c` on Unix, `cmd /C` on Windows) and never parsed or
//! sanitized. Failures are classified into bracketed sentinels so they can be
//! embedded in the report instead of aborting the run.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TruthError};

/// Per-stream capture limit.
pub const MAX_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// Environment forced on every child so captured output carries no ANSI codes.
const PLAIN_OUTPUT_ENV: &[(&str, &str)] = &[
    ("NO_COLOR", "1"),
    ("FORCE_COLOR", "0"),
    ("CLICOLOR", "0"),
    ("CARGO_TERM_COLOR", "never"),
];

/// Why a command did not succeed. Variants are in sentinel priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    Timeout { secs: u64 },
    Killed { signal: String },
    NonZeroExit { code: i32, stdout: String, stderr: String },
    Invocation { message: String },
}

impl CommandFailure {
    /// Text stored in place of output.
    ///
    /// A non-zero exit that printed to stdout yields that stdout: validation
    /// commands often print their verdict and exit non-zero, and error
    /// detection works on content rather than exit codes.
    pub fn sentinel(&self) -> String {
        match self {
            CommandFailure::Timeout { secs } => format!("[TIMEOUT: Command exceeded {secs}s]"),
            CommandFailure::Killed { signal } => format!("[KILLED: Signal {signal}]"),
            CommandFailure::NonZeroExit {
                code,
                stdout,
                stderr,
            } => {
                let stdout = stdout.trim();
                let stderr = stderr.trim();
                if !stdout.is_empty() {
                    stdout.to_string()
                } else if !stderr.is_empty() {
                    format!("[STDERR: {}]", flatten(stderr))
                } else {
                    format!("[EXIT CODE: {code}]")
                }
            }
            CommandFailure::Invocation { message } => format!("[ERROR: {}]", flatten(message)),
        }
    }
}

/// Sentinels are single-line.
fn flatten(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs one command line and returns its output text.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with a wall-clock limit of `timeout_secs` (0 = unlimited).
    ///
    /// Returns trimmed stdout on success and a sentinel on failure, unless the
    /// runner is in fail-fast mode, where failures become
    /// [`TruthError::CommandFailed`].
    async fn run(&self, command: &str, timeout_secs: u64) -> Result<String>;
}

/// [`CommandRunner`] backed by the host shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    fail_fast: bool,
    max_buffer: usize,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_buffer: MAX_BUFFER_BYTES,
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise failures instead of returning sentinels.
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// Run and report the raw outcome without sentinel conversion.
    pub async fn execute(
        &self,
        command: &str,
        timeout_secs: u64,
    ) -> std::result::Result<String, CommandFailure> {
        let start = Instant::now();
        let mut cmd = shell_command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in PLAIN_OUTPUT_ENV {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| CommandFailure::Invocation {
            message: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let max_buffer = self.max_buffer;

        let collected = {
            let collect = async {
                let (out, err) = tokio::try_join!(
                    read_capped(stdout, max_buffer),
                    read_capped(stderr, max_buffer)
                )?;
                let status = child.wait().await?;
                Ok::<_, io::Error>((out, err, status))
            };

            if timeout_secs > 0 {
                tokio::time::timeout(Duration::from_secs(timeout_secs), collect).await
            } else {
                Ok(collect.await)
            }
        };

        let outcome = match collected {
            Err(_elapsed) => {
                let _ = child.kill().await;
                Err(CommandFailure::Timeout { secs: timeout_secs })
            }
            Ok(Err(e)) => {
                let _ = child.kill().await;
                Err(CommandFailure::Invocation {
                    message: e.to_string(),
                })
            }
            Ok(Ok((out, err, status))) => classify_exit(status, out, err),
        };

        debug!(
            command = %command,
            duration_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Command finished"
        );
        outcome
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn run(&self, command: &str, timeout_secs: u64) -> Result<String> {
        match self.execute(command, timeout_secs).await {
            Ok(output) => Ok(output),
            Err(failure) if self.fail_fast => Err(TruthError::CommandFailed {
                command: command.to_string(),
                message: failure.sentinel(),
            }),
            Err(failure) => Ok(failure.sentinel()),
        }
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    // raw_arg skips MSVC argv quoting, which cmd.exe does not undo
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").raw_arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

async fn read_capped<R>(reader: Option<R>, cap: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return Ok(buf);
    };
    let read = reader.take(cap as u64 + 1).read_to_end(&mut buf).await?;
    if read > cap {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("output exceeded {cap} bytes"),
        ));
    }
    Ok(buf)
}

fn classify_exit(
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
) -> std::result::Result<String, CommandFailure> {
    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    if status.success() {
        return Ok(stdout.trim().to_string());
    }

    if let Some(signal) = exit_signal(&status) {
        return Err(CommandFailure::Killed { signal });
    }

    Err(CommandFailure::NonZeroExit {
        code: status.code().unwrap_or(-1),
        stdout,
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|sig| {
        let name = match sig {
            1 => "SIGHUP",
            2 => "SIGINT",
            3 => "SIGQUIT",
            6 => "SIGABRT",
            9 => "SIGKILL",
            11 => "SIGSEGV",
            13 => "SIGPIPE",
            14 => "SIGALRM",
            15 => "SIGTERM",
            _ => return format!("SIG{sig}"),
        };
        name.to_string()
    })
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<String> {
    None
}
