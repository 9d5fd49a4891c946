use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

const DEFAULT_DRAIN_GRACE_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One subprocess invocation: argv, working directory, stdin payload and deadline.
pub struct ProcessRequest {
    pub executable: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub stdin: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Error)]
pub enum ProcessExecutorError {
    #[error("process timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("failed to spawn '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("process io failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessExecutorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[async_trait]
/// Runs a subprocess to completion, capturing stdout and stderr separately.
///
/// Implementations must fail with [`ProcessExecutorError::Timeout`] when the
/// deadline passes, and must not leave the child running in that case.
pub trait ProcessExecutor: Send + Sync {
    async fn execute(&self, request: ProcessRequest) -> Result<ProcessOutput, ProcessExecutorError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// [`ProcessExecutor`] backed by `tokio::process`.
pub struct TokioProcessExecutor {
    drain_grace: Duration,
}

impl Default for TokioProcessExecutor {
    fn default() -> Self {
        Self {
            drain_grace: Duration::from_millis(DEFAULT_DRAIN_GRACE_MS),
        }
    }
}

impl TokioProcessExecutor {
    /// Overrides how long pipe readers may keep draining after a timeout kill.
    pub fn with_drain_grace(drain_grace: Duration) -> Self {
        Self { drain_grace }
    }
}

async fn spawn_with_text_file_busy_retry(
    command: &mut Command,
    executable: &str,
) -> Result<Child, ProcessExecutorError> {
    const MAX_TEXT_FILE_BUSY_RETRIES: u32 = 5;
    const TEXT_FILE_BUSY_ERRNO: i32 = 26;
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(error)
                if error.raw_os_error() == Some(TEXT_FILE_BUSY_ERRNO)
                    && attempt < MAX_TEXT_FILE_BUSY_RETRIES =>
            {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            Err(source) => {
                return Err(ProcessExecutorError::Spawn {
                    executable: executable.to_string(),
                    source,
                })
            }
        }
    }
}

async fn write_stdin(stdin: Option<ChildStdin>, payload: String) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(payload.as_bytes()).await {
        Ok(()) => stdin.shutdown().await,
        // The child may exit without consuming its input.
        Err(error) if error.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(error) => Err(error),
    }
}

async fn read_pipe<R>(pipe: Option<R>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

async fn join_pipe(task: &mut JoinHandle<std::io::Result<Vec<u8>>>) -> std::io::Result<String> {
    let bytes = task.await.map_err(std::io::Error::other)??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(unix)]
fn isolate_process_group(command: &mut Command) {
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_command: &mut Command) {}

/// Kills every process in the group led by `pid`, including background jobs
/// that outlived the child and still hold its pipes.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; `pgid` is the group created at spawn.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let error = std::io::Error::last_os_error();
        tracing::debug!(%error, pgid, "failed to signal subprocess group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn execute(&self, request: ProcessRequest) -> Result<ProcessOutput, ProcessExecutorError> {
        let mut command = Command::new(&request.executable);
        command
            .args(&request.args)
            .current_dir(&request.working_dir)
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        isolate_process_group(&mut command);
        let mut child = spawn_with_text_file_busy_retry(&mut command, &request.executable).await?;
        let pid = child.id();

        let writer = tokio::spawn(write_stdin(child.stdin.take(), request.stdin));
        let mut stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

        // The deadline covers the pipe drains too: a background job can keep
        // stdout open after the child itself has exited.
        let completed = tokio::time::timeout(request.timeout, async {
            let status = child.wait().await?;
            let stdout = join_pipe(&mut stdout_task).await?;
            let stderr = join_pipe(&mut stderr_task).await?;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match completed {
            Ok(outcome) => outcome?,
            Err(_) => {
                let timeout_ms = duration_ms(request.timeout);
                tracing::warn!(
                    executable = %request.executable,
                    timeout_ms,
                    "subprocess deadline exceeded; killing process group"
                );
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                if let Err(error) = child.kill().await {
                    tracing::debug!(%error, "subprocess already exited before kill");
                }
                writer.abort();
                let drained = tokio::time::timeout(self.drain_grace, async {
                    let _ = (&mut stdout_task).await;
                    let _ = (&mut stderr_task).await;
                })
                .await;
                if drained.is_err() {
                    stdout_task.abort();
                    stderr_task.abort();
                }
                return Err(ProcessExecutorError::Timeout { timeout_ms });
            }
        };

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => tracing::debug!(%error, "failed to deliver stdin to subprocess"),
            Err(error) => tracing::debug!(%error, "stdin writer task did not complete"),
        }

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}
