//! One-shot subprocess execution with output capture and a timeout.
//!
//! Both external tools this server drives (the ScPL converter and
//! `shortcuts sign`) go through [`run`]. The child gets `kill_on_drop(true)`,
//! so a timed-out or cancelled call does not leave it running.

use std::fmt::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Max bytes kept from stdout (16 MB). A converter printing the shortcut to
/// stdout stays well under this.
const MAX_STDOUT: usize = 16 * 1024 * 1024;

/// Max bytes kept from stderr (64 KB).
const MAX_STDERR: usize = 64 * 1024;

/// Result of a finished process.
#[derive(Debug)]
pub struct Output {
    /// Exit code, or `-1` if the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    /// Lossy UTF-8, with a truncation notice when capped.
    pub stderr: String,
    /// Whether stdout exceeded [`MAX_STDOUT`] and was cut.
    pub stdout_truncated: bool,
    pub duration_ms: u64,
}

impl Output {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Best human-readable failure text: stderr, else stdout, else the exit code.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = String::from_utf8_lossy(&self.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exited with code {}", self.exit_code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The program could not be started (not found, permission denied).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The child started but waiting on it failed.
    #[error("process error: {0}")]
    Process(std::io::Error),
    #[error("{program} timed out after {timeout_ms} ms")]
    Timeout { program: String, timeout_ms: u64 },
}

/// Run `program args...` with stdin closed, capturing stdout and stderr.
pub async fn run(
    program: &str,
    args: &[String],
    working_dir: Option<&Path>,
    timeout_ms: u64,
) -> Result<Output, ExecError> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::Process(std::io::Error::other("stdout pipe missing")))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::Process(std::io::Error::other("stderr pipe missing")))?;

    let work = async {
        // Both pipes are drained concurrently so neither can fill and block the child
        let ((stdout_data, stdout_total), (stderr_data, stderr_total)) = tokio::join!(
            read_capped(&mut stdout, MAX_STDOUT),
            read_capped(&mut stderr, MAX_STDERR),
        );
        drop(stdout);
        drop(stderr);

        let status = child.wait().await.map_err(ExecError::Process)?;

        let mut stderr_text = String::from_utf8_lossy(&stderr_data).into_owned();
        if stderr_total > MAX_STDERR {
            let _ = write!(
                stderr_text,
                "\n[truncated: {stderr_total} bytes total, showing first {MAX_STDERR}]"
            );
        }

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        Ok::<_, ExecError>(Output {
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout_data,
            stderr: stderr_text,
            stdout_truncated: stdout_total > MAX_STDOUT,
            duration_ms,
        })
    };

    match tokio::time::timeout(Duration::from_millis(timeout_ms), work).await {
        Ok(result) => result,
        Err(_) => Err(ExecError::Timeout {
            program: program.to_string(),
            timeout_ms,
        }),
    }
}

/// Read to EOF, keeping the first `max_bytes`. Reading continues past the cap
/// so the child never sees a closed pipe while it is still writing.
async fn read_capped(
    reader: &mut (impl tokio::io::AsyncRead + Unpin),
    max_bytes: usize,
) -> (Vec<u8>, usize) {
    let mut buf = Vec::with_capacity(max_bytes.min(65536));
    let mut tmp = [0u8; 8192];
    let mut total_read = 0usize;
    loop {
        match reader.read(&mut tmp).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                total_read += n;
                if buf.len() < max_bytes {
                    let take = n.min(max_bytes - buf.len());
                    buf.extend_from_slice(&tmp[..take]);
                }
            }
        }
    }
    (buf, total_read)
}
