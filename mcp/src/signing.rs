//! Shortcut signing through the macOS `shortcuts` command-line tool.
//!
//! Unsigned shortcuts cannot be imported on recent macOS releases, so
//! `create_shortcut` signs by default there. A signing failure never loses
//! the converted file; the caller keeps the unsigned copy.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::SigningConfig;
use crate::process::{self, ExecError};

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("shortcuts sign failed: {0}")]
    Failed(String),
    #[error("signed file was not created at {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to remove previous {}: {source}", path.display())]
    Stale {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Signer {
    command: String,
    mode: String,
    timeout_ms: u64,
}

impl Signer {
    pub fn from_config(config: &SigningConfig) -> Self {
        Self {
            command: config.command.clone(),
            mode: config.mode.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "sign".to_string(),
            "--mode".to_string(),
            self.mode.clone(),
            "--input".to_string(),
            input.to_string_lossy().into_owned(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Sign `input` into `output`. Runs in the output's directory. An existing
    /// `output` is removed first so only a fresh file counts as success.
    pub async fn sign(&self, input: &Path, output: &Path) -> Result<(), SignError> {
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!(path = %output.display(), "removed previous signed shortcut"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SignError::Stale {
                    path: output.to_path_buf(),
                    source,
                })
            }
        }

        let args = self.args(input, output);
        debug!(command = %self.command, ?args, "signing shortcut");

        let result =
            process::run(&self.command, &args, output.parent(), self.timeout_ms).await?;
        if !result.success() {
            return Err(SignError::Failed(result.failure_message()));
        }
        if !output.exists() {
            return Err(SignError::Missing(output.to_path_buf()));
        }
        Ok(())
    }
}
