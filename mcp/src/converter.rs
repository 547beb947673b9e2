//! ScPL → shortcut conversion through an external backend.
//!
//! The ScPL grammar and the Shortcuts plist format are owned by the
//! conversion backend; this module only hands it a source file and collects
//! the result. [`Converter`] is the seam the tool handlers depend on.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ConverterConfig;
use crate::process::{self, ExecError};

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The backend ran and rejected the source. Carries its diagnostic.
    #[error("{0}")]
    Rejected(String),
    #[error("ScPL converter unavailable: {0}")]
    Unavailable(String),
    #[error("ScPL converter timed out after {0} ms")]
    Timeout(u64),
    #[error("ScPL converter produced no output")]
    EmptyOutput,
    #[error("ScPL converter output exceeded the size limit")]
    OutputTooLarge,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert ScPL source into an unsigned `.shortcut` payload.
    async fn convert(&self, source: &str) -> Result<Vec<u8>, ConvertError>;

    /// Check the source without keeping any output.
    async fn validate(&self, source: &str) -> Result<(), ConvertError> {
        self.convert(source).await.map(|_| ())
    }
}

/// Runs the configured backend command once per conversion, inside a fresh
/// temporary directory.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    command: String,
    args: Vec<String>,
    timeout_ms: u64,
}

impl CommandConverter {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout_ms: u64) -> Self {
        Self {
            command: command.into(),
            args,
            timeout_ms,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone(), config.timeout_ms)
    }

    /// Substitute placeholders. Returns the args and whether `{output}` was used.
    fn render_args(&self, input: &Path, output: &Path) -> (Vec<String>, bool) {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let uses_output = self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER));
        let args = self
            .args
            .iter()
            .map(|a| {
                a.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect();
        (args, uses_output)
    }
}

#[async_trait]
impl Converter for CommandConverter {
    async fn convert(&self, source: &str) -> Result<Vec<u8>, ConvertError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.scpl");
        let output = workdir.path().join("output.shortcut");
        tokio::fs::write(&input, source).await?;

        let (args, uses_output) = self.render_args(&input, &output);
        debug!(command = %self.command, ?args, "running ScPL converter");

        let result = process::run(&self.command, &args, Some(workdir.path()), self.timeout_ms)
            .await
            .map_err(|e| match e {
                ExecError::Timeout { timeout_ms, .. } => ConvertError::Timeout(timeout_ms),
                ExecError::Process(io) => ConvertError::Io(io),
                spawn @ ExecError::Spawn { .. } => ConvertError::Unavailable(spawn.to_string()),
            })?;

        if !result.success() {
            return Err(ConvertError::Rejected(result.failure_message()));
        }

        let bytes = if uses_output {
            match tokio::fs::read(&output).await {
                Ok(b) => b,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ConvertError::EmptyOutput)
                }
                Err(e) => return Err(e.into()),
            }
        } else if result.stdout_truncated {
            return Err(ConvertError::OutputTooLarge);
        } else {
            result.stdout
        };

        if bytes.is_empty() {
            return Err(ConvertError::EmptyOutput);
        }
        debug!(
            bytes = bytes.len(),
            duration_ms = result.duration_ms,
            "ScPL conversion finished"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_substituted_inside_args() {
        let converter = CommandConverter::new(
            "scpl",
            vec!["--in={input}".into(), "-o".into(), "{output}".into()],
            1000,
        );
        let (args, uses_output) =
            converter.render_args(Path::new("/tmp/a.scpl"), Path::new("/tmp/a.shortcut"));
        assert_eq!(args, vec!["--in=/tmp/a.scpl", "-o", "/tmp/a.shortcut"]);
        assert!(uses_output);
    }

    #[test]
    fn stdout_mode_without_output_placeholder() {
        let converter = CommandConverter::new("scpl", vec!["{input}".into()], 1000);
        let (_, uses_output) =
            converter.render_args(Path::new("/tmp/a.scpl"), Path::new("/tmp/a.shortcut"));
        assert!(!uses_output);
    }

    #[cfg(unix)]
    fn sh(script: &str, placeholders: &[&str]) -> CommandConverter {
        let mut args = vec!["-c".to_string(), script.to_string()];
        args.extend(placeholders.iter().map(|p| (*p).to_string()));
        CommandConverter::new("/bin/sh", args, 5000)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_file_mode_returns_file_contents() {
        let converter = sh(r#"cat "$0" > "$1""#, &["{input}", "{output}"]);
        let bytes = converter.convert("ShowResult \"Hi\"").await.unwrap();
        assert_eq!(bytes, b"ShowResult \"Hi\"");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_mode_returns_stdout() {
        let converter = sh(r#"printf 'plist:'; cat "$0""#, &["{input}"]);
        let bytes = converter.convert("Text \"a\"").await.unwrap();
        assert_eq!(bytes, b"plist:Text \"a\"");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejection_carries_backend_message() {
        let converter = sh(
            "echo 'Error on line 1: No action with name NotAnAction' >&2; exit 1",
            &["{input}", "{output}"],
        );
        let err = converter.validate("NotAnAction").await.unwrap_err();
        match err {
            ConvertError::Rejected(msg) => {
                assert_eq!(msg, "Error on line 1: No action with name NotAnAction");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_output_file_is_empty_output() {
        let converter = sh("exit 0", &["{input}", "{output}"]);
        assert!(matches!(
            converter.convert("ShowResult").await,
            Err(ConvertError::EmptyOutput)
        ));
    }

    #[tokio::test]
    async fn missing_backend_is_unavailable() {
        let converter = CommandConverter::new("/nonexistent/scpl", vec!["{input}".into()], 1000);
        let err = converter.convert("ShowResult").await.unwrap_err();
        assert!(matches!(err, ConvertError::Unavailable(_)));
        assert!(err.to_string().contains("/nonexistent/scpl"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_backend_times_out() {
        let converter = CommandConverter::new(
            "/bin/sh",
            vec!["-c".into(), "sleep 5".into()],
            100,
        );
        assert!(matches!(
            converter.convert("ShowResult").await,
            Err(ConvertError::Timeout(100))
        ));
    }
}
