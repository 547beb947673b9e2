//! Configuration loading for scpl-mcp.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Environment variables**: `SCPL_CONVERTER`, `SCPL_OUTPUT_DIR`,
//!    `SCPL_SIGN`, `SCPL_ACTIONS`
//! 2. **Config file**: `--config <path>`, else `$SCPL_MCP_CONFIG`, else
//!    `<config dir>/scpl-mcp/config.toml` when it exists
//! 3. **Compiled defaults**
//!
//! ```toml
//! [converter]
//! command = "scpl"
//! args = ["{input}", "--output", "{output}"]
//! timeout_ms = 30000
//!
//! [output]
//! default_dir = "~/Documents"
//!
//! [signing]
//! enabled = true          # default: true on macOS only
//! command = "shortcuts"
//! mode = "anyone"         # or "people-who-know-me"
//!
//! [catalog]
//! path = "~/.config/scpl-mcp/OutActions.json"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::util::expand_tilde;

/// CLI arguments parsed by `clap`.
#[derive(Parser, Debug, Default)]
#[command(
    name = "scpl-mcp",
    version,
    about = "MCP server for creating macOS Shortcuts from ScPL"
)]
pub struct Cli {
    /// Path to config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Register with Claude Code (~/.claude.json and a local plugin), then exit
    #[arg(long)]
    pub setup: bool,

    /// Register with Codex (~/.codex/config.toml), then exit
    #[arg(long)]
    pub setup_codex: bool,

    /// Register with Gemini CLI (~/.gemini/settings.json), then exit
    #[arg(long)]
    pub setup_gemini: bool,

    /// Register with every supported host, then exit
    #[arg(long)]
    pub setup_all: bool,
}

impl Cli {
    pub fn is_setup(&self) -> bool {
        self.setup || self.setup_codex || self.setup_gemini || self.setup_all
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{var} must be one of 1, 0, true, false, yes, no (got '{value}')")]
    InvalidBool { var: &'static str, value: String },
    #[error("signing mode must be 'anyone' or 'people-who-know-me' (got '{0}')")]
    InvalidSigningMode(String),
    #[error("converter command is empty")]
    EmptyConverter,
}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub signing: SigningConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External ScPL conversion backend.
///
/// `{input}` in `args` is replaced with the path of the ScPL source file and
/// `{output}` with the path the backend must write the shortcut to. Without an
/// `{output}` placeholder the shortcut is read from stdout.
#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_command")]
    pub command: String,
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
    #[serde(default = "default_converter_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where `create_shortcut` writes when no `output_dir` is given (default `~/Documents`).
    #[serde(default = "default_output_dir")]
    pub default_dir: String,
}

/// `shortcuts sign` settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningConfig {
    /// Sign created shortcuts (default true on macOS, false elsewhere). Override with `SCPL_SIGN`.
    #[serde(default = "default_signing_enabled")]
    pub enabled: bool,
    #[serde(default = "default_signing_command")]
    pub command: String,
    #[serde(default = "default_signing_mode")]
    pub mode: String,
    #[serde(default = "default_signing_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Generated `OutActions.json`. Without one, a built-in list of popular actions is used.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_converter_command() -> String {
    "scpl".to_string()
}
fn default_converter_args() -> Vec<String> {
    vec![
        "{input}".to_string(),
        "--output".to_string(),
        "{output}".to_string(),
    ]
}
fn default_converter_timeout_ms() -> u64 {
    30000
}
fn default_output_dir() -> String {
    "~/Documents".to_string()
}
fn default_signing_enabled() -> bool {
    cfg!(target_os = "macos")
}
fn default_signing_command() -> String {
    "shortcuts".to_string()
}
fn default_signing_mode() -> String {
    "anyone".to_string()
}
fn default_signing_timeout_ms() -> u64 {
    30000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_converter_command(),
            args: default_converter_args(),
            timeout_ms: default_converter_timeout_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: default_output_dir(),
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            enabled: default_signing_enabled(),
            command: default_signing_command(),
            mode: default_signing_mode(),
            timeout_ms: default_signing_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const SIGNING_MODES: &[&str] = &["anyone", "people-who-know-me"];

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit, default_config_path(), |var| std::env::var(var).ok())
    }

    fn load_with(
        explicit: Option<&Path>,
        fallback: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path(explicit, fallback, &lookup) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply env var overrides. `lookup` is injected so tests stay off the process env.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(cmd) = lookup("SCPL_CONVERTER") {
            self.converter.command = cmd;
        }
        if let Some(dir) = lookup("SCPL_OUTPUT_DIR") {
            self.output.default_dir = dir;
        }
        if let Some(sign) = lookup("SCPL_SIGN") {
            self.signing.enabled = parse_bool(&sign).ok_or(ConfigError::InvalidBool {
                var: "SCPL_SIGN",
                value: sign,
            })?;
        }
        if let Some(path) = lookup("SCPL_ACTIONS") {
            self.catalog.path = Some(path);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.converter.command.trim().is_empty() {
            return Err(ConfigError::EmptyConverter);
        }
        if !SIGNING_MODES.contains(&self.signing.mode.as_str()) {
            return Err(ConfigError::InvalidSigningMode(self.signing.mode.clone()));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_tilde(Path::new(&self.output.default_dir))
    }

    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog
            .path
            .as_deref()
            .map(|p| expand_tilde(Path::new(p)))
    }
}

/// `--config`, else `$SCPL_MCP_CONFIG`, else `fallback` when it exists.
fn config_path(
    explicit: Option<&Path>,
    fallback: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(expand_tilde(p));
    }
    match lookup("SCPL_MCP_CONFIG") {
        Some(p) if !p.is_empty() => Some(expand_tilde(Path::new(&p))),
        _ => fallback.filter(|p| p.exists()),
    }
}

/// `<config dir>/scpl-mcp/config.toml`, e.g. `~/.config/scpl-mcp/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scpl-mcp").join("config.toml"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.converter.command, "scpl");
        assert_eq!(config.converter.args, vec!["{input}", "--output", "{output}"]);
        assert_eq!(config.signing.mode, "anyone");
        assert_eq!(config.signing.enabled, cfg!(target_os = "macos"));
        assert!(config.catalog.path.is_none());
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [converter]
            command = "node"
            args = ["/opt/scpl/cli.js", "{input}"]

            [signing]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.converter.command, "node");
        assert_eq!(config.converter.timeout_ms, 30000);
        assert!(!config.signing.enabled);
        assert_eq!(config.signing.command, "shortcuts");
        assert_eq!(config.output.default_dir, "~/Documents");
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("SCPL_CONVERTER", "/usr/local/bin/scpl"),
                ("SCPL_OUTPUT_DIR", "/tmp/out"),
                ("SCPL_SIGN", "no"),
                ("SCPL_ACTIONS", "/tmp/OutActions.json"),
            ]))
            .unwrap();
        assert_eq!(config.converter.command, "/usr/local/bin/scpl");
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
        assert!(!config.signing.enabled);
        assert_eq!(config.catalog_path(), Some(PathBuf::from("/tmp/OutActions.json")));
    }

    #[test]
    fn invalid_sign_value_rejected() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("SCPL_SIGN", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("SCPL_SIGN"));
    }

    #[test]
    fn invalid_signing_mode_rejected() {
        let mut config = Config::default();
        config.signing.mode = "everyone".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSigningMode(_))
        ));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\ndefault_dir = \"/srv/shortcuts\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.output_dir(), PathBuf::from("/srv/shortcuts"));
    }

    #[test]
    fn config_path_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("config.toml");
        let explicit = Path::new("/etc/scpl-mcp.toml");
        let from_env = env(&[("SCPL_MCP_CONFIG", "/srv/env.toml")]);

        assert_eq!(
            config_path(Some(explicit), Some(fallback.clone()), &from_env),
            Some(explicit.to_path_buf())
        );
        assert_eq!(
            config_path(None, Some(fallback.clone()), &from_env),
            Some(PathBuf::from("/srv/env.toml"))
        );
        // A missing default file means compiled defaults.
        assert_eq!(config_path(None, Some(fallback.clone()), env(&[])), None);
        assert_eq!(
            config_path(None, Some(fallback.clone()), env(&[("SCPL_MCP_CONFIG", "")])),
            None
        );

        std::fs::write(&fallback, "").unwrap();
        assert_eq!(config_path(None, Some(fallback.clone()), env(&[])), Some(fallback));
        assert_eq!(config_path(None, None, env(&[])), None);
    }

    #[test]
    fn load_applies_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[converter]\ncommand = \"node\"\n\n[output]\ndefault_dir = \"/srv/file\"\n",
        )
        .unwrap();
        let path_str = path.to_string_lossy().into_owned();

        let config = Config::load_with(
            None,
            None,
            env(&[("SCPL_MCP_CONFIG", path_str.as_str()), ("SCPL_OUTPUT_DIR", "/srv/env")]),
        )
        .unwrap();
        assert_eq!(config.converter.command, "node");
        assert_eq!(config.output_dir(), PathBuf::from("/srv/env"));
    }

    #[test]
    fn load_without_any_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::load_with(None, Some(dir.path().join("absent.toml")), env(&[])).unwrap();
        assert_eq!(config.converter.command, "scpl");
        assert_eq!(config.output.default_dir, "~/Documents");
    }

    #[test]
    fn load_validates_after_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[signing]\nmode = \"everyone\"\n").unwrap();
        assert!(matches!(
            Config::load_with(Some(path.as_path()), None, env(&[])),
            Err(ConfigError::InvalidSigningMode(_))
        ));

        assert!(matches!(
            Config::load_with(None, None, env(&[("SCPL_CONVERTER", " ")])),
            Err(ConfigError::EmptyConverter)
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load_with(Some(missing.as_path()), None, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn broken_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[converter\ncommand = ").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
