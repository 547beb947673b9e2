//! Installer mode: register scpl-mcp with AI coding assistants.
//!
//! Each host gets a launch stanza in its configuration file plus skill or
//! context documentation. Steps are idempotent and independent: a failing
//! step prints the stanza to add by hand and the remaining steps still run.

mod claude;
mod codex;
mod gemini;

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::Cli;
use crate::util::expand_tilde;

/// Key under which every host registers the server.
pub const SERVER_KEY: &str = "scpl-shortcuts";

/// Version written into plugin and extension manifests.
pub const PLUGIN_VERSION: &str = "1.0.0";

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} is not valid TOML: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("{}: expected `{field}` to be {expected}", path.display())]
    Shape {
        path: PathBuf,
        field: String,
        expected: &'static str,
    },
}

/// What a step did to the file system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Created,
    Updated,
    Unchanged,
}

impl StepOutcome {
    /// Combine the outcomes of several writes that form one step.
    fn merge(self, other: StepOutcome) -> StepOutcome {
        match (self, other) {
            (a, b) if a == b => a,
            _ => StepOutcome::Updated,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepOutcome::Created => "created",
            StepOutcome::Updated => "updated",
            StepOutcome::Unchanged => "unchanged",
        })
    }
}

/// How hosts should launch this server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    /// This executable, plus `--config <path>` when one was given.
    pub fn current(config: Option<&Path>) -> Self {
        let command = std::env::current_exe()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "scpl-mcp".to_string());
        let mut args = Vec::new();
        if let Some(path) = config {
            let path = expand_tilde(path);
            let path = std::path::absolute(&path).unwrap_or(path);
            args.push("--config".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        Self { command, args }
    }

    fn json(&self) -> Value {
        json!({ "command": self.command, "args": self.args })
    }
}

pub struct StepReport {
    pub label: String,
    pub result: Result<StepOutcome, SetupError>,
}

impl StepReport {
    fn new(label: impl Into<String>, result: Result<StepOutcome, SetupError>) -> Self {
        Self {
            label: label.into(),
            result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    ClaudeCode,
    Codex,
    Gemini,
}

impl Host {
    pub fn title(self) -> &'static str {
        match self {
            Host::ClaudeCode => "Claude Code",
            Host::Codex => "Codex",
            Host::Gemini => "Gemini CLI",
        }
    }

    /// Hosts selected by the CLI flags, in a fixed order.
    pub fn selected(cli: &Cli) -> Vec<Host> {
        let mut hosts = Vec::new();
        if cli.setup || cli.setup_all {
            hosts.push(Host::ClaudeCode);
        }
        if cli.setup_codex || cli.setup_all {
            hosts.push(Host::Codex);
        }
        if cli.setup_gemini || cli.setup_all {
            hosts.push(Host::Gemini);
        }
        hosts
    }

    pub fn install(self, home: &Path, launch: &LaunchSpec) -> Vec<StepReport> {
        match self {
            Host::ClaudeCode => claude::install(home, launch),
            Host::Codex => codex::install(home, launch),
            Host::Gemini => gemini::install(home, launch),
        }
    }

    /// Configuration to add by hand when the automatic edit fails.
    pub fn manual_stanza(self, launch: &LaunchSpec) -> String {
        match self {
            Host::ClaudeCode => claude::manual_stanza(launch),
            Host::Codex => codex::manual_stanza(launch),
            Host::Gemini => gemini::manual_stanza(launch),
        }
    }
}

/// Run installer mode for the hosts selected on the command line. Returns
/// false when any step failed.
pub fn run(cli: &Cli) -> bool {
    let Some(home) = dirs::home_dir() else {
        eprintln!("❌ Could not determine the home directory");
        return false;
    };
    let launch = LaunchSpec::current(cli.config.as_deref());
    debug!(command = %launch.command, args = ?launch.args, "launch stanza");

    let mut all_ok = true;
    for host in Host::selected(cli) {
        println!("🚀 Setting up ScPL Shortcuts for {}...", host.title());
        let mut host_ok = true;
        for step in host.install(&home, &launch) {
            match step.result {
                Ok(outcome) => println!("   ✅ {}: {outcome}", step.label),
                Err(e) => {
                    host_ok = false;
                    println!("   ❌ {}: {e}", step.label);
                }
            }
        }
        if !host_ok {
            all_ok = false;
            println!(
                "   Add this manually:\n\n{}\n",
                indent(&host.manual_stanza(&launch), "   ")
            );
        }
        println!();
    }

    if all_ok {
        println!("🎉 Setup complete! Restart your assistant to use the shortcut tools.");
        println!("  Example: \"Create a shortcut that starts a timer and plays a sound\"");
    }
    all_ok
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|l| format!("{prefix}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `~/` display form of a path under `home`.
fn display(home: &Path, path: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rel) => format!("~/{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}

fn create_parent(path: &Path) -> Result<(), SetupError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SetupError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<String>, SetupError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SetupError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a JSON object, or `default` when the file does not exist. An empty
/// file counts as missing.
fn read_json_object(path: &Path, default: Value) -> Result<Map<String, Value>, SetupError> {
    let value = match read_optional(path)? {
        Some(s) if !s.trim().is_empty() => {
            serde_json::from_str(&s).map_err(|source| SetupError::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => default,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SetupError::Shape {
            path: path.to_path_buf(),
            field: "(root)".into(),
            expected: "an object",
        }),
    }
}

/// Pretty-print with two-space indentation, key order preserved.
fn write_json(path: &Path, value: &Value) -> Result<(), SetupError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| SetupError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    write_file(path, &text)
}

fn write_file(path: &Path, contents: &str) -> Result<(), SetupError> {
    create_parent(path)?;
    std::fs::write(path, contents).map_err(|source| SetupError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a file only when its content differs.
fn sync_file(path: &Path, contents: &str) -> Result<StepOutcome, SetupError> {
    let outcome = match read_optional(path)? {
        None => StepOutcome::Created,
        Some(existing) if existing == contents => return Ok(StepOutcome::Unchanged),
        Some(_) => StepOutcome::Updated,
    };
    write_file(path, contents)?;
    Ok(outcome)
}

/// `object[key]` as a mutable object, inserting `{}` when absent.
fn child_object<'a>(
    object: &'a mut Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<&'a mut Map<String, Value>, SetupError> {
    object
        .entry(key.to_string())
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| SetupError::Shape {
            path: path.to_path_buf(),
            field: key.to_string(),
            expected: "an object",
        })
}

/// Set `root[section][SERVER_KEY] = entry` in a JSON config file, leaving
/// every other key untouched.
fn upsert_server_entry(path: &Path, section: &str, entry: Value) -> Result<StepOutcome, SetupError> {
    let mut root = read_json_object(path, json!({}))?;
    let servers = child_object(&mut root, section, path)?;
    let outcome = match servers.get(SERVER_KEY) {
        None => StepOutcome::Created,
        Some(existing) if *existing == entry => return Ok(StepOutcome::Unchanged),
        Some(_) => StepOutcome::Updated,
    };
    servers.insert(SERVER_KEY.to_string(), entry);
    write_json(path, &Value::Object(root))?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn launch() -> LaunchSpec {
        LaunchSpec {
            command: "/usr/local/bin/scpl-mcp".into(),
            args: vec![],
        }
    }

    #[test]
    fn selected_hosts_follow_flags() {
        let cli = Cli {
            setup_codex: true,
            ..Cli::default()
        };
        assert_eq!(Host::selected(&cli), vec![Host::Codex]);

        let cli = Cli {
            setup_all: true,
            ..Cli::default()
        };
        assert_eq!(
            Host::selected(&cli),
            vec![Host::ClaudeCode, Host::Codex, Host::Gemini]
        );
    }

    #[test]
    fn launch_spec_adds_config_flag() {
        let spec = LaunchSpec::current(Some(Path::new("/etc/scpl-mcp.toml")));
        assert_eq!(spec.args, vec!["--config", "/etc/scpl-mcp.toml"]);
        assert!(!spec.command.is_empty());
        assert!(LaunchSpec::current(None).args.is_empty());
    }

    #[test]
    fn outcome_merge() {
        use StepOutcome::*;
        assert_eq!(Created.merge(Created), Created);
        assert_eq!(Unchanged.merge(Unchanged), Unchanged);
        assert_eq!(Created.merge(Unchanged), Updated);
    }

    #[test]
    fn upsert_preserves_other_keys_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"theme":"dark","mcpServers":{"other":{"command":"x"}},"zeta":1}"#,
        )
        .unwrap();

        let entry = launch().json();
        assert_eq!(
            upsert_server_entry(&path, "mcpServers", entry.clone()).unwrap(),
            StepOutcome::Created
        );
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<_> = written.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["theme", "mcpServers", "zeta"]);
        assert_eq!(written["mcpServers"]["other"]["command"], "x");
        assert_eq!(written["mcpServers"][SERVER_KEY], entry);

        assert_eq!(
            upsert_server_entry(&path, "mcpServers", entry).unwrap(),
            StepOutcome::Unchanged
        );
        let changed = json!({ "command": "/opt/scpl-mcp", "args": [] });
        assert_eq!(
            upsert_server_entry(&path, "mcpServers", changed).unwrap(),
            StepOutcome::Updated
        );
    }

    #[test]
    fn upsert_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"mcpServers":[]}"#).unwrap();
        let err = upsert_server_entry(&path, "mcpServers", json!({})).unwrap_err();
        assert!(matches!(err, SetupError::Shape { .. }));

        std::fs::write(&path, "{ not json").unwrap();
        let err = upsert_server_entry(&path, "mcpServers", json!({})).unwrap_err();
        assert!(matches!(err, SetupError::Json { .. }));
    }

    #[test]
    fn sync_file_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.md");
        assert_eq!(sync_file(&path, "one").unwrap(), StepOutcome::Created);
        assert_eq!(sync_file(&path, "one").unwrap(), StepOutcome::Unchanged);
        assert_eq!(sync_file(&path, "two").unwrap(), StepOutcome::Updated);
    }

    #[test]
    fn display_uses_tilde() {
        let home = Path::new("/home/u");
        assert_eq!(display(home, &home.join(".claude.json")), "~/.claude.json");
        assert_eq!(display(home, Path::new("/etc/x")), "/etc/x");
    }
}
