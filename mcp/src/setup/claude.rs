//! Claude Code: `~/.claude.json` server entry, a local plugin carrying the
//! `create-shortcut` skill, and its registration in `installed_plugins.json`.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use super::{
    child_object, display, read_json_object, sync_file, upsert_server_entry, write_json,
    LaunchSpec, SetupError, StepOutcome, StepReport, PLUGIN_VERSION, SERVER_KEY,
};
use crate::docs;

const SKILL_NAME: &str = "create-shortcut";

fn plugin_dir(home: &Path) -> PathBuf {
    home.join(".claude")
        .join("plugins")
        .join("local")
        .join(SERVER_KEY)
}

fn registry_key() -> String {
    format!("{SERVER_KEY}@local")
}

fn server_entry(launch: &LaunchSpec) -> Value {
    json!({
        "type": "stdio",
        "command": launch.command,
        "args": launch.args,
    })
}

pub(super) fn install(home: &Path, launch: &LaunchSpec) -> Vec<StepReport> {
    let config = home.join(".claude.json");
    let plugin = plugin_dir(home);
    let registry = home
        .join(".claude")
        .join("plugins")
        .join("installed_plugins.json");
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    vec![
        StepReport::new(
            format!("{} mcpServers.{SERVER_KEY}", display(home, &config)),
            upsert_server_entry(&config, "mcpServers", server_entry(launch)),
        ),
        StepReport::new(
            format!("plugin files in {}", display(home, &plugin)),
            write_plugin_files(&plugin),
        ),
        StepReport::new(
            format!("{} {}", display(home, &registry), registry_key()),
            register_plugin(&registry, &plugin, &now),
        ),
    ]
}

fn write_plugin_files(plugin: &Path) -> Result<StepOutcome, SetupError> {
    let manifest = json!({
        "name": SERVER_KEY,
        "version": PLUGIN_VERSION,
        "description": "Create macOS Shortcuts using natural language and ScPL",
        "skills": [
            {
                "name": SKILL_NAME,
                "description": "Create a macOS Shortcut using natural language. Guides you through the process and generates a .shortcut file.",
                "path": format!("skills/{SKILL_NAME}.md")
            }
        ]
    });
    let manifest = serde_json::to_string_pretty(&manifest).map_err(|source| SetupError::Json {
        path: plugin.join("plugin.json"),
        source,
    })? + "\n";

    let a = sync_file(&plugin.join("plugin.json"), &manifest)?;
    let b = sync_file(
        &plugin.join("skills").join(format!("{SKILL_NAME}.md")),
        &docs::skill_document(SKILL_NAME),
    )?;
    Ok(a.merge(b))
}

/// Record the plugin in `installed_plugins.json`. `installedAt` survives
/// re-runs; `lastUpdated` moves only when something else changed.
fn register_plugin(registry: &Path, plugin: &Path, now: &str) -> Result<StepOutcome, SetupError> {
    let mut root = read_json_object(registry, json!({ "version": 2, "plugins": {} }))?;
    let plugins = child_object(&mut root, "plugins", registry)?;
    let key = registry_key();

    let existing = plugins
        .get(&key)
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .cloned();
    let previous = |field: &str| {
        existing
            .as_ref()
            .and_then(|e| e.get(field))
            .and_then(Value::as_str)
            .unwrap_or(now)
            .to_string()
    };

    let mut entry = json!({
        "scope": "user",
        "installPath": plugin.to_string_lossy(),
        "version": PLUGIN_VERSION,
        "installedAt": previous("installedAt"),
        "lastUpdated": previous("lastUpdated"),
        "isLocal": true
    });

    let outcome = match &existing {
        None => StepOutcome::Created,
        Some(e) if *e == entry => return Ok(StepOutcome::Unchanged),
        Some(_) => StepOutcome::Updated,
    };
    entry["lastUpdated"] = json!(now);
    plugins.insert(key, json!([entry]));
    write_json(registry, &Value::Object(root))?;
    Ok(outcome)
}

pub(super) fn manual_stanza(launch: &LaunchSpec) -> String {
    let stanza = json!({ "mcpServers": { SERVER_KEY: server_entry(launch) } });
    serde_json::to_string_pretty(&stanza).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::tests::launch;

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn fresh_install_creates_everything() {
        let home = tempfile::tempdir().unwrap();
        let reports = install(home.path(), &launch());
        assert_eq!(reports.len(), 3);
        for r in &reports {
            assert_eq!(r.result.as_ref().unwrap(), &StepOutcome::Created, "{}", r.label);
        }

        let config = read(&home.path().join(".claude.json"));
        assert_eq!(
            config["mcpServers"]["scpl-shortcuts"],
            json!({ "type": "stdio", "command": "/usr/local/bin/scpl-mcp", "args": [] })
        );

        let plugin = plugin_dir(home.path());
        let manifest = read(&plugin.join("plugin.json"));
        assert_eq!(manifest["skills"][0]["path"], "skills/create-shortcut.md");
        let skill = std::fs::read_to_string(plugin.join("skills/create-shortcut.md")).unwrap();
        assert!(skill.starts_with("---\nname: create-shortcut\n"));

        let registry = read(&home.path().join(".claude/plugins/installed_plugins.json"));
        assert_eq!(registry["version"], 2);
        let entry = &registry["plugins"]["scpl-shortcuts@local"][0];
        assert_eq!(entry["scope"], "user");
        assert_eq!(entry["isLocal"], true);
        assert_eq!(entry["installPath"], plugin.to_string_lossy().as_ref());
    }

    #[test]
    fn rerun_is_unchanged() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), &launch());
        for r in install(home.path(), &launch()) {
            assert_eq!(r.result.unwrap(), StepOutcome::Unchanged, "{}", r.label);
        }
    }

    #[test]
    fn registration_keeps_install_time_and_other_plugins() {
        let home = tempfile::tempdir().unwrap();
        let registry = home.path().join("installed_plugins.json");
        let plugin = plugin_dir(home.path());
        std::fs::write(
            &registry,
            r#"{"version":2,"plugins":{"other@market":[{"scope":"user"}],
                "scpl-shortcuts@local":[{"scope":"user","installPath":"/old","version":"0.9.0",
                "installedAt":"2025-01-01T00:00:00.000Z","lastUpdated":"2025-01-01T00:00:00.000Z","isLocal":true}]}}"#,
        )
        .unwrap();

        let outcome = register_plugin(&registry, &plugin, "2026-10-16T12:00:00.000Z").unwrap();
        assert_eq!(outcome, StepOutcome::Updated);

        let written = read(&registry);
        assert!(written["plugins"]["other@market"].is_array());
        let entry = &written["plugins"]["scpl-shortcuts@local"][0];
        assert_eq!(entry["installedAt"], "2025-01-01T00:00:00.000Z");
        assert_eq!(entry["lastUpdated"], "2026-10-16T12:00:00.000Z");
        assert_eq!(entry["version"], PLUGIN_VERSION);
    }

    #[test]
    fn broken_config_fails_only_that_step() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".claude.json"), "{ oops").unwrap();
        let reports = install(home.path(), &launch());
        assert!(matches!(reports[0].result, Err(SetupError::Json { .. })));
        assert!(reports[1].result.is_ok());
        assert!(reports[2].result.is_ok());
    }

    #[test]
    fn manual_stanza_is_json() {
        let stanza: Value = serde_json::from_str(&manual_stanza(&launch())).unwrap();
        assert_eq!(stanza["mcpServers"]["scpl-shortcuts"]["type"], "stdio");
    }
}
