//! Codex: `[mcp_servers.scpl-shortcuts]` in `~/.codex/config.toml` and a
//! skill under `~/.codex/skills/`.

use std::path::Path;

use toml::{Table, Value};

use super::{
    display, read_optional, sync_file, write_file, LaunchSpec, SetupError, StepOutcome,
    StepReport, SERVER_KEY,
};
use crate::docs;

const SECTION: &str = "mcp_servers";

fn server_table(launch: &LaunchSpec) -> Table {
    let mut table = Table::new();
    table.insert("command".into(), Value::String(launch.command.clone()));
    table.insert(
        "args".into(),
        Value::Array(launch.args.iter().cloned().map(Value::String).collect()),
    );
    table
}

pub(super) fn install(home: &Path, launch: &LaunchSpec) -> Vec<StepReport> {
    let config = home.join(".codex").join("config.toml");
    let skill = home
        .join(".codex")
        .join("skills")
        .join(SERVER_KEY)
        .join("SKILL.md");

    vec![
        StepReport::new(
            format!("{} [{SECTION}.{SERVER_KEY}]", display(home, &config)),
            upsert_server_table(&config, launch),
        ),
        StepReport::new(
            display(home, &skill),
            sync_file(&skill, &docs::skill_document(SERVER_KEY)),
        ),
    ]
}

/// Insert or replace the server table. The file is only rewritten when the
/// table changes.
fn upsert_server_table(path: &Path, launch: &LaunchSpec) -> Result<StepOutcome, SetupError> {
    let mut root = match read_optional(path)? {
        Some(s) => s.parse::<Table>().map_err(|source| SetupError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        None => Table::new(),
    };

    let servers = root
        .entry(SECTION)
        .or_insert(Value::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| SetupError::Shape {
            path: path.to_path_buf(),
            field: SECTION.into(),
            expected: "a table",
        })?;

    let desired = Value::Table(server_table(launch));
    let outcome = match servers.get(SERVER_KEY) {
        None => StepOutcome::Created,
        Some(existing) if *existing == desired => return Ok(StepOutcome::Unchanged),
        Some(_) => StepOutcome::Updated,
    };
    servers.insert(SERVER_KEY.into(), desired);

    write_file(path, &toml::to_string(&root)?)?;
    Ok(outcome)
}

pub(super) fn manual_stanza(launch: &LaunchSpec) -> String {
    let mut servers = Table::new();
    servers.insert(SERVER_KEY.into(), Value::Table(server_table(launch)));
    let mut root = Table::new();
    root.insert(SECTION.into(), Value::Table(servers));
    toml::to_string(&root).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::tests::launch;

    fn read(path: &Path) -> Table {
        std::fs::read_to_string(path).unwrap().parse().unwrap()
    }

    #[test]
    fn fresh_install_writes_table_and_skill() {
        let home = tempfile::tempdir().unwrap();
        let reports = install(home.path(), &launch());
        for r in &reports {
            assert_eq!(r.result.as_ref().unwrap(), &StepOutcome::Created, "{}", r.label);
        }

        let config = read(&home.path().join(".codex/config.toml"));
        let entry = &config["mcp_servers"]["scpl-shortcuts"];
        assert_eq!(entry["command"].as_str(), Some("/usr/local/bin/scpl-mcp"));
        assert_eq!(entry["args"].as_array().map(Vec::len), Some(0));

        let skill =
            std::fs::read_to_string(home.path().join(".codex/skills/scpl-shortcuts/SKILL.md"))
                .unwrap();
        assert!(skill.starts_with("---\nname: scpl-shortcuts\ndescription: "));
    }

    #[test]
    fn existing_settings_survive() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".codex/config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "model = \"o4\"\n\n[mcp_servers.other]\ncommand = \"other-mcp\"\nargs = [\"--x\"]\n",
        )
        .unwrap();

        assert_eq!(
            upsert_server_table(&path, &launch()).unwrap(),
            StepOutcome::Created
        );
        let config = read(&path);
        assert_eq!(config["model"].as_str(), Some("o4"));
        assert_eq!(config["mcp_servers"]["other"]["command"].as_str(), Some("other-mcp"));
        assert!(config["mcp_servers"].get("scpl-shortcuts").is_some());
    }

    #[test]
    fn identical_table_is_unchanged_and_not_rewritten() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("config.toml");
        let original = "# my settings\n[mcp_servers.scpl-shortcuts]\ncommand = \"/usr/local/bin/scpl-mcp\"\nargs = []\n";
        std::fs::write(&path, original).unwrap();

        assert_eq!(
            upsert_server_table(&path, &launch()).unwrap(),
            StepOutcome::Unchanged
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn different_table_is_replaced() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("config.toml");
        std::fs::write(
            &path,
            "[mcp_servers.scpl-shortcuts]\ncommand = \"npx\"\nargs = [\"-y\", \"scpl-updated-mcp-server\"]\n",
        )
        .unwrap();

        assert_eq!(
            upsert_server_table(&path, &launch()).unwrap(),
            StepOutcome::Updated
        );
        let config = read(&path);
        assert_eq!(
            config["mcp_servers"]["scpl-shortcuts"]["command"].as_str(),
            Some("/usr/local/bin/scpl-mcp")
        );
    }

    #[test]
    fn invalid_toml_is_reported() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("config.toml");
        std::fs::write(&path, "[mcp_servers\n").unwrap();
        assert!(matches!(
            upsert_server_table(&path, &launch()),
            Err(SetupError::Toml { .. })
        ));
    }

    #[test]
    fn manual_stanza_is_toml() {
        let stanza = manual_stanza(&launch());
        assert!(stanza.contains("[mcp_servers.scpl-shortcuts]"));
        let parsed: Table = stanza.parse().unwrap();
        assert!(parsed["mcp_servers"]["scpl-shortcuts"].is_table());
    }
}
