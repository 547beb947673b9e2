//! Gemini CLI: `mcpServers` entry in `~/.gemini/settings.json` and an
//! extension whose context file carries the skill text.

use std::path::Path;

use serde_json::{json, Value};

use super::{
    display, sync_file, upsert_server_entry, LaunchSpec, SetupError, StepOutcome, StepReport,
    PLUGIN_VERSION, SERVER_KEY,
};
use crate::docs;

const CONTEXT_FILE: &str = "SCPL.md";

pub(super) fn install(home: &Path, launch: &LaunchSpec) -> Vec<StepReport> {
    let settings = home.join(".gemini").join("settings.json");
    let extension = home.join(".gemini").join("extensions").join(SERVER_KEY);

    vec![
        StepReport::new(
            format!("{} mcpServers.{SERVER_KEY}", display(home, &settings)),
            upsert_server_entry(&settings, "mcpServers", launch.json()),
        ),
        StepReport::new(
            format!("extension in {}", display(home, &extension)),
            write_extension(&extension),
        ),
    ]
}

fn write_extension(dir: &Path) -> Result<StepOutcome, SetupError> {
    let manifest_path = dir.join("gemini-extension.json");
    let manifest = json!({
        "name": SERVER_KEY,
        "version": PLUGIN_VERSION,
        "contextFileName": CONTEXT_FILE
    });
    let manifest = serde_json::to_string_pretty(&manifest).map_err(|source| SetupError::Json {
        path: manifest_path.clone(),
        source,
    })? + "\n";

    let a = sync_file(&manifest_path, &manifest)?;
    let b = sync_file(&dir.join(CONTEXT_FILE), docs::SKILL_BODY)?;
    Ok(a.merge(b))
}

pub(super) fn manual_stanza(launch: &LaunchSpec) -> String {
    let stanza: Value = json!({ "mcpServers": { SERVER_KEY: launch.json() } });
    serde_json::to_string_pretty(&stanza).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::tests::launch;

    #[test]
    fn fresh_install_writes_settings_and_extension() {
        let home = tempfile::tempdir().unwrap();
        for r in install(home.path(), &launch()) {
            assert_eq!(r.result.unwrap(), StepOutcome::Created, "{}", r.label);
        }

        let settings: Value = serde_json::from_str(
            &std::fs::read_to_string(home.path().join(".gemini/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            settings["mcpServers"]["scpl-shortcuts"],
            json!({ "command": "/usr/local/bin/scpl-mcp", "args": [] })
        );

        let ext = home.path().join(".gemini/extensions/scpl-shortcuts");
        let manifest: Value =
            serde_json::from_str(&std::fs::read_to_string(ext.join("gemini-extension.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["contextFileName"], "SCPL.md");
        assert_eq!(
            std::fs::read_to_string(ext.join("SCPL.md")).unwrap(),
            docs::SKILL_BODY
        );
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
    fn other_settings_are_kept() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".gemini/settings.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme":"GitHub","mcpServers":{}}"#).unwrap();

        install(home.path(), &launch());
        let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(settings["theme"], "GitHub");
    }
}
