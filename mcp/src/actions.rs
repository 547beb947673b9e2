//! Action lookup for `list_actions` and `get_action_details`.
//!
//! Backed by a generated catalog (`OutActions.json`, see `gen-actions`) when
//! one is configured, else by a small built-in list of popular actions.

use std::path::{Path, PathBuf};

use scpl_catalog::{ActionSpec, Catalog};
use tracing::{info, warn};

/// (identifier, name, category) of the built-in popular actions.
const POPULAR_ACTIONS: &[(&str, &str, &str)] = &[
    ("is.workflow.actions.askllm", "Ask LLM", "AI"),
    ("is.workflow.actions.askchatgpt", "Ask ChatGPT", "AI"),
    (
        "com.anthropic.claudeforipad.AskClaudeIntentExtension",
        "Ask Claude",
        "AI",
    ),
    ("com.apple.clock.StartStopwatchIntent", "Start Stopwatch", "Clock"),
    ("com.apple.clock.StopStopwatchIntent", "Stop Stopwatch", "Clock"),
    ("com.apple.clock.CreateAlarmIntent", "Create Alarm", "Clock"),
    (
        "com.apple.VoiceMemos.CreateRecordingIntent",
        "Create Recording",
        "Voice Memos",
    ),
    (
        "com.apple.VoiceMemos.PlayRecordingIntent",
        "Play Recording",
        "Voice Memos",
    ),
    ("is.workflow.actions.appearance", "Set Dark/Light Mode", "System"),
    ("is.workflow.actions.takescreenshot", "Take Screenshot", "System"),
    ("is.workflow.actions.lockscreen", "Lock Screen", "System"),
    ("is.workflow.actions.runshellscript", "Run Shell Script", "Scripting"),
    ("is.workflow.actions.runapplescript", "Run AppleScript", "Scripting"),
    (
        "is.workflow.actions.runjavascriptforautomation",
        "Run JavaScript",
        "Scripting",
    ),
    ("is.workflow.actions.file.getfile", "Get File", "Files"),
    ("is.workflow.actions.file.savefile", "Save File", "Files"),
    ("is.workflow.actions.file.renamefile", "Rename File", "Files"),
    ("is.workflow.actions.file.revealfile", "Reveal in Finder", "Files"),
    ("is.workflow.actions.gettext", "Get Text", "Text"),
    ("is.workflow.actions.showresult", "Show Result", "Text"),
    ("is.workflow.actions.alert", "Show Alert", "Text"),
    ("is.workflow.actions.setvariable", "Set Variable", "Variables"),
    ("is.workflow.actions.getvariable", "Get Variable", "Variables"),
    ("is.workflow.actions.getclipboard", "Get Clipboard", "Clipboard"),
    ("is.workflow.actions.setclipboard", "Set Clipboard", "Clipboard"),
];

/// Where the index came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    Popular,
    File(PathBuf),
}

pub struct ActionIndex {
    catalog: Catalog,
    source: IndexSource,
}

/// A catalog entry together with its identifier.
#[derive(Debug, Clone, Copy)]
pub struct ActionRef<'a> {
    pub id: &'a str,
    pub spec: &'a ActionSpec,
}

impl<'a> ActionRef<'a> {
    pub fn name(&self) -> &'a str {
        self.spec.name.as_deref().unwrap_or(self.id)
    }

    pub fn category(&self) -> &'a str {
        self.spec.category.as_deref().unwrap_or("Uncategorized")
    }
}

impl ActionIndex {
    pub fn popular() -> Self {
        let mut catalog = Catalog::default();
        for (id, name, category) in POPULAR_ACTIONS {
            catalog.insert(
                id,
                ActionSpec {
                    name: Some((*name).to_string()),
                    category: Some((*category).to_string()),
                    ..ActionSpec::default()
                },
            );
        }
        Self {
            catalog,
            source: IndexSource::Popular,
        }
    }

    pub fn from_catalog(catalog: Catalog, source: IndexSource) -> Self {
        Self { catalog, source }
    }

    /// Load the generated catalog at `path`, falling back to the popular list
    /// when no path is given or the file cannot be used.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::popular();
        };
        match Catalog::from_json_file(path) {
            Ok(catalog) if !catalog.is_empty() => {
                info!(actions = catalog.len(), "loaded action catalog {}", path.display());
                Self::from_catalog(catalog, IndexSource::File(path.to_path_buf()))
            }
            Ok(_) => {
                warn!("action catalog {} is empty, using built-in list", path.display());
                Self::popular()
            }
            Err(e) => {
                warn!("{e}; using built-in action list");
                Self::popular()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn source(&self) -> &IndexSource {
        &self.source
    }

    fn entries(&self) -> impl Iterator<Item = ActionRef<'_>> {
        self.catalog
            .iter()
            .map(|(id, spec)| ActionRef { id: id.as_str(), spec })
    }

    /// Actions matching both filters, in catalog order. `category` compares
    /// case-insensitively; `search` is a case-insensitive substring over
    /// identifier, name, category, and keywords.
    pub fn filter(&self, category: Option<&str>, search: Option<&str>) -> Vec<ActionRef<'_>> {
        let category = category.map(str::to_lowercase);
        let search = search.map(str::to_lowercase);

        self.entries()
            .filter(|a| {
                category
                    .as_deref()
                    .map_or(true, |c| a.category().to_lowercase() == c)
            })
            .filter(|a| search.as_deref().map_or(true, |s| matches_search(a, s)))
            .collect()
    }

    /// Find one action by identifier, name, compact name (`AskLLM`), or the
    /// identifier's last segment (`showresult`).
    pub fn resolve(&self, query: &str) -> Option<ActionRef<'_>> {
        let query = query.trim();
        let lower = query.to_lowercase();
        let compact_query = compact(query);

        self.entries()
            .find(|a| a.id == query)
            .or_else(|| self.entries().find(|a| a.id.to_lowercase() == lower))
            .or_else(|| self.entries().find(|a| a.name().to_lowercase() == lower))
            .or_else(|| {
                self.entries()
                    .find(|a| !compact_query.is_empty() && compact(a.name()) == compact_query)
            })
            .or_else(|| {
                self.entries().find(|a| {
                    a.id
                        .rsplit('.')
                        .next()
                        .is_some_and(|last| last.to_lowercase() == lower)
                })
            })
    }

    /// Up to `limit` near matches for a failed lookup.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<ActionRef<'_>> {
        let compact_query = compact(query);
        if compact_query.is_empty() {
            return Vec::new();
        }
        self.entries()
            .filter(|a| {
                compact(a.name()).contains(&compact_query)
                    || a.id.to_lowercase().contains(&compact_query)
            })
            .take(limit)
            .collect()
    }
}

fn matches_search(action: &ActionRef<'_>, needle: &str) -> bool {
    action.id.to_lowercase().contains(needle)
        || action.name().to_lowercase().contains(needle)
        || action.category().to_lowercase().contains(needle)
        || action
            .spec
            .keywords()
            .iter()
            .any(|k| k.to_lowercase().contains(needle))
}

/// Lowercase alphanumerics only: "Ask LLM" and "AskLLM" both become "askllm".
fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popular_list_is_complete() {
        let index = ActionIndex::popular();
        assert_eq!(index.len(), 25);
        assert_eq!(index.source(), &IndexSource::Popular);
    }

    #[test]
    fn filter_by_category_ignores_case() {
        let index = ActionIndex::popular();
        let ai: Vec<_> = index.filter(Some("ai"), None).iter().map(|a| a.name()).collect();
        assert_eq!(ai, vec!["Ask LLM", "Ask ChatGPT", "Ask Claude"]);
    }

    #[test]
    fn search_matches_id_name_and_category() {
        let index = ActionIndex::popular();
        assert_eq!(index.filter(None, Some("CLIP")).len(), 2);
        assert_eq!(index.filter(None, Some("voice memos")).len(), 2);
        assert_eq!(index.filter(None, Some("stopwatch")).len(), 2);
    }

    #[test]
    fn category_and_search_combine() {
        let index = ActionIndex::popular();
        let hits = index.filter(Some("Files"), Some("save"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "is.workflow.actions.file.savefile");
        assert!(index.filter(Some("Clock"), Some("clipboard")).is_empty());
    }

    #[test]
    fn search_covers_keywords() {
        let mut catalog = Catalog::default();
        catalog.insert(
            "is.workflow.actions.runshellscript",
            ActionSpec {
                name: Some("Run Shell Script".into()),
                action_keywords: Some(vec!["bash".into(), "zsh".into()]),
                ..ActionSpec::default()
            },
        );
        let index = ActionIndex::from_catalog(catalog, IndexSource::Popular);
        assert_eq!(index.filter(None, Some("zsh")).len(), 1);
    }

    #[test]
    fn resolve_by_every_form() {
        let index = ActionIndex::popular();
        let id = |q: &str| index.resolve(q).map(|a| a.id.to_string());
        assert_eq!(id("is.workflow.actions.alert").as_deref(), Some("is.workflow.actions.alert"));
        assert_eq!(id("Show Result").as_deref(), Some("is.workflow.actions.showresult"));
        assert_eq!(id("AskLLM").as_deref(), Some("is.workflow.actions.askllm"));
        assert_eq!(id("takescreenshot").as_deref(), Some("is.workflow.actions.takescreenshot"));
        assert_eq!(id("  show alert ").as_deref(), Some("is.workflow.actions.alert"));
        assert!(index.resolve("Launch Rocket").is_none());
    }

    #[test]
    fn suggestions_for_partial_names() {
        let index = ActionIndex::popular();
        let names: Vec<_> = index.suggest("clipboard", 5).iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Get Clipboard", "Set Clipboard"]);
        assert!(index.suggest("  ", 5).is_empty());
    }

    #[test]
    fn load_generated_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OutActions.json");
        let mut catalog = Catalog::default();
        catalog.insert(
            "is.workflow.actions.vibrate",
            ActionSpec {
                name: Some("Vibrate Device".into()),
                ..ActionSpec::default()
            },
        );
        catalog.write_to(&path).unwrap();

        let index = ActionIndex::load(Some(&path));
        assert_eq!(index.len(), 1);
        assert_eq!(index.source(), &IndexSource::File(path.clone()));
        assert_eq!(index.resolve("vibrate").unwrap().category(), "Uncategorized");
    }

    #[test]
    fn unreadable_catalog_falls_back() {
        let index = ActionIndex::load(Some(Path::new("/nonexistent/OutActions.json")));
        assert_eq!(index.source(), &IndexSource::Popular);
        assert_eq!(index.len(), 25);
    }
}
