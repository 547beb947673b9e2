//! Embedded documentation: the ScPL syntax reference and the skill text
//! installed into host assistants.

/// Full syntax reference (Markdown).
pub const SYNTAX: &str = include_str!("../assets/syntax.md");

/// Skill instructions, without frontmatter.
pub const SKILL_BODY: &str = include_str!("../assets/skill.md");

pub const SKILL_DESCRIPTION: &str =
    "Create macOS Shortcuts from natural language descriptions using ScPL";

/// One `##` section of the syntax reference, heading included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub text: &'static str,
}

pub fn sections() -> Vec<Section> {
    split_sections(SYNTAX)
}

fn split_sections(doc: &'static str) -> Vec<Section> {
    let mut starts: Vec<usize> = doc.match_indices("\n## ").map(|(i, _)| i + 1).collect();
    if doc.starts_with("## ") {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(doc.len());
            let text = doc[start..end].trim_end();
            let title = text
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("## ")
                .trim();
            Section { title, text }
        })
        .collect()
}

pub fn topics() -> Vec<&'static str> {
    sections().into_iter().map(|s| s.title).collect()
}

/// First section whose heading contains `topic`, ignoring case.
pub fn section(topic: &str) -> Option<Section> {
    let topic = topic.trim().to_lowercase();
    if topic.is_empty() {
        return None;
    }
    sections()
        .into_iter()
        .find(|s| s.title.to_lowercase().contains(&topic))
}

/// Skill file with YAML frontmatter, as Claude Code and Codex expect it.
pub fn skill_document(name: &str) -> String {
    format!("---\nname: {name}\ndescription: {SKILL_DESCRIPTION}\n---\n\n{SKILL_BODY}")
}
