//! Example shortcut library.
//!
//! Each example is a Markdown file with YAML frontmatter and a single fenced
//! `scpl` block, compiled into the binary:
//!
//! ~~~markdown
//! ---
//! name: Shell Script
//! description: Run a zsh command and show its output
//! tags: [scripting, shell]
//! ---
//! ```scpl
//! RunShellScript shell="/bin/zsh" script="echo Hello World"
//! ShowResult
//! ```
//! ~~~
//!
//! Pure data, no I/O.

use serde::Deserialize;
use tracing::warn;

const SOURCES: &[(&str, &str)] = &[
    (
        "apple-intelligence",
        include_str!("../assets/examples/apple-intelligence.md"),
    ),
    ("timer", include_str!("../assets/examples/timer.md")),
    ("shell-script", include_str!("../assets/examples/shell-script.md")),
    ("clipboard", include_str!("../assets/examples/clipboard.md")),
    ("menu", include_str!("../assets/examples/menu.md")),
    ("variables", include_str!("../assets/examples/variables.md")),
];

/// A parsed example.
#[derive(Clone, Debug)]
pub struct Example {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub code: String,
}

impl Example {
    pub fn to_markdown(&self) -> String {
        format!(
            "## {}\n\n{}\n\n```scpl\n{}\n```\n",
            self.name, self.description, self.code
        )
    }

    fn matches(&self, tag: Option<&str>, search: Option<&str>) -> bool {
        let tag_ok = tag.map_or(true, |t| {
            self.tags.iter().any(|own| own.eq_ignore_ascii_case(t.trim()))
        });
        let search_ok = search.map_or(true, |s| {
            let needle = s.to_lowercase();
            self.slug.contains(&needle)
                || self.name.to_lowercase().contains(&needle)
                || self.description.to_lowercase().contains(&needle)
                || self.code.to_lowercase().contains(&needle)
        });
        tag_ok && search_ok
    }
}

#[derive(Deserialize)]
struct FrontMatter {
    name: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse an example from its Markdown source.
pub fn parse_example(slug: &str, markdown: &str) -> Result<Example, String> {
    let trimmed = markdown.trim_start();
    if !trimmed.starts_with("---") {
        return Err("Missing YAML frontmatter (must start with ---)".into());
    }

    let after_open = &trimmed[3..];
    let close_pos = after_open
        .find("\n---")
        .ok_or("Missing closing --- for frontmatter")?;
    let yaml_str = &after_open[..close_pos];
    let body = &after_open[close_pos + 4..];

    let fm: FrontMatter =
        serde_yaml::from_str(yaml_str).map_err(|e| format!("YAML parse error: {e}"))?;
    if fm.name.is_empty() {
        return Err("Example name is empty".into());
    }

    Ok(Example {
        slug: slug.to_string(),
        name: fm.name,
        description: fm.description,
        tags: fm.tags,
        code: extract_scpl_block(body)?,
    })
}

/// Contents of the first fenced ```scpl block.
fn extract_scpl_block(body: &str) -> Result<String, String> {
    let mut in_block = false;
    let mut lines = Vec::new();

    for line in body.lines() {
        if !in_block {
            if line.trim().starts_with("```scpl") {
                in_block = true;
            }
        } else if line.trim().starts_with("```") {
            return Ok(lines.join("\n"));
        } else {
            lines.push(line);
        }
    }

    if in_block {
        return Err("Unclosed code block".into());
    }
    Err("No ```scpl code block found".into())
}

pub struct ExampleLibrary {
    examples: Vec<Example>,
}

impl ExampleLibrary {
    /// The compiled-in examples. Malformed entries are logged and skipped.
    pub fn builtin() -> Self {
        let examples = SOURCES
            .iter()
            .filter_map(|(slug, src)| match parse_example(slug, src) {
                Ok(ex) => Some(ex),
                Err(e) => {
                    warn!("skipping example {slug}: {e}");
                    None
                }
            })
            .collect();
        Self { examples }
    }

    pub fn all(&self) -> &[Example] {
        &self.examples
    }

    pub fn filter(&self, tag: Option<&str>, search: Option<&str>) -> Vec<&Example> {
        self.examples
            .iter()
            .filter(|ex| ex.matches(tag, search))
            .collect()
    }

    /// Every tag in use, sorted and deduplicated.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .examples
            .iter()
            .flat_map(|ex| ex.tags.iter().map(String::as_str))
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }
}

/// Render examples as one Markdown document.
pub fn render(examples: &[&Example]) -> String {
    let mut out = String::from("# ScPL Examples\n");
    for ex in examples {
        out.push('\n');
        out.push_str(&ex.to_markdown());
    }
    out
}
