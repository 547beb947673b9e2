//! MCP tool definitions and handlers.
//!
//! Each tool is defined as a JSON schema (returned by [`tool_definitions`])
//! and handled by an async function dispatched from [`handle_tool_call`].
//!
//! ## Tools
//!
//! **Conversion** goes through the [`Converter`] backend:
//! - `create_shortcut`, `validate_scpl`
//!
//! **Lookup** is answered from in-process data:
//! - `list_actions`, `get_action_details` ([`ActionIndex`])
//! - `get_syntax_reference` ([`docs`])
//! - `get_examples` ([`ExampleLibrary`])

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::actions::{ActionIndex, ActionRef, IndexSource};
use crate::config::Config;
use crate::converter::Converter;
use crate::docs;
use crate::examples::{self, ExampleLibrary};
use crate::signing::Signer;
use crate::util::expand_tilde;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_SUGGESTIONS: usize = 5;

/// Everything the tool handlers need, built once at startup.
pub struct ToolContext {
    converter: Arc<dyn Converter>,
    signer: Signer,
    sign_by_default: bool,
    actions: ActionIndex,
    examples: ExampleLibrary,
    output_dir: PathBuf,
}

impl ToolContext {
    pub fn new(config: &Config, converter: Arc<dyn Converter>) -> Self {
        Self {
            converter,
            signer: Signer::from_config(&config.signing),
            sign_by_default: config.signing.enabled,
            actions: ActionIndex::load(config.catalog_path().as_deref()),
            examples: ExampleLibrary::builtin(),
            output_dir: config.output_dir(),
        }
    }

    pub fn examples(&self) -> &ExampleLibrary {
        &self.examples
    }
}

/// Returns all tool definitions.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "create_shortcut",
            "description": "Create a macOS Shortcut from ScPL code. Returns the path to the generated .shortcut file. On macOS the file is signed so it can be imported with a double-click.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "scpl_code": {
                        "type": "string",
                        "description": "The ScPL code to convert to a shortcut"
                    },
                    "output_name": {
                        "type": "string",
                        "description": "Name for the output .shortcut file (without extension)"
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Optional output directory (defaults to ~/Documents). Created if missing."
                    },
                    "sign": {
                        "type": "boolean",
                        "description": "Sign with `shortcuts sign`. Defaults to true on macOS."
                    }
                },
                "required": ["scpl_code", "output_name"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "validate_scpl",
            "description": "Validate ScPL code syntax without creating a file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "scpl_code": {
                        "type": "string",
                        "description": "The ScPL code to validate"
                    }
                },
                "required": ["scpl_code"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "list_actions",
            "description": "List available ScPL actions. Filter by category or search term.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Optional category filter (e.g., 'Scripting', 'Files', 'AI')"
                    },
                    "search": {
                        "type": "string",
                        "description": "Optional search term matched against identifier, name, category and keywords"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of actions to return (default 50)"
                    }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_action_details",
            "description": "Show the description, input, output and parameters of one action. Accepts an identifier (is.workflow.actions.showresult), a name (Show Result) or an ScPL name (ShowResult).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "description": "Action identifier or name"
                    }
                },
                "required": ["action"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_syntax_reference",
            "description": "ScPL syntax reference. Omit topic for the whole reference.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "Optional topic, e.g. 'variables', 'conditionals', 'menus', 'loops'"
                    }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_examples",
            "description": "Example shortcuts written in ScPL. Filter by tag or search term.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tag": {
                        "type": "string",
                        "description": "Optional tag, e.g. 'ai', 'clipboard', 'shell'"
                    },
                    "search": {
                        "type": "string",
                        "description": "Optional search term matched against slug, name, description and code"
                    }
                },
                "additionalProperties": false
            }
        }),
    ]
}

/// Handle a tool call and return MCP content.
pub async fn handle_tool_call(name: &str, args: &Value, ctx: &ToolContext) -> ToolResult {
    match name {
        "create_shortcut" => handle_create_shortcut(args, ctx).await,
        "validate_scpl" => handle_validate_scpl(args, ctx).await,
        "list_actions" => handle_list_actions(args, ctx),
        "get_action_details" => handle_get_action_details(args, ctx),
        "get_syntax_reference" => handle_get_syntax_reference(args),
        "get_examples" => handle_get_examples(args, ctx),
        _ => ToolResult::error(format!("Unknown tool: {name}")),
    }
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC response.
#[derive(Debug)]
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn success(text: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }

    /// Text of the first content block.
    #[cfg(test)]
    pub fn text(&self) -> &str {
        self.content
            .first()
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn missing(param: &str) -> ToolResult {
    ToolResult::error(format!("Missing required parameter: {param}"))
}

/// `output_name` becomes a file name, never a path.
fn validate_output_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("output_name must not be empty".into());
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!("output_name must not contain path separators: {name}"));
    }
    if name.contains("..") {
        return Err(format!("output_name must not contain '..': {name}"));
    }
    Ok(())
}

const INSTALL_UNSIGNED: &str = "📝 To install:\n\
1. Download \"Shortcut Source Helper\" from RoutineHub\n\
2. Drag {file} onto it\n\
3. Follow the prompts to sign and import\n\n\
The shortcut will be added to your Shortcuts app!";

fn unsigned_instructions(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    INSTALL_UNSIGNED.replace("{file}", &file)
}

async fn handle_create_shortcut(args: &Value, ctx: &ToolContext) -> ToolResult {
    let Some(code) = str_arg(args, "scpl_code") else {
        return missing("scpl_code");
    };
    let Some(name) = str_arg(args, "output_name") else {
        return missing("output_name");
    };
    if let Err(e) = validate_output_name(name) {
        return ToolResult::error(e);
    }
    let dir = str_arg(args, "output_dir")
        .filter(|d| !d.trim().is_empty())
        .map(|d| expand_tilde(Path::new(d)))
        .unwrap_or_else(|| ctx.output_dir.clone());
    // The signer runs inside the output directory, so relative paths would resolve twice.
    let dir = match std::path::absolute(&dir) {
        Ok(d) => d,
        Err(e) => {
            return ToolResult::error(format!(
                "Invalid output directory {}: {e}",
                dir.display()
            ))
        }
    };
    let sign = args
        .get("sign")
        .and_then(Value::as_bool)
        .unwrap_or(ctx.sign_by_default);

    let bytes = match ctx.converter.convert(code).await {
        Ok(b) => b,
        Err(e) => return ToolResult::error(format!("❌ ScPL conversion failed:\n\n{e}")),
    };

    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        return ToolResult::error(format!(
            "Failed to create output directory {}: {e}",
            dir.display()
        ));
    }
    let final_path = dir.join(format!("{name}.shortcut"));

    if !sign {
        if let Err(e) = tokio::fs::write(&final_path, &bytes).await {
            return ToolResult::error(format!("Failed to write {}: {e}", final_path.display()));
        }
        info!(path = %final_path.display(), "shortcut created (unsigned)");
        return ToolResult::success(format!(
            "✅ Shortcut created successfully!\n\nPath: {}\n\n{}",
            final_path.display(),
            unsigned_instructions(&final_path)
        ));
    }

    let unsigned_path = dir.join(format!("{name}.unsigned.shortcut"));
    if let Err(e) = tokio::fs::write(&unsigned_path, &bytes).await {
        return ToolResult::error(format!("Failed to write {}: {e}", unsigned_path.display()));
    }

    match ctx.signer.sign(&unsigned_path, &final_path).await {
        Ok(()) => {
            if let Err(e) = tokio::fs::remove_file(&unsigned_path).await {
                warn!(path = %unsigned_path.display(), "failed to remove unsigned copy: {e}");
            }
            info!(path = %final_path.display(), "shortcut created and signed");
            ToolResult::success(format!(
                "✅ Shortcut created and signed!\n\nPath: {}\n\n\
                 📝 To install: double-click {name}.shortcut (or run `open \"{}\"`) \
                 and confirm in the Shortcuts app.",
                final_path.display(),
                final_path.display()
            ))
        }
        Err(e) => {
            warn!(path = %unsigned_path.display(), "signing failed, keeping unsigned shortcut: {e}");
            ToolResult::success(format!(
                "✅ Shortcut created, but signing failed: {e}\n\nPath: {}\n\n{}",
                unsigned_path.display(),
                unsigned_instructions(&unsigned_path)
            ))
        }
    }
}

async fn handle_validate_scpl(args: &Value, ctx: &ToolContext) -> ToolResult {
    let Some(code) = str_arg(args, "scpl_code") else {
        return missing("scpl_code");
    };
    match ctx.converter.validate(code).await {
        Ok(()) => ToolResult::success("✅ ScPL code is valid!".into()),
        Err(e) => ToolResult::error(format!("❌ ScPL validation failed:\n\n{e}")),
    }
}

fn action_line(action: &ActionRef<'_>) -> String {
    format!(
        "• **{}** - `{}` ({})",
        action.name(),
        action.id,
        action.category()
    )
}

fn handle_list_actions(args: &Value, ctx: &ToolContext) -> ToolResult {
    let category = str_arg(args, "category").filter(|s| !s.trim().is_empty());
    let search = str_arg(args, "search").filter(|s| !s.trim().is_empty());
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIST_LIMIT);

    let matches = ctx.actions.filter(category, search);
    let mut text = if matches.is_empty() {
        "No actions found.".to_string()
    } else {
        let lines: Vec<String> = matches.iter().take(limit).map(action_line).collect();
        format!("Found {} actions:\n\n{}", matches.len(), lines.join("\n"))
    };

    if matches.len() > limit {
        text.push_str(&format!(
            "\n\n… showing the first {limit}. Narrow the search or raise `limit`."
        ));
    }

    match ctx.actions.source() {
        IndexSource::Popular => text.push_str(&format!(
            "\n\n💡 This is a subset of {} popular actions. Configure a generated \
             OutActions.json (`[catalog] path` or SCPL_ACTIONS) to search every action.",
            ctx.actions.len()
        )),
        IndexSource::File(path) => text.push_str(&format!(
            "\n\n💡 Searched {} actions from {}.",
            ctx.actions.len(),
            path.display()
        )),
    }
    ToolResult::success(text)
}

fn render_action_details(action: &ActionRef<'_>) -> String {
    let spec = action.spec;
    let mut out = format!("## {}\n\n**Identifier:** `{}`\n", action.name(), action.id);

    match &spec.subcategory {
        Some(sub) => out.push_str(&format!("**Category:** {} / {sub}\n", action.category())),
        None => out.push_str(&format!("**Category:** {}\n", action.category())),
    }
    if let Some(app) = &spec.app_info {
        out.push_str(&format!("**App:** {app}\n"));
    }
    if let Some(summary) = spec.summary() {
        out.push_str(&format!("\n{summary}\n"));
    }

    if let Some(input) = &spec.input {
        let required = if input.required == Some(true) { " (required)" } else { "" };
        out.push_str(&format!("\n**Input:** {}{required}\n", join_or_any(&input.types)));
    }
    if let Some(output) = &spec.output {
        let name = output
            .output_name
            .as_deref()
            .map(|n| format!(" as \"{n}\""))
            .unwrap_or_default();
        out.push_str(&format!("**Output:** {}{name}\n", join_or_any(&output.types)));
    }

    let params: Vec<_> = spec
        .parameters()
        .iter()
        .filter(|p| p.hidden != Some(true))
        .collect();
    if params.is_empty() {
        out.push_str("\nNo parameters.\n");
        return out;
    }

    out.push_str("\n### Parameters\n\n");
    for p in params {
        let key = p.key.as_deref().unwrap_or("?");
        let label = p.label.as_deref().unwrap_or(key);
        let class = p.class.as_deref().unwrap_or("Parameter");
        out.push_str(&format!("- **{label}** (`{key}`, {class})"));

        let items = p.item_labels();
        if !items.is_empty() {
            out.push_str(&format!(": one of {}", items.join(", ")));
        }
        if let Some(default) = &p.default_value {
            let default = match default {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(&format!(" [default: {default}]"));
        }
        out.push('\n');
    }
    out
}

fn join_or_any(types: &[String]) -> String {
    if types.is_empty() {
        "Anything".to_string()
    } else {
        types.join(", ")
    }
}

fn handle_get_action_details(args: &Value, ctx: &ToolContext) -> ToolResult {
    let Some(query) = str_arg(args, "action") else {
        return missing("action");
    };

    if let Some(action) = ctx.actions.resolve(query) {
        return ToolResult::success(render_action_details(&action));
    }

    let suggestions = ctx.actions.suggest(query, MAX_SUGGESTIONS);
    let mut text = format!("Action not found: {query}");
    if !suggestions.is_empty() {
        let lines: Vec<String> = suggestions.iter().map(action_line).collect();
        text.push_str(&format!("\n\nDid you mean:\n{}", lines.join("\n")));
    }
    ToolResult::error(text)
}

fn handle_get_syntax_reference(args: &Value) -> ToolResult {
    let Some(topic) = str_arg(args, "topic").filter(|t| !t.trim().is_empty()) else {
        return ToolResult::success(docs::SYNTAX.to_string());
    };
    match docs::section(topic) {
        Some(section) => ToolResult::success(section.text.to_string()),
        None => ToolResult::error(format!(
            "Unknown topic: {topic}\n\nAvailable topics: {}",
            docs::topics().join(", ")
        )),
    }
}

fn handle_get_examples(args: &Value, ctx: &ToolContext) -> ToolResult {
    let tag = str_arg(args, "tag").filter(|s| !s.trim().is_empty());
    let search = str_arg(args, "search").filter(|s| !s.trim().is_empty());

    let found = ctx.examples.filter(tag, search);
    if found.is_empty() {
        return ToolResult::success(format!(
            "No examples found.\n\nAvailable tags: {}",
            ctx.examples.tags().join(", ")
        ));
    }
    ToolResult::success(examples::render(&found))
}
