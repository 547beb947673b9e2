//! # scpl-mcp
//!
//! MCP (Model Context Protocol) server that turns ScPL code into macOS
//! Shortcuts. Runs as a stdio JSON-RPC server launched by an AI agent host
//! (Claude Code, Codex, Gemini CLI), or in installer mode registers itself
//! with those hosts.
//!
//! ## Architecture
//!
//! ```text
//! main.rs       entry point, config loading, mode selection
//! config.rs     CLI flags, TOML file and env-var configuration
//! mcp.rs        MCP JSON-RPC protocol handler (stdio)
//! tools.rs      tool definitions and handlers
//! converter.rs  Converter trait and the external ScPL backend
//! signing.rs    `shortcuts sign` wrapper
//! process.rs    subprocess execution with timeout and capped output
//! actions.rs    action lookup over the generated catalog
//! docs.rs       embedded syntax reference and skill text
//! examples.rs   embedded example shortcuts (pure data)
//! setup/        installer mode, one module per host
//! ```
//!
//! ## Tools
//!
//! - **Conversion**: `create_shortcut`, `validate_scpl`
//! - **Lookup**: `list_actions`, `get_action_details`,
//!   `get_syntax_reference`, `get_examples`

mod actions;
mod config;
mod converter;
mod docs;
mod examples;
mod mcp;
mod process;
mod setup;
mod signing;
mod tools;
mod util;

use std::sync::Arc;

use clap::Parser;
use config::{Cli, Config};
use converter::CommandConverter;
use tools::ToolContext;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if cli.is_setup() {
        init_logging("warn");
        let ok = setup::run(&cli);
        std::process::exit(if ok { 0 } else { 1 });
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("scpl-mcp: configuration error: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config.logging.level);

    let converter = CommandConverter::from_config(&config.converter);
    let ctx = ToolContext::new(&config, Arc::new(converter));

    info!(
        converter = %config.converter.command,
        output_dir = %config.output_dir().display(),
        signing = config.signing.enabled,
        "scpl-mcp {} ready on stdio",
        env!("CARGO_PKG_VERSION")
    );

    mcp::run_stdio(ctx).await;
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging(default_level: &str) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();
}
