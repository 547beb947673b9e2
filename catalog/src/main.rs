//! `gen-actions`: one-shot conversion of the vendor action dump into the
//! catalog consumed by `scpl-mcp`.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

/// Post-process the Shortcuts action catalog.
#[derive(Parser)]
#[command(name = "gen-actions", version)]
struct Cli {
    /// Vendor catalog (`Shortcuts 2.2.json`)
    #[arg(long)]
    builtin: PathBuf,
    /// Coercion type table (JSON)
    #[arg(long)]
    types: PathBuf,
    /// Output file
    #[arg(long, default_value = "OutActions.json")]
    out: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let (catalog, report) = match scpl_catalog::generate(&cli.builtin, &cli.types) {
        Ok(v) => v,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!(
        actions = catalog.len(),
        property_actions = report.property_actions,
        undefined_coercions = report.undefined_coercions,
        filter_actions = report.filter_actions,
        skipped_filters = report.skipped_filters,
        "catalog generated"
    );

    if let Err(e) = catalog.write_to(&cli.out) {
        error!("{e}");
        std::process::exit(1);
    }
    info!("wrote {}", cli.out.display());
}
