//! # scpl-catalog
//!
//! Shortcuts action catalog: the data model shared by the MCP server, and the
//! post-processing that turns the vendor dump (`Shortcuts 2.2.json`) into
//! `OutActions.json`.
//!
//! ```text
//! spec.rs          ActionSpec / ParameterSpec / Catalog / TypeTable
//! fixups.rs        fixed corrections and the macOS Tahoe additions
//! content_items.rs property/filter parameter synthesis
//! error.rs         CatalogError
//! main.rs          gen-actions binary
//! ```

pub mod content_items;
pub mod error;
pub mod fixups;
pub mod spec;

use std::path::Path;

pub use content_items::{synthesize_content_item_parameters, SynthesisReport};
pub use error::CatalogError;
pub use fixups::apply_fixups;
pub use spec::{ActionSpec, BlockInfo, Catalog, ParameterSpec, TypeTable};

/// Load the vendor catalog and type table, then apply fixups and parameter
/// synthesis.
pub fn generate(
    builtin: &Path,
    types: &Path,
) -> Result<(Catalog, SynthesisReport), CatalogError> {
    let mut catalog = Catalog::load_vendor(builtin)?;
    let types = TypeTable::load(types)?;
    apply_fixups(&mut catalog)?;
    let report = synthesize_content_item_parameters(&mut catalog, &types);
    Ok((catalog, report))
}
