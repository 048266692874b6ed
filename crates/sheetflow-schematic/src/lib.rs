//! Hierarchical sheet placement for KiCad schematics.
//!
//! Given an existing `.kicad_sch` document and a list of [`SheetSpec`]s, this
//! crate lays the sheets out in rows, spreads their pins along the left and
//! right edges, stubs every pin that names a net with a short wire and label,
//! and registers each sheet under `sheet_instances` with its page number.
//!
//! The pieces can be used on their own:
//!
//! * [`PinDistributor`] computes pin heights for one sheet edge.
//! * [`SchematicDocument::add_hierarchical_sheet`] splices a single sheet.
//! * [`place_sheets`] flows a batch of sheets into rows.
//! * [`generate`] runs the whole thing from text to text.

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod pins;
pub mod placer;
pub mod sheet;
pub mod spec;
pub mod wiring;

pub use config::{load_sheet_specs, GapRule, LayoutConfig, ProjectConfig};
pub use document::{Justify, SchematicDocument, SheetSummary};
pub use error::{ConfigError, SchematicError, SpecError};
pub use geometry::{BoundingBox, Point, Size};
pub use pins::PinDistributor;
pub use placer::{place_sheets, PlacementRecord};
pub use sheet::{PlacedPin, PlacedSheet, SheetOptions};
pub use spec::{PinKind, PinSpec, SheetSpec, Side};
pub use wiring::{NetStub, NetWirer};

/// Parse `text`, place `sheets` into it and print the result.
///
/// Each spec gets its final position recorded; file I/O is left to the
/// caller.
pub fn generate(
    text: &str,
    sheets: &mut [SheetSpec],
    config: &LayoutConfig,
) -> Result<(String, Vec<PlacementRecord>), SchematicError> {
    let mut doc: SchematicDocument = text.parse()?;
    let records = place_sheets(&mut doc, sheets, config);
    Ok((doc.to_kicad_string(), records))
}
