//! Layout settings and sheet definitions loaded from TOML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::geometry::Point;
use crate::sheet::SheetOptions;
use crate::spec::SheetSpec;

/// How much space to leave after a block, given the block's size along the
/// flow direction
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapRule {
    /// Constant gap in millimeters
    Fixed(f64),
    /// `max(factor * size, minimum)`
    Proportional { factor: f64, minimum: f64 },
    /// Caller-supplied rule; only available from Rust
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

impl GapRule {
    pub fn gap(&self, size: f64) -> f64 {
        match *self {
            GapRule::Fixed(gap) => gap,
            GapRule::Proportional { factor, minimum } => (factor * size).max(minimum),
            GapRule::Custom(rule) => rule(size),
        }
    }
}

/// Settings for placing a batch of sheets
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Top-left corner of the first sheet
    pub origin: Point,
    /// Rows wrap once the next sheet would end past `origin.x + max_row_width`
    pub max_row_width: f64,
    pub horizontal_gap: GapRule,
    pub vertical_gap: GapRule,
    /// Page number of the first placed sheet; the root sheet is page 1
    pub page_start: u32,
    pub pin_margin: f64,
    pub min_pin_delta: f64,
    pub net_stub_length: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let options = SheetOptions::default();
        Self {
            origin: Point::new(50.0, 50.0),
            max_row_width: 180.0,
            horizontal_gap: GapRule::Proportional {
                factor: 0.5,
                minimum: 4.0,
            },
            vertical_gap: GapRule::Proportional {
                factor: 0.8,
                minimum: 6.0,
            },
            page_start: 2,
            pin_margin: options.pin_margin,
            min_pin_delta: options.min_pin_delta,
            net_stub_length: options.net_stub_length,
        }
    }
}

impl LayoutConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn sheet_options(&self) -> SheetOptions {
        SheetOptions {
            pin_margin: self.pin_margin,
            min_pin_delta: self.min_pin_delta,
            net_stub_length: self.net_stub_length,
        }
    }
}

/// A `[layout]` table plus any number of `[[sheet]]` entries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default, rename = "sheet")]
    pub sheets: Vec<SheetSpec>,
}

impl ProjectConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml_str(&text)
    }
}

/// Read only the `[[sheet]]` entries of a TOML document
pub fn load_sheet_specs(text: &str) -> Result<Vec<SheetSpec>, ConfigError> {
    #[derive(Deserialize)]
    struct Sheets {
        #[serde(default, rename = "sheet")]
        sheets: Vec<SheetSpec>,
    }

    let parsed: Sheets = toml::from_str(text)?;
    Ok(parsed.sheets)
}
