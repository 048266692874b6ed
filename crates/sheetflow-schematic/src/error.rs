use std::path::PathBuf;

use sheetflow_sexpr::ParseError;

/// Errors raised while building sheet and pin definitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error("Sheet name must not be empty")]
    EmptySheetName,

    #[error("Sheet {0} has an empty file path")]
    EmptySheetFile(String),

    #[error("Sheet {sheet} has an invalid size {width} x {height}")]
    InvalidSize {
        sheet: String,
        width: f64,
        height: f64,
    },

    #[error("Pin name must not be empty")]
    EmptyPinName,

    #[error("Pin {pin} has an invalid offset {offset}")]
    InvalidOffset { pin: String, offset: f64 },

    #[error("Property {0} is reserved for the sheet name and file")]
    ReservedProperty(String),
}

/// Errors raised while loading layout or sheet configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors surfaced by document-level operations
#[derive(Debug, thiserror::Error)]
pub enum SchematicError {
    #[error("Failed to parse schematic: {0}")]
    Parse(#[from] ParseError),

    #[error("Schematic root must be a list, found an atom")]
    NotAList,

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
