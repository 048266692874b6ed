//! Typed descriptions of the hierarchical sheets to place.
//!
//! Both structures validate their fields when built, whether through the
//! constructors or through `serde` (which goes through the same checks).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::geometry::{Point, Size};

/// Property names written for every sheet
pub const SHEET_NAME_PROPERTY: &str = "Sheet name";
pub const SHEET_FILE_PROPERTY: &str = "Sheet file";

/// Electrical type of a sheet pin, written as the pin's shape keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    #[default]
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
    PowerIn,
    PowerOut,
}

impl PinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinKind::Input => "input",
            PinKind::Output => "output",
            PinKind::Bidirectional => "bidirectional",
            PinKind::TriState => "tri_state",
            PinKind::Passive => "passive",
            PinKind::PowerIn => "power_in",
            PinKind::PowerOut => "power_out",
        }
    }

    /// Inputs sit on the left edge and outputs on the right; other kinds
    /// have no natural side.
    pub fn default_side(&self) -> Option<Side> {
        match self {
            PinKind::Input | PinKind::PowerIn => Some(Side::Left),
            PinKind::Output | PinKind::PowerOut => Some(Side::Right),
            PinKind::Bidirectional | PinKind::TriState | PinKind::Passive => None,
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(PinKind::Input),
            "output" => Ok(PinKind::Output),
            "bidirectional" => Ok(PinKind::Bidirectional),
            "tri_state" => Ok(PinKind::TriState),
            "passive" => Ok(PinKind::Passive),
            "power_in" => Ok(PinKind::PowerIn),
            "power_out" => Ok(PinKind::PowerOut),
            other => Err(format!("Unknown pin kind: {other}")),
        }
    }
}

/// Vertical edge of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// One pin on the edge of a sheet
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PinDef")]
pub struct PinSpec {
    name: String,
    kind: PinKind,
    offset: Option<f64>,
    side: Option<Side>,
    net: Option<String>,
}

impl PinSpec {
    pub fn new(name: impl Into<String>, kind: PinKind) -> Result<Self, SpecError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SpecError::EmptyPinName);
        }
        Ok(Self {
            name,
            kind,
            offset: None,
            side: None,
            net: None,
        })
    }

    /// Pin at a fixed distance below the sheet's top edge instead of an
    /// automatically spread position
    pub fn with_offset(mut self, offset: f64) -> Result<Self, SpecError> {
        if !offset.is_finite() {
            return Err(SpecError::InvalidOffset {
                pin: self.name,
                offset,
            });
        }
        self.offset = Some(offset);
        Ok(self)
    }

    /// Preferred edge; ignored for kinds that imply one
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Net to stub out with a wire and label; an empty name means no net
    pub fn with_net(mut self, net: impl Into<String>) -> Self {
        let net = net.into();
        self.net = (!net.is_empty()).then_some(net);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PinKind {
        self.kind
    }

    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    pub fn net(&self) -> Option<&str> {
        self.net.as_deref()
    }

    /// The edge this pin is drawn on
    pub fn side(&self) -> Side {
        self.kind
            .default_side()
            .or(self.side)
            .unwrap_or(Side::Right)
    }
}

#[derive(Deserialize)]
struct PinDef {
    name: String,
    #[serde(default)]
    kind: PinKind,
    offset: Option<f64>,
    side: Option<Side>,
    net: Option<String>,
}

impl TryFrom<PinDef> for PinSpec {
    type Error = SpecError;

    fn try_from(def: PinDef) -> Result<Self, Self::Error> {
        let mut pin = PinSpec::new(def.name, def.kind)?;
        if let Some(offset) = def.offset {
            pin = pin.with_offset(offset)?;
        }
        if let Some(side) = def.side {
            pin = pin.with_side(side);
        }
        if let Some(net) = def.net {
            pin = pin.with_net(net);
        }
        Ok(pin)
    }
}

/// A hierarchical sheet block to add to a schematic
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SheetDef")]
pub struct SheetSpec {
    name: String,
    file: String,
    size: Size,
    properties: BTreeMap<String, String>,
    pins: Vec<PinSpec>,
    position: Option<Point>,
}

impl SheetSpec {
    pub fn new(
        name: impl Into<String>,
        file: impl Into<String>,
        size: Size,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        let file = file.into();
        if name.trim().is_empty() {
            return Err(SpecError::EmptySheetName);
        }
        if file.trim().is_empty() {
            return Err(SpecError::EmptySheetFile(name));
        }
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(size.width) || !valid(size.height) {
            return Err(SpecError::InvalidSize {
                sheet: name,
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self {
            name,
            file,
            size,
            properties: BTreeMap::new(),
            pins: Vec::new(),
            position: None,
        })
    }

    /// Extra property, written hidden on the sheet
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, SpecError> {
        let key = key.into();
        if key == SHEET_NAME_PROPERTY || key == SHEET_FILE_PROPERTY {
            return Err(SpecError::ReservedProperty(key));
        }
        self.properties.insert(key, value.into());
        Ok(self)
    }

    pub fn with_pin(mut self, pin: PinSpec) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn with_pins(mut self, pins: impl IntoIterator<Item = PinSpec>) -> Self {
        self.pins.extend(pins);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn pins(&self) -> &[PinSpec] {
        &self.pins
    }

    /// Top-left corner, known once the sheet has been placed
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = Some(position);
    }
}

#[derive(Deserialize)]
struct SheetDef {
    name: String,
    file: String,
    size: Size,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    pins: Vec<PinSpec>,
}

impl TryFrom<SheetDef> for SheetSpec {
    type Error = SpecError;

    fn try_from(def: SheetDef) -> Result<Self, Self::Error> {
        let mut sheet = SheetSpec::new(def.name, def.file, def.size)?;
        for (key, value) in def.properties {
            sheet = sheet.with_property(key, value)?;
        }
        Ok(sheet.with_pins(def.pins))
    }
}
