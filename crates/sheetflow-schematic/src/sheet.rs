//! Materializing one hierarchical sheet block in a schematic.

use log::{debug, warn};
use serde::Serialize;
use sheetflow_sexpr::Sexpr;
use uuid::Uuid;

use crate::document::{at_angle, effects, SchematicDocument};
use crate::geometry::{Point, Size};
use crate::pins::{split_by_side, PinDistributor};
use crate::spec::{PinKind, PinSpec, SheetSpec, Side, SHEET_FILE_PROPERTY, SHEET_NAME_PROPERTY};
use crate::wiring::{NetStub, NetWirer};

/// Offset of the name and file fields from the sheet's top-left corner
const FIELD_INSET: f64 = 2.0;

/// Pin and stub geometry used while materializing a sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetOptions {
    pub pin_margin: f64,
    pub min_pin_delta: f64,
    pub net_stub_length: f64,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            pin_margin: 2.0,
            min_pin_delta: 1.0,
            net_stub_length: 5.0,
        }
    }
}

/// A pin as written into the sheet block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPin {
    pub name: String,
    pub kind: PinKind,
    pub side: Side,
    /// Anchor on the sheet edge, in schematic coordinates
    pub position: Point,
    pub net: Option<String>,
    pub uuid: String,
}

/// Result of adding one sheet to a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedSheet {
    pub uuid: String,
    pub position: Point,
    pub size: Size,
    /// Left-edge pins first, then right-edge pins, each group in spec order
    pub pins: Vec<PlacedPin>,
    /// Pins that ended up past the edge margins or closer than the minimum
    /// spacing because the edge is too short for them
    pub crowded_pins: Vec<String>,
    pub stubs: Vec<NetStub>,
}

impl SchematicDocument {
    /// Add a sheet block for `spec` with its top-left corner at `at`, record
    /// it on `page` and stub out the nets of its pins.
    pub fn add_hierarchical_sheet(
        &mut self,
        spec: &SheetSpec,
        at: Point,
        page: u32,
        options: &SheetOptions,
    ) -> PlacedSheet {
        let sheet_uuid = Uuid::new_v4().to_string();
        let size = spec.size();
        let distributor = PinDistributor::new(options.pin_margin, options.min_pin_delta);

        let (left, right) = split_by_side(spec.pins());
        debug!(
            "Sheet {} at ({}, {}): {} left pins, {} right pins",
            spec.name(),
            at.x,
            at.y,
            left.len(),
            right.len()
        );

        let mut pins = Vec::with_capacity(spec.pins().len());
        let mut crowded_pins = Vec::new();
        for (group, side, x) in [
            (&left, Side::Left, at.x),
            (&right, Side::Right, at.x + size.width),
        ] {
            let (placed, crowded) = place_edge(&distributor, group, side, x, at.y, size.height);
            crowded_pins.extend(crowded);
            pins.extend(placed);
        }

        if !crowded_pins.is_empty() {
            warn!(
                "Sheet {} is too short for its pins; crowded: {}",
                spec.name(),
                crowded_pins.join(", ")
            );
        }

        let block = sheet_block(spec, at, &sheet_uuid, &pins);
        self.insert_before_trailer(block);
        self.ensure_root_uuid();
        self.add_sheet_instance(&sheet_uuid, page);

        let wirer = NetWirer::new(options.net_stub_length);
        let stubs = pins
            .iter()
            .filter_map(|pin| wirer.wire(self, pin))
            .collect();

        PlacedSheet {
            uuid: sheet_uuid,
            position: at,
            size,
            pins,
            crowded_pins,
            stubs,
        }
    }
}

/// Distribute one edge group and return the placed pins plus the names of
/// crowded ones
fn place_edge(
    distributor: &PinDistributor,
    group: &[&PinSpec],
    side: Side,
    x: f64,
    top: f64,
    height: f64,
) -> (Vec<PlacedPin>, Vec<String>) {
    let bottom = top + height;
    let explicit: Vec<Option<f64>> = group
        .iter()
        .map(|pin| pin.offset().map(|offset| top + offset))
        .collect();
    let ys = distributor.distribute(top, bottom, &explicit);

    let crowded = distributor
        .crowded(top, bottom, &ys)
        .into_iter()
        .map(|i| group[i].name().to_string())
        .collect();

    let placed = group
        .iter()
        .zip(ys)
        .map(|(pin, y)| PlacedPin {
            name: pin.name().to_string(),
            kind: pin.kind(),
            side,
            position: Point::new(x, y),
            net: pin.net().map(str::to_string),
            uuid: Uuid::new_v4().to_string(),
        })
        .collect();

    (placed, crowded)
}

fn sheet_block(spec: &SheetSpec, at: Point, uuid: &str, pins: &[PlacedPin]) -> Sexpr {
    let size = spec.size();
    let zero_color = || {
        Sexpr::tagged(
            "color",
            [
                Sexpr::number(0.0),
                Sexpr::number(0.0),
                Sexpr::number(0.0),
                Sexpr::number(0.0),
            ],
        )
    };

    let mut items = vec![
        Sexpr::tagged("at", [Sexpr::number(at.x), Sexpr::number(at.y)]),
        Sexpr::tagged(
            "size",
            [Sexpr::number(size.width), Sexpr::number(size.height)],
        ),
        Sexpr::tagged("fields_autoplaced", []),
        Sexpr::tagged(
            "stroke",
            [
                Sexpr::tagged("width", [Sexpr::number(0.1524)]),
                Sexpr::tagged("type", [Sexpr::symbol("solid")]),
                zero_color(),
            ],
        ),
        Sexpr::tagged("fill", [zero_color()]),
        Sexpr::tagged("uuid", [Sexpr::string(uuid)]),
        property(
            SHEET_NAME_PROPERTY,
            spec.name(),
            0,
            at.offset(FIELD_INSET, -FIELD_INSET),
            Sexpr::tagged("justify", [Sexpr::symbol("left")]),
        ),
        property(
            SHEET_FILE_PROPERTY,
            spec.file(),
            1,
            at.offset(FIELD_INSET, FIELD_INSET),
            Sexpr::tagged("justify", [Sexpr::symbol("left")]),
        ),
    ];

    for (id, (key, value)) in (2..).zip(spec.properties()) {
        items.push(property(
            key,
            value,
            id,
            at,
            Sexpr::tagged("hide", [Sexpr::symbol("yes")]),
        ));
    }

    items.extend(pins.iter().map(pin_entry));
    Sexpr::tagged("sheet", items)
}

fn property(key: &str, value: &str, id: u32, at: Point, style: Sexpr) -> Sexpr {
    Sexpr::tagged(
        "property",
        [
            Sexpr::string(key),
            Sexpr::string(value),
            Sexpr::tagged("id", [Sexpr::number(id as f64)]),
            at_angle(at, 0.0),
            effects([style]),
        ],
    )
}

fn pin_entry(pin: &PlacedPin) -> Sexpr {
    // Left pins point outwards to the left, text reads into the sheet
    let (angle, justify) = match pin.side {
        Side::Left => (180.0, "left"),
        Side::Right => (0.0, "right"),
    };
    Sexpr::tagged(
        "pin",
        [
            Sexpr::string(pin.name.as_str()),
            Sexpr::symbol(pin.kind.as_str()),
            at_angle(pin.position, angle),
            effects([Sexpr::tagged("justify", [Sexpr::symbol(justify)])]),
            Sexpr::tagged("uuid", [Sexpr::string(pin.uuid.as_str())]),
        ],
    )
}
