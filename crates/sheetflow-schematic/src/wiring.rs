//! Short wire stubs with net labels attached to sheet pins.

use log::trace;
use serde::Serialize;

use crate::document::{Justify, SchematicDocument};
use crate::geometry::Point;
use crate::sheet::PlacedPin;
use crate::spec::Side;

/// Wire and label added for one pin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetStub {
    pub net: String,
    /// Free end of the wire, where the label sits
    pub end: Point,
    pub wire_uuid: String,
    pub label_uuid: String,
}

/// Connects sheet pins to their nets by drawing a horizontal stub away from
/// the sheet edge and labelling its free end
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetWirer {
    pub stub_length: f64,
}

impl NetWirer {
    pub fn new(stub_length: f64) -> Self {
        Self { stub_length }
    }

    /// Add the stub for `pin`, or nothing if the pin has no net
    pub fn wire(&self, doc: &mut SchematicDocument, pin: &PlacedPin) -> Option<NetStub> {
        let net = pin.net.as_deref()?;

        // Labels read away from the sheet
        let (end, justify) = match pin.side {
            Side::Left => (pin.position.offset(-self.stub_length, 0.0), Justify::Right),
            Side::Right => (pin.position.offset(self.stub_length, 0.0), Justify::Left),
        };

        let wire_uuid = doc.add_wire(pin.position, end);
        let label_uuid = doc.add_label(net, end, justify);
        trace!("Wired pin {} to net {net} at ({}, {})", pin.name, end.x, end.y);

        Some(NetStub {
            net: net.to_string(),
            end,
            wire_uuid,
            label_uuid,
        })
    }
}
