//! Row-flow placement of a batch of sheets.
//!
//! Sheets are laid out left to right from the origin. A sheet that would end
//! past the row's width limit starts a new row below the tallest sheet of the
//! current one, unless it is the first sheet of its row.

use log::debug;
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::document::SchematicDocument;
use crate::geometry::{Point, Size};
use crate::spec::SheetSpec;

/// Where one sheet ended up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementRecord {
    pub name: String,
    pub uuid: String,
    pub position: Point,
    pub size: Size,
    pub page: u32,
    pub crowded_pins: Vec<String>,
}

/// Place every sheet into `doc`, in order, and record each position on its
/// spec. Returns one record per sheet.
pub fn place_sheets(
    doc: &mut SchematicDocument,
    sheets: &mut [SheetSpec],
    config: &LayoutConfig,
) -> Vec<PlacementRecord> {
    let options = config.sheet_options();
    let row_left_edge = config.origin.x;
    let row_limit = row_left_edge + config.max_row_width;

    let mut cursor = config.origin;
    let mut row_height: f64 = 0.0;
    let mut page = config.page_start;
    let mut records = Vec::with_capacity(sheets.len());

    for spec in sheets.iter_mut() {
        let size = spec.size();
        if cursor.x > row_left_edge && cursor.x + size.width > row_limit {
            cursor = Point::new(
                row_left_edge,
                cursor.y + row_height + config.vertical_gap.gap(row_height),
            );
            row_height = 0.0;
            debug!("Row full, wrapping {} to y = {}", spec.name(), cursor.y);
        }

        let placed = doc.add_hierarchical_sheet(spec, cursor, page, &options);
        spec.set_position(cursor);
        debug!(
            "Placed {} at ({}, {}) on page {page}",
            spec.name(),
            cursor.x,
            cursor.y
        );

        records.push(PlacementRecord {
            name: spec.name().to_string(),
            uuid: placed.uuid,
            position: cursor,
            size,
            page,
            crowded_pins: placed.crowded_pins,
        });

        cursor.x += size.width + config.horizontal_gap.gap(size.width);
        row_height = row_height.max(size.height);
        page = page.saturating_add(1);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GapRule;

    fn sheet(name: &str, width: f64, height: f64) -> SheetSpec {
        SheetSpec::new(name, format!("{name}.kicad_sch"), Size::new(width, height)).unwrap()
    }

    #[test]
    fn test_row_wrap() {
        let config = LayoutConfig {
            origin: Point::new(0.0, 0.0),
            max_row_width: 50.0,
            horizontal_gap: GapRule::Fixed(25.0),
            vertical_gap: GapRule::Fixed(10.0),
            ..LayoutConfig::default()
        };
        let mut sheets = vec![sheet("A", 30.0, 20.0), sheet("B", 30.0, 15.0)];
        let mut doc = SchematicDocument::new();
        let records = place_sheets(&mut doc, &mut sheets, &config);

        assert_eq!(records[0].position, Point::new(0.0, 0.0));
        assert_eq!(records[1].position, Point::new(0.0, 30.0));
        assert_eq!(sheets[1].position(), Some(Point::new(0.0, 30.0)));
    }

    #[test]
    fn test_wide_sheet_never_wraps_at_row_start() {
        let config = LayoutConfig {
            origin: Point::new(10.0, 10.0),
            max_row_width: 20.0,
            ..LayoutConfig::default()
        };
        let mut sheets = vec![sheet("Wide", 100.0, 20.0)];
        let mut doc = SchematicDocument::new();
        let records = place_sheets(&mut doc, &mut sheets, &config);
        assert_eq!(records[0].position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_proportional_gaps() {
        let mut sheets = vec![
            sheet("A", 30.0, 20.0),
            sheet("B", 40.0, 25.0),
            sheet("C", 100.0, 10.0),
        ];
        let mut doc = SchematicDocument::new();
        let records = place_sheets(&mut doc, &mut sheets, &LayoutConfig::default());

        // 30 wide plus a gap of half its width
        assert_eq!(records[1].position, Point::new(95.0, 50.0));
        // 95 + 40 + 20 = 155, and 155 + 100 is past 50 + 180
        assert_eq!(records[2].position, Point::new(50.0, 50.0 + 25.0 + 20.0));
        let pages: Vec<u32> = records.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![2, 3, 4]);
    }

    #[test]
    fn test_page_counter_saturates() {
        let config = LayoutConfig {
            page_start: u32::MAX - 1,
            ..LayoutConfig::default()
        };
        let mut sheets = vec![
            sheet("A", 10.0, 10.0),
            sheet("B", 10.0, 10.0),
            sheet("C", 10.0, 10.0),
        ];
        let mut doc = SchematicDocument::new();
        let records = place_sheets(&mut doc, &mut sheets, &config);

        let pages: Vec<u32> = records.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![u32::MAX - 1, u32::MAX, u32::MAX]);
    }
}
