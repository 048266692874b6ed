use std::fs;

use anyhow::Result;
use sheetflow_schematic::{
    generate, load_sheet_specs, ConfigError, PinKind, Point, ProjectConfig, Side, Size,
};
use tempfile::TempDir;

const PROJECT: &str = r#"
[layout]
origin = [33.0, 20.0]
max_row_width = 200.0
page_start = 10
pin_margin = 2.0
min_pin_delta = 1.0
net_stub_length = 5.0
horizontal_gap = { fixed = 25.0 }
vertical_gap = { proportional = { factor = 0.8, minimum = 6.0 } }

[[sheet]]
name = "TempSensor"
file = "subsystems/capt_temp.kicad_sch"
size = [30.0, 20.0]
properties = { Comment = "Temperature Sensor" }
pins = [
  { name = "SDA", kind = "bidirectional", net = "SDA" },
  { name = "SCL", kind = "bidirectional", net = "SCL", side = "left" },
  { name = "ALERT", kind = "output", offset = 15.0 },
]

[[sheet]]
name = "Power"
file = "subsystems/power.kicad_sch"
size = [25.0, 15.0]
"#;

#[test]
fn test_project_from_str() -> Result<()> {
    let project = ProjectConfig::from_toml_str(PROJECT)?;

    assert_eq!(project.layout.origin, Point::new(33.0, 20.0));
    assert_eq!(project.layout.page_start, 10);
    assert_eq!(project.layout.horizontal_gap.gap(500.0), 25.0);
    assert_eq!(project.sheets.len(), 2);

    let sensor = &project.sheets[0];
    assert_eq!(sensor.name(), "TempSensor");
    assert_eq!(sensor.size(), Size::new(30.0, 20.0));
    assert_eq!(
        sensor.properties().get("Comment").map(String::as_str),
        Some("Temperature Sensor")
    );

    let pins = sensor.pins();
    assert_eq!(pins[0].kind(), PinKind::Bidirectional);
    assert_eq!(pins[0].side(), Side::Right);
    assert_eq!(pins[1].side(), Side::Left);
    assert_eq!(pins[1].net(), Some("SCL"));
    assert_eq!(pins[2].offset(), Some(15.0));
    assert_eq!(pins[2].net(), None);
    Ok(())
}

#[test]
fn test_project_from_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sheets.toml");
    fs::write(&path, PROJECT)?;

    let mut project = ProjectConfig::from_path(&path)?;
    let (text, records) = generate(
        "(kicad_sch (version 20231120) (sheet_instances))",
        &mut project.sheets,
        &project.layout,
    )?;

    assert_eq!(records[0].position, Point::new(33.0, 20.0));
    assert_eq!(records[1].position, Point::new(88.0, 20.0));
    assert_eq!(records[1].page, 11);
    assert!(text.contains("(property \"Comment\" \"Temperature Sensor\""));
    assert!(text.contains("(label \"SCL\""));
    Ok(())
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = ProjectConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read(..)));
}

#[test]
fn test_sheet_specs_only() -> Result<()> {
    let specs = load_sheet_specs(PROJECT)?;
    let names: Vec<&str> = specs.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["TempSensor", "Power"]);
    Ok(())
}

#[test]
fn test_placement_records_serialize() -> Result<()> {
    let mut project = ProjectConfig::from_toml_str(PROJECT)?;
    let (_, records) = generate("(kicad_sch)", &mut project.sheets, &project.layout)?;

    let json = serde_json::to_value(&records)?;
    assert_eq!(json[0]["name"], "TempSensor");
    assert_eq!(json[0]["position"], serde_json::json!([33.0, 20.0]));
    assert_eq!(json[1]["page"], 11);
    Ok(())
}

#[test]
fn test_invalid_pin_kind() {
    let err = load_sheet_specs(
        r#"
        [[sheet]]
        name = "A"
        file = "a.kicad_sch"
        size = [10.0, 10.0]
        pins = [{ name = "X", kind = "analog" }]
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}
