//! In-place editing of a KiCad schematic tree.
//!
//! The root list of a `.kicad_sch` file is `(kicad_sch ...)`. Its last member
//! is treated as a trailer (`sheet_instances` in KiCad 8, `embedded_fonts` in
//! KiCad 9) and new content is always inserted before it.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::Serialize;
use sheetflow_sexpr::{format_list, parse, Sexpr};
use uuid::Uuid;

use crate::error::SchematicError;
use crate::geometry::{Point, Size};
use crate::spec::{SHEET_FILE_PROPERTY, SHEET_NAME_PROPERTY};

pub const FILE_VERSION: &str = "20231120";
pub const GENERATOR: &str = "sheetflow";

/// Top-level entries that may precede the root uuid
const HEADER_TAGS: &[&str] = &["version", "generator", "generator_version"];

/// Horizontal text justification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Right,
}

impl Justify {
    pub fn as_str(&self) -> &'static str {
        match self {
            Justify::Left => "left",
            Justify::Right => "right",
        }
    }
}

/// A sheet block found in an existing document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub uuid: String,
    pub name: Option<String>,
    pub file: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub pins: Vec<String>,
}

/// A schematic document held as the members of its root list
#[derive(Debug, Clone, PartialEq)]
pub struct SchematicDocument {
    items: Vec<Sexpr>,
}

impl SchematicDocument {
    /// An empty schematic with a fresh root uuid and a root sheet instance
    pub fn new() -> Self {
        let items = vec![
            Sexpr::symbol("kicad_sch"),
            Sexpr::tagged("version", [Sexpr::number_literal(FILE_VERSION)]),
            Sexpr::tagged("generator", [Sexpr::string(GENERATOR)]),
            Sexpr::tagged("uuid", [Sexpr::string(Uuid::new_v4().to_string())]),
            Sexpr::tagged("paper", [Sexpr::string("A4")]),
            Sexpr::tagged(
                "title_block",
                [Sexpr::tagged(
                    "date",
                    [Sexpr::string(
                        chrono::Local::now().format("%Y-%m-%d").to_string(),
                    )],
                )],
            ),
            Sexpr::tagged("lib_symbols", []),
            Sexpr::tagged("sheet_instances", [root_instance()]),
        ];
        Self { items }
    }

    /// Wrap an already parsed tree; the root must be a list
    pub fn from_sexpr(root: Sexpr) -> Result<Self, SchematicError> {
        match root {
            Sexpr::List(items) => Ok(Self { items }),
            Sexpr::Atom(_) => Err(SchematicError::NotAList),
        }
    }

    pub fn items(&self) -> &[Sexpr] {
        &self.items
    }

    pub fn into_sexpr(self) -> Sexpr {
        Sexpr::List(self.items)
    }

    /// Render in KiCad's layout, newline terminated
    pub fn to_kicad_string(&self) -> String {
        let mut out = format_list(&self.items, 0);
        out.push('\n');
        out
    }

    /// The root uuid, created right after the header if missing
    pub fn ensure_root_uuid(&mut self) -> String {
        if let Some(uuid) = self
            .items
            .iter()
            .find(|item| item.is_tagged("uuid"))
            .and_then(|item| item.as_list()?.get(1)?.as_str())
        {
            return uuid.to_string();
        }

        let uuid = Uuid::new_v4().to_string();
        let index = self.header_end();
        debug!("Adding root uuid {uuid} at index {index}");
        self.items
            .insert(index, Sexpr::tagged("uuid", [Sexpr::string(uuid.clone())]));
        uuid
    }

    /// The top-level `(tag ...)` section, appended empty if missing
    pub fn ensure_section(&mut self, tag: &str) -> &mut Sexpr {
        let index = match self.items.iter().position(|item| item.is_tagged(tag)) {
            Some(index) => index,
            None => {
                debug!("Adding missing ({tag}) section");
                self.items.push(Sexpr::tagged(tag, []));
                self.items.len() - 1
            }
        };
        &mut self.items[index]
    }

    /// Insert a top-level element so the trailer stays last.
    ///
    /// Never inserts ahead of the root tag, even in a document that has
    /// nothing but the tag.
    pub fn insert_before_trailer(&mut self, element: Sexpr) {
        let floor = self.items.iter().take_while(|item| item.is_atom()).count();
        let index = self.items.len().saturating_sub(1).max(floor);
        self.items.insert(index, element);
    }

    /// Record the page of a sheet under `sheet_instances`, adding the root
    /// entry first if the section has none
    pub fn add_sheet_instance(&mut self, sheet_uuid: &str, page: u32) {
        let section = self.ensure_section("sheet_instances");
        let has_root = section
            .children_tagged("path")
            .any(|entry| entry.as_list().and_then(|l| l.get(1)?.as_str()) == Some("/"));
        if !has_root {
            section.push(root_instance());
        }
        section.push(instance_entry(&format!("/{sheet_uuid}"), &page.to_string()));
    }

    /// Add a single-segment wire and return its uuid
    pub fn add_wire(&mut self, start: Point, end: Point) -> String {
        let uuid = Uuid::new_v4().to_string();
        self.insert_before_trailer(Sexpr::tagged(
            "wire",
            [
                Sexpr::tagged("pts", [xy(start), xy(end)]),
                Sexpr::tagged(
                    "stroke",
                    [
                        Sexpr::tagged("width", [Sexpr::number(0.0)]),
                        Sexpr::tagged("type", [Sexpr::symbol("default")]),
                    ],
                ),
                Sexpr::tagged("uuid", [Sexpr::string(uuid.clone())]),
            ],
        ));
        uuid
    }

    /// Add a local net label and return its uuid
    pub fn add_label(&mut self, text: &str, at: Point, justify: Justify) -> String {
        let uuid = Uuid::new_v4().to_string();
        self.insert_before_trailer(Sexpr::tagged(
            "label",
            [
                Sexpr::string(text),
                at_angle(at, 0.0),
                effects([Sexpr::tagged("justify", [Sexpr::symbol(justify.as_str())])]),
                Sexpr::tagged("uuid", [Sexpr::string(uuid.clone())]),
            ],
        ));
        uuid
    }

    /// All sheet blocks, in document order
    pub fn sheets(&self) -> Vec<SheetSummary> {
        self.items
            .iter()
            .filter(|item| item.is_tagged("sheet"))
            .map(summarize_sheet)
            .collect()
    }

    /// Remove a sheet block and its page entry. Wires and labels attached to
    /// its pins are left in place.
    pub fn remove_sheet(&mut self, uuid: &str) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !(item.is_tagged("sheet") && item.field("uuid") == Some(uuid)));
        let removed = self.items.len() != before;

        let path = format!("/{uuid}");
        if let Some(Sexpr::List(section)) = self
            .items
            .iter_mut()
            .find(|item| item.is_tagged("sheet_instances"))
        {
            section.retain(|entry| {
                !(entry.is_tagged("path")
                    && entry.as_list().and_then(|l| l.get(1)?.as_str()) == Some(path.as_str()))
            });
        }

        if removed {
            debug!("Removed sheet {uuid}");
        }
        removed
    }

    /// Index just past the root tag and the version/generator entries
    fn header_end(&self) -> usize {
        let tags = self.items.iter().take_while(|item| item.is_atom()).count();
        let header = self.items[tags..]
            .iter()
            .take_while(|item| HEADER_TAGS.iter().any(|tag| item.is_tagged(tag)))
            .count();
        tags + header
    }
}

impl Default for SchematicDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for SchematicDocument {
    type Err = SchematicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_sexpr(parse(s)?)
    }
}

impl fmt::Display for SchematicDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_kicad_string())
    }
}

fn root_instance() -> Sexpr {
    instance_entry("/", "1")
}

fn instance_entry(path: &str, page: &str) -> Sexpr {
    Sexpr::tagged(
        "path",
        [
            Sexpr::string(path),
            Sexpr::tagged("page", [Sexpr::string(page)]),
        ],
    )
}

pub(crate) fn xy(point: Point) -> Sexpr {
    Sexpr::tagged("xy", [Sexpr::number(point.x), Sexpr::number(point.y)])
}

pub(crate) fn at_angle(point: Point, angle: f64) -> Sexpr {
    Sexpr::tagged(
        "at",
        [
            Sexpr::number(point.x),
            Sexpr::number(point.y),
            Sexpr::number(angle),
        ],
    )
}

/// `(effects (font (size 1.27 1.27)) extra...)`
pub(crate) fn effects(extra: impl IntoIterator<Item = Sexpr>) -> Sexpr {
    let font = Sexpr::tagged(
        "font",
        [Sexpr::tagged(
            "size",
            [Sexpr::number(1.27), Sexpr::number(1.27)],
        )],
    );
    Sexpr::tagged("effects", std::iter::once(font).chain(extra))
}

fn summarize_sheet(sheet: &Sexpr) -> SheetSummary {
    let pair = |tag: &str| {
        let list = sheet.find(tag)?.as_list()?;
        Some((list.get(1)?.as_f64()?, list.get(2)?.as_f64()?))
    };
    let property = |names: &[&str]| {
        sheet.children_tagged("property").find_map(|prop| {
            let list = prop.as_list()?;
            let key = list.get(1)?.as_str()?;
            names
                .contains(&key)
                .then(|| list.get(2)?.as_str().map(str::to_string))
                .flatten()
        })
    };

    SheetSummary {
        uuid: sheet.field("uuid").unwrap_or_default().to_string(),
        name: property(&[SHEET_NAME_PROPERTY, "Sheetname"]),
        file: property(&[SHEET_FILE_PROPERTY, "Sheetfile"]),
        position: pair("at").map(Point::from),
        size: pair("size").map(Size::from),
        pins: sheet
            .children_tagged("pin")
            .filter_map(|pin| pin.as_list()?.get(1)?.as_str().map(str::to_string))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(doc: &SchematicDocument) -> Vec<String> {
        doc.items()
            .iter()
            .map(|item| item.tag().unwrap_or("<atom>").to_string())
            .collect()
    }

    #[test]
    fn test_new_document_layout() {
        let doc = SchematicDocument::new();
        assert_eq!(
            tags(&doc),
            vec![
                "<atom>",
                "version",
                "generator",
                "uuid",
                "paper",
                "title_block",
                "lib_symbols",
                "sheet_instances"
            ]
        );
        let text = doc.to_kicad_string();
        assert!(text.starts_with("(kicad_sch\n\t(version 20231120)\n\t(generator \"sheetflow\")\n"));
        assert!(text.ends_with("\t(sheet_instances\n\t\t(path \"/\"\n\t\t\t(page \"1\")\n\t\t)\n\t)\n)\n"));
    }

    #[test]
    fn test_root_uuid_inserted_after_header() {
        let mut doc: SchematicDocument =
            "(kicad_sch (version 20231120) (generator \"eeschema\") (paper \"A4\"))"
                .parse()
                .unwrap();
        let uuid = doc.ensure_root_uuid();
        assert_eq!(
            tags(&doc),
            vec!["<atom>", "version", "generator", "uuid", "paper"]
        );
        assert_eq!(doc.items()[3].as_list().unwrap()[1].as_str(), Some(uuid.as_str()));

        // A second call keeps the existing identifier
        assert_eq!(doc.ensure_root_uuid(), uuid);
        assert_eq!(doc.items().iter().filter(|i| i.is_tagged("uuid")).count(), 1);
    }

    #[test]
    fn test_existing_root_uuid_is_reused() {
        let mut doc: SchematicDocument = "(kicad_sch (uuid \"abc\") (paper \"A4\"))".parse().unwrap();
        assert_eq!(doc.ensure_root_uuid(), "abc");
        assert_eq!(doc.items().len(), 3);
    }

    #[test]
    fn test_ensure_section_appends_once() {
        let mut doc: SchematicDocument = "(kicad_sch (version 1) (paper \"A4\"))".parse().unwrap();
        doc.ensure_section("sheet_instances").push(Sexpr::symbol("x"));
        doc.ensure_section("sheet_instances");
        assert_eq!(tags(&doc), vec!["<atom>", "version", "paper", "sheet_instances"]);
        assert_eq!(doc.items()[3], Sexpr::tagged("sheet_instances", [Sexpr::symbol("x")]));
    }

    #[test]
    fn test_insert_before_trailer() {
        let mut doc: SchematicDocument = "(kicad_sch (a) (trailer))".parse().unwrap();
        doc.insert_before_trailer(Sexpr::tagged("b", []));
        assert_eq!(tags(&doc), vec!["<atom>", "a", "b", "trailer"]);

        let mut bare: SchematicDocument = "(kicad_sch)".parse().unwrap();
        bare.insert_before_trailer(Sexpr::tagged("b", []));
        assert_eq!(tags(&bare), vec!["<atom>", "b"]);
    }

    #[test]
    fn test_sheet_instances_root_entry_added_once() {
        let mut doc: SchematicDocument = "(kicad_sch (version 1))".parse().unwrap();
        doc.add_sheet_instance("aaa", 2);
        doc.add_sheet_instance("bbb", 3);

        let text = doc.ensure_section("sheet_instances").to_string();
        assert_eq!(
            text,
            "(sheet_instances\n\
             \t(path \"/\"\n\t\t(page \"1\")\n\t)\n\
             \t(path \"/aaa\"\n\t\t(page \"2\")\n\t)\n\
             \t(path \"/bbb\"\n\t\t(page \"3\")\n\t)\n\
             )"
        );
    }

    #[test]
    fn test_add_wire_and_label() {
        let mut doc = SchematicDocument::new();
        let wire = doc.add_wire(Point::new(10.0, 20.0), Point::new(5.0, 20.0));
        let label = doc.add_label("SCL", Point::new(5.0, 20.0), Justify::Right);
        assert_ne!(wire, label);

        let text = doc.to_kicad_string();
        assert!(text.contains("\t(wire\n\t\t(pts\n\t\t\t(xy 10 20)\n\t\t\t(xy 5 20)\n\t\t)\n"));
        assert!(text.contains("\t(label \"SCL\"\n\t\t(at 5 20 0)\n"));
        assert!(text.contains("\t\t\t(justify right)\n"));
        assert_eq!(doc.items().last().and_then(Sexpr::tag), Some("sheet_instances"));
    }

    #[test]
    fn test_not_a_list() {
        assert!(matches!(
            SchematicDocument::from_sexpr(Sexpr::symbol("kicad_sch")),
            Err(SchematicError::NotAList)
        ));
        assert!(matches!(
            "(kicad_sch".parse::<SchematicDocument>(),
            Err(SchematicError::Parse(_))
        ));
    }
}
