//! S-expression tree, reader and printer for KiCad schematic files.
//!
//! The reader locates each sub-expression by bracket matching and the printer
//! reproduces the layout KiCad itself writes (tab indentation, atom-only lists
//! on one line), so a file that went through [`parse`] and [`format_sexpr`]
//! diffs cleanly against one saved by the editor.

mod printer;
mod reader;

use std::fmt;

pub use printer::{format_document, format_list, format_sexpr};
pub use reader::{find_closing_bracket, parse, parse_all, ParseError, Reader};

/// A leaf value of the tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Atom {
    /// Unquoted identifier such as `sheet` or `yes`
    Symbol(String),
    /// Quoted text, stored without the surrounding quotes or escapes
    String(String),
    /// Numeric literal, stored as written so it prints back unchanged
    Number(String),
}

impl Atom {
    /// The raw text of the atom (unescaped for strings)
    pub fn text(&self) -> &str {
        match self {
            Atom::Symbol(s) | Atom::String(s) | Atom::Number(s) => s,
        }
    }

    /// Numeric value of a number atom
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Atom::Number(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// An S-expression value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sexpr {
    Atom(Atom),
    List(Vec<Sexpr>),
}

impl Sexpr {
    /// Create a symbol (unquoted atom)
    pub fn symbol(s: impl Into<String>) -> Self {
        Sexpr::Atom(Atom::Symbol(s.into()))
    }

    /// Create a string (quoted atom)
    pub fn string(s: impl Into<String>) -> Self {
        Sexpr::Atom(Atom::String(s.into()))
    }

    /// Create a number atom from a coordinate or dimension.
    ///
    /// Values are rounded to four decimals and printed without trailing
    /// zeros, so `50.0` becomes `50` and `4.666666` becomes `4.6667`.
    pub fn number(value: f64) -> Self {
        Sexpr::Atom(Atom::Number(format_number(value)))
    }

    /// Create a number atom from already formatted text
    pub fn number_literal(s: impl Into<String>) -> Self {
        Sexpr::Atom(Atom::Number(s.into()))
    }

    /// Create a list from a vector of S-expressions
    pub fn list(items: Vec<Sexpr>) -> Self {
        Sexpr::List(items)
    }

    /// Build a `(tag items...)` list
    pub fn tagged(tag: &str, items: impl IntoIterator<Item = Sexpr>) -> Self {
        let mut list = vec![Sexpr::symbol(tag)];
        list.extend(items);
        Sexpr::List(list)
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Sexpr::Atom(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Sexpr::List(_))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Sexpr::Atom(atom) => Some(atom),
            Sexpr::List(_) => None,
        }
    }

    /// Text of an atom of any kind
    pub fn as_str(&self) -> Option<&str> {
        self.as_atom().map(Atom::text)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_atom().and_then(Atom::as_f64)
    }

    /// Get the list items if this is a list
    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            Sexpr::Atom(_) => None,
        }
    }

    /// Get mutable access to list items if this is a list
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Sexpr>> {
        match self {
            Sexpr::List(items) => Some(items),
            Sexpr::Atom(_) => None,
        }
    }

    /// Append a child. An atom is first turned into a one-item list headed
    /// by itself, so `sheet_instances` becomes `(sheet_instances item)`.
    pub fn push(&mut self, item: Sexpr) {
        match self {
            Sexpr::List(items) => items.push(item),
            Sexpr::Atom(_) => {
                let head = std::mem::replace(self, Sexpr::List(Vec::new()));
                *self = Sexpr::List(vec![head, item]);
            }
        }
    }

    /// The leading symbol of a list, e.g. `sheet` for `(sheet ...)`
    pub fn tag(&self) -> Option<&str> {
        match self.as_list()?.first()? {
            Sexpr::Atom(Atom::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_tagged(&self, tag: &str) -> bool {
        self.tag() == Some(tag)
    }

    /// First direct child list with the given tag
    pub fn find(&self, tag: &str) -> Option<&Sexpr> {
        self.as_list()?.iter().find(|item| item.is_tagged(tag))
    }

    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Sexpr> {
        self.as_list_mut()?
            .iter_mut()
            .find(|item| item.is_tagged(tag))
    }

    /// All direct child lists with the given tag, in document order
    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Sexpr> + 'a {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter(move |item| item.is_tagged(tag))
    }

    /// The atom following the tag of a child list, e.g. `"abc"` for
    /// `(uuid "abc")` when asked for `uuid`
    pub fn field(&self, tag: &str) -> Option<&str> {
        self.find(tag)?.as_list()?.get(1)?.as_str()
    }
}

impl From<Atom> for Sexpr {
    fn from(atom: Atom) -> Self {
        Sexpr::Atom(atom)
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_sexpr(self, 0))
    }
}

/// Render a coordinate the way KiCad writes it
pub fn format_number(value: f64) -> String {
    let mut text = format!("{value:.4}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}
