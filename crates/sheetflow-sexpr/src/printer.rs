use crate::{Atom, Sexpr};

const INDENT: &str = "\t";

/// Format an S-expression in KiCad's layout.
///
/// Lists holding only atoms go on one line. Otherwise each nested list starts
/// a new line indented one tab deeper than its parent; atoms before a nested
/// list stay on the line they follow, atoms after the last nested list share
/// its line, and the closing bracket gets a line of its own.
pub fn format_sexpr(sexpr: &Sexpr, indent_level: usize) -> String {
    let mut out = String::new();
    write_node(&mut out, sexpr, indent_level);
    out
}

/// Format the members of a list as if they were wrapped in `( ... )`
pub fn format_list(items: &[Sexpr], indent_level: usize) -> String {
    let mut out = String::new();
    write_list(&mut out, items, indent_level);
    out
}

/// Format a whole document, terminated by a newline like files saved by KiCad
pub fn format_document(sexpr: &Sexpr) -> String {
    let mut out = format_sexpr(sexpr, 0);
    out.push('\n');
    out
}

fn write_node(out: &mut String, sexpr: &Sexpr, indent_level: usize) {
    match sexpr {
        Sexpr::Atom(atom) => write_atom(out, atom),
        Sexpr::List(items) => write_list(out, items, indent_level),
    }
}

fn write_list(out: &mut String, items: &[Sexpr], indent_level: usize) {
    if items.iter().all(Sexpr::is_atom) {
        out.push('(');
        write_atoms(out, items.iter().filter_map(Sexpr::as_atom));
        out.push(')');
        return;
    }

    out.push('(');
    let mut pending: Vec<&Atom> = Vec::new();
    let mut after_open = true;

    for item in items {
        match item {
            Sexpr::Atom(atom) => pending.push(atom),
            Sexpr::List(_) => {
                if !pending.is_empty() {
                    if !after_open {
                        out.push(' ');
                    }
                    write_atoms(out, pending.drain(..));
                }
                out.push('\n');
                push_indent(out, indent_level + 1);
                write_node(out, item, indent_level + 1);
                after_open = false;
            }
        }
    }

    if !pending.is_empty() {
        out.push(' ');
        write_atoms(out, pending.drain(..));
    }

    out.push('\n');
    push_indent(out, indent_level);
    out.push(')');
}

fn write_atoms<'a>(out: &mut String, atoms: impl Iterator<Item = &'a Atom>) {
    for (i, atom) in atoms.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_atom(out, atom);
    }
}

fn write_atom(out: &mut String, atom: &Atom) {
    match atom {
        Atom::Symbol(s) | Atom::Number(s) => out.push_str(s),
        Atom::String(s) => {
            out.push('"');
            out.push_str(&escape_string(strip_quotes(s)));
            out.push('"');
        }
    }
}

fn push_indent(out: &mut String, indent_level: usize) {
    for _ in 0..indent_level {
        out.push_str(INDENT);
    }
}

/// Values built by hand sometimes arrive already wrapped in quotes; drop one
/// layer so they are not quoted twice.
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }
    result
}
