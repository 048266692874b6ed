use crate::{Atom, Sexpr};

/// Errors that can occur during parsing. Offsets are byte positions in the
/// input text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Expected '(' at offset {0}")]
    ExpectedList(usize),
    #[error("Offset {0} is not an opening bracket")]
    NotAnOpeningBracket(usize),
    #[error("Unmatched '(' at offset {0}")]
    UnmatchedBracket(usize),
    #[error("Unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("Unexpected input after expression at offset {0}")]
    TrailingInput(usize),
}

/// Find the `)` matching the `(` at byte offset `open`.
///
/// Nesting depth goes up on `(` and down on `)`; the match is the first `)`
/// seen at depth zero. Brackets inside quoted strings do not count.
pub fn find_closing_bracket(input: &str, open: usize) -> Result<usize, ParseError> {
    let bytes = input.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return Err(ParseError::NotAnOpeningBracket(open));
    }

    let mut depth = 0usize;
    let mut string_start = None;
    let mut escaped = false;

    for (index, &byte) in bytes.iter().enumerate().skip(open + 1) {
        if string_start.is_some() {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                string_start = None;
            }
            continue;
        }

        match byte {
            b'"' => string_start = Some(index),
            b'(' => depth += 1,
            b')' if depth == 0 => return Ok(index),
            b')' => depth -= 1,
            _ => {}
        }
    }

    match string_start {
        Some(start) => Err(ParseError::UnterminatedString(start)),
        None => Err(ParseError::UnmatchedBracket(open)),
    }
}

/// Bracket-matching reader over one input text
pub struct Reader<'a> {
    input: &'a str,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Reader { input }
    }

    /// Read exactly one expression; anything but whitespace around it is an
    /// error.
    pub fn read(&self) -> Result<Sexpr, ParseError> {
        let start = self
            .skip_whitespace(0)
            .ok_or(ParseError::EmptyInput)?;
        let (expr, close) = self.read_list(start)?;

        if let Some(rest) = self.skip_whitespace(close + 1) {
            return Err(ParseError::TrailingInput(rest));
        }
        Ok(expr)
    }

    /// Read a sequence of top-level expressions
    pub fn read_all(&self) -> Result<Vec<Sexpr>, ParseError> {
        let mut results = Vec::new();
        let mut cursor = 0;

        while let Some(start) = self.skip_whitespace(cursor) {
            let (expr, close) = self.read_list(start)?;
            results.push(expr);
            cursor = close + 1;
        }

        Ok(results)
    }

    /// Parse the list opening at `open`, returning it with the offset of its
    /// closing bracket.
    fn read_list(&self, open: usize) -> Result<(Sexpr, usize), ParseError> {
        if !self.input[open..].starts_with('(') {
            return Err(ParseError::ExpectedList(open));
        }
        let close = find_closing_bracket(self.input, open)?;

        let mut items = Vec::new();
        let mut cursor = open + 1;

        // Direct children only: each child's own contents are handled by the
        // recursive call.
        loop {
            let child = self.next_child(cursor, close);
            self.read_atoms(cursor, child.unwrap_or(close), &mut items)?;

            match child {
                Some(child_open) => {
                    let (node, child_close) = self.read_list(child_open)?;
                    items.push(node);
                    cursor = child_close + 1;
                }
                None => break,
            }
        }

        if items.len() >= 1000 {
            log::trace!("Parsed {} items in list at offset {open}", items.len());
        }

        Ok((Sexpr::List(items), close))
    }

    /// Offset of the next `(` in `[from, to)` that is not inside a string
    fn next_child(&self, from: usize, to: usize) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut in_string = false;
        let mut escaped = false;

        for (index, &byte) in bytes.iter().enumerate().take(to).skip(from) {
            if in_string {
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    in_string = false;
                }
            } else if byte == b'"' {
                in_string = true;
            } else if byte == b'(' {
                return Some(index);
            }
        }
        None
    }

    /// Split `[from, to)` on whitespace into atoms
    fn read_atoms(&self, from: usize, to: usize, items: &mut Vec<Sexpr>) -> Result<(), ParseError> {
        let text = &self.input[from..to];
        let mut chars = text.char_indices().peekable();

        while let Some(&(offset, ch)) = chars.peek() {
            if ch.is_whitespace() {
                chars.next();
                continue;
            }

            if ch == '"' {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    match ch {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 'r')) => value.push('\r'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, other)) => value.push(other),
                            None => break,
                        },
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(ParseError::UnterminatedString(from + offset));
                }
                items.push(Sexpr::Atom(Atom::String(value)));
                continue;
            }

            let start = offset;
            let mut end = text.len();
            while let Some(&(index, ch)) = chars.peek() {
                if ch.is_whitespace() {
                    end = index;
                    break;
                }
                chars.next();
            }
            items.push(Sexpr::Atom(classify(&text[start..end])));
        }

        Ok(())
    }

    /// Offset of the first non-whitespace byte at or after `from`
    fn skip_whitespace(&self, from: usize) -> Option<usize> {
        self.input
            .get(from..)?
            .char_indices()
            .find(|(_, ch)| !ch.is_whitespace())
            .map(|(offset, _)| from + offset)
    }
}

fn classify(token: &str) -> Atom {
    if is_number(token) {
        Atom::Number(token.to_string())
    } else {
        Atom::Symbol(token.to_string())
    }
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with at least one digit in the
/// mantissa
fn is_number(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Parse a string holding exactly one expression
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("Parsing S-expression from {} bytes of input", input.len());
    let result = Reader::new(input).read();
    match &result {
        Ok(_) => log::trace!("Successfully parsed S-expression"),
        Err(e) => log::trace!("Failed to parse S-expression: {e}"),
    }
    result
}

/// Parse a string into multiple top-level S-expressions
pub fn parse_all(input: &str) -> Result<Vec<Sexpr>, ParseError> {
    log::trace!(
        "Parsing multiple S-expressions from {} bytes of input",
        input.len()
    );
    let result = Reader::new(input).read_all();
    match &result {
        Ok(exprs) => log::trace!("Successfully parsed {} S-expressions", exprs.len()),
        Err(e) => log::trace!("Failed to parse S-expressions: {e}"),
    }
    result
}
