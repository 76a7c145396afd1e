//! Placeholder template parser
//!
//! Grammar (field names are case-sensitive, placeholders do not nest):
//!
//! ```text
//! template    := (text | placeholder)*
//! placeholder := "{" field "}"
//!              | "{" field "=" literal "?" branch (":" branch)? "}"
//!              | "{" field "?" branch (":" branch)? "}"
//! ```
//!
//! A backslash escapes the next character anywhere. Inside a branch, a simple
//! `{field}` reference is kept as a field lookup; any other braced text is
//! carried through literally.

use thiserror::Error;

/// Malformed placeholder syntax; offsets are character positions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at offset {0}")]
    Unclosed(usize),
    #[error("unexpected `}}` at offset {0}")]
    UnexpectedClose(usize),
    #[error("placeholder at offset {0} has no field name")]
    EmptyField(usize),
    #[error("placeholder at offset {0} compares a value but has no `?` branch")]
    MissingBranch(usize),
}

/// How a conditional placeholder picks its branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    /// Exact string equality against a literal
    Equals(String),
    Truthy,
}

/// Piece of a conditional branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Field(String),
    Conditional {
        field: String,
        test: Test,
        then: Vec<Piece>,
        otherwise: Vec<Piece>,
    },
}

/// Parsed template, ready to evaluate against submitted values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Parser::new(source).parse_template()
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Character following a backslash; a trailing backslash stays literal
    fn escaped(&mut self) -> char {
        self.next().unwrap_or('\\')
    }

    fn parse_template(mut self) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.next() {
            match c {
                '\\' => text.push(self.escaped()),
                '{' => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    let start = self.pos - 1;
                    segments.push(self.parse_placeholder(start)?);
                }
                '}' => return Err(TemplateError::UnexpectedClose(self.pos - 1)),
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Template { segments })
    }

    fn parse_placeholder(&mut self, start: usize) -> Result<Segment, TemplateError> {
        let mut name = String::new();
        let terminator = loop {
            match self.next() {
                None | Some('{') => return Err(TemplateError::Unclosed(start)),
                Some('\\') => name.push(self.escaped()),
                Some(c @ ('}' | '=' | '?')) => break c,
                Some(c) => name.push(c),
            }
        };

        let field = name.trim().to_string();
        if field.is_empty() {
            return Err(TemplateError::EmptyField(start));
        }

        let test = match terminator {
            '}' => return Ok(Segment::Field(field)),
            '=' => Test::Equals(self.parse_literal(start)?),
            _ => Test::Truthy,
        };

        let (then, closed) = self.parse_branch(start, true)?;
        let otherwise = if closed {
            Vec::new()
        } else {
            self.parse_branch(start, false)?.0
        };

        Ok(Segment::Conditional {
            field,
            test,
            then,
            otherwise,
        })
    }

    /// Comparison literal up to the `?`; colons are ordinary characters here
    fn parse_literal(&mut self, start: usize) -> Result<String, TemplateError> {
        let mut literal = String::new();
        loop {
            match self.next() {
                None | Some('{') => return Err(TemplateError::Unclosed(start)),
                Some('}') => return Err(TemplateError::MissingBranch(start)),
                Some('\\') => literal.push(self.escaped()),
                Some('?') => return Ok(literal),
                Some(c) => literal.push(c),
            }
        }
    }

    /// Branch text up to `}` (or `:` when `stop_at_colon`); returns whether
    /// the placeholder was closed
    fn parse_branch(
        &mut self,
        start: usize,
        stop_at_colon: bool,
    ) -> Result<(Vec<Piece>, bool), TemplateError> {
        let mut pieces = Vec::new();
        let mut text = String::new();

        loop {
            match self.next() {
                None => return Err(TemplateError::Unclosed(start)),
                Some('\\') => text.push(self.escaped()),
                Some('}') => {
                    push_text(&mut pieces, &mut text);
                    return Ok((pieces, true));
                }
                Some(':') if stop_at_colon => {
                    push_text(&mut pieces, &mut text);
                    return Ok((pieces, false));
                }
                Some('{') => {
                    let inner = self.read_nested(start)?;
                    if is_field_name(&inner) {
                        push_text(&mut pieces, &mut text);
                        pieces.push(Piece::Field(inner));
                    } else {
                        text.push('{');
                        text.push_str(&inner);
                        text.push('}');
                    }
                }
                Some(c) => text.push(c),
            }
        }
    }

    /// Raw text of a braced group inside a branch, balancing inner braces
    fn read_nested(&mut self, start: usize) -> Result<String, TemplateError> {
        let mut depth = 1;
        let mut inner = String::new();
        loop {
            let c = self.next().ok_or(TemplateError::Unclosed(start))?;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            inner.push(c);
        }
    }
}

fn push_text(pieces: &mut Vec<Piece>, text: &mut String) {
    if !text.is_empty() {
        pieces.push(Piece::Text(std::mem::take(text)));
    }
}

fn is_field_name(s: &str) -> bool {
    !s.is_empty()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '=' | '?' | ':' | '\\'))
}
