//! Record formatting.
//!
//! A destination owns a [`FormatTemplate`] parsed once at attach time. A log
//! call builds one [`Record`] and every destination renders it through its
//! own template. The terminal additionally indents substeps and wraps the
//! whole line in the level's colour.
//!
//! Template syntax: `{timestamp}`, `{level}`, `{step}`, `{message}`, or any
//! other `{name}` resolved from the record's extra fields. `{field:N}` pads
//! the value to width `N`, left aligned. `{{` and `}}` are literal braces.

use crate::error::{LoggerError, Result};
use crate::level::LevelRegistry;
use chrono::{DateTime, Local};
use colored::Color;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Timestamp layout used by `{timestamp}`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Indentation applied to substep lines on the terminal.
pub const SUBSTEP_INDENT: &str = "   ";

const ANSI_RESET: &str = "\x1b[0m";

/// One log event, rendered identically for every destination.
#[derive(Clone, Debug)]
pub struct Record {
    pub timestamp: DateTime<Local>,
    pub rank: u8,
    pub level: &'static str,
    pub step: String,
    pub message: String,
    pub extra: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Field {
    Timestamp,
    Level,
    Step,
    Message,
    Extra(String),
}

impl Field {
    fn from_name(name: &str) -> Self {
        match name {
            "timestamp" | "asctime" => Field::Timestamp,
            "level" | "levelname" => Field::Level,
            "step" => Field::Step,
            "message" => Field::Message,
            other => Field::Extra(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { field: Field, width: Option<usize> },
}

/// A parsed record layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FormatTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| LoggerError::InvalidFormat {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                '{' => {
                    let mut spec = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        spec.push(c);
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'"));
                    }

                    let (name, width) = match spec.split_once(':') {
                        Some((name, width)) => {
                            let width = width
                                .trim()
                                .parse::<usize>()
                                .map_err(|_| invalid("field width must be an integer"))?;
                            (name.trim(), Some(width))
                        }
                        None => (spec.trim(), None),
                    };
                    if name.is_empty() {
                        return Err(invalid("empty field name"));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        field: Field::from_name(name),
                        width,
                    });
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template text this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute the record into the template.
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(self.source.len() + record.message.len() + 32);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { field, width } => {
                    let timestamp;
                    let value: &str = match field {
                        Field::Timestamp => {
                            timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
                            &timestamp
                        }
                        Field::Level => record.level,
                        Field::Step => &record.step,
                        Field::Message => &record.message,
                        Field::Extra(key) => record.extra.get(key).map_or("", String::as_str),
                    };
                    match width {
                        Some(width) => {
                            let _ = write!(out, "{:<width$}", value, width = *width);
                        }
                        None => out.push_str(value),
                    }
                }
            }
        }

        out
    }
}

impl std::fmt::Display for FormatTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Render for the terminal: substeps are indented, and when `colorize` is set
/// the whole line is wrapped in the level colour followed by a reset.
pub fn render_terminal(
    template: &FormatTemplate,
    record: &Record,
    registry: &LevelRegistry,
    colorize: bool,
) -> String {
    let spec = registry.spec_for_rank(record.rank);
    let mut line = template.render(record);

    if spec.map(|s| s.name) == Some("substep") {
        line.insert_str(0, SUBSTEP_INDENT);
    }

    if colorize {
        paint(&line, spec.map(|s| s.color))
    } else {
        line
    }
}

/// Wrap a line in an ANSI foreground colour; `None` uses the reset style.
///
/// Escapes are written directly instead of through `Colorize`, which consults
/// the process-wide `colored` override: `ColorMode` is decided per destination,
/// and unmapped ranks need an explicit reset prefix.
pub fn paint(line: &str, color: Option<Color>) -> String {
    match color {
        Some(color) => format!("\x1b[{}m{}{}", color.to_fg_str(), line, ANSI_RESET),
        None => format!("{}{}{}", ANSI_RESET, line, ANSI_RESET),
    }
}
