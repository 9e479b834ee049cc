//! Field delimiters
//!
//! Common delimiters get their own variant; anything else is carried as a
//! non-empty string so multi-character separators (`"||"`, `"::"`) work too.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported field delimiters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
    Semicolon,
    /// Any other non-empty separator
    Other(String),
}

impl Delimiter {
    /// Build a delimiter from an arbitrary separator string.
    ///
    /// An empty separator cannot split anything and falls back to comma.
    pub fn custom(sep: &str) -> Self {
        match sep {
            "" | "," => Delimiter::Comma,
            "\t" => Delimiter::Tab,
            "|" => Delimiter::Pipe,
            ";" => Delimiter::Semicolon,
            other => Delimiter::Other(other.to_string()),
        }
    }

    /// The separator text
    pub fn as_str(&self) -> &str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Tab => "\t",
            Delimiter::Pipe => "|",
            Delimiter::Semicolon => ";",
            Delimiter::Other(s) => s,
        }
    }

    /// Detect delimiter from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "tsv" | "tab" => Delimiter::Tab,
            "psv" => Delimiter::Pipe,
            _ => Delimiter::Comma,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "\\t"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for Delimiter {
    type Err = std::convert::Infallible;

    /// Accepts the literal separator or a name (`comma`, `tab`, `pipe`,
    /// `semicolon`, `\t`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "comma" => Delimiter::Comma,
            "tab" | "\\t" => Delimiter::Tab,
            "pipe" => Delimiter::Pipe,
            "semicolon" | "semi" => Delimiter::Semicolon,
            _ => Delimiter::custom(s),
        })
    }
}

impl From<String> for Delimiter {
    fn from(s: String) -> Self {
        Delimiter::custom(&s)
    }
}

impl From<Delimiter> for String {
    fn from(d: Delimiter) -> Self {
        d.as_str().to_string()
    }
}

/// Detect delimiter by analyzing first few lines
pub fn detect_delimiter(content: &str) -> Delimiter {
    let first_lines: String = content.lines().take(5).collect::<Vec<_>>().join("\n");

    let comma_count = first_lines.matches(',').count();
    let tab_count = first_lines.matches('\t').count();
    let pipe_count = first_lines.matches('|').count();
    let semi_count = first_lines.matches(';').count();

    let max = comma_count.max(tab_count).max(pipe_count).max(semi_count);

    if max == 0 {
        return Delimiter::Comma;
    }

    if tab_count == max {
        Delimiter::Tab
    } else if pipe_count == max {
        Delimiter::Pipe
    } else if semi_count == max {
        Delimiter::Semicolon
    } else {
        Delimiter::Comma
    }
}
