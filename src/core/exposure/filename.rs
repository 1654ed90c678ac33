//! Filename grammars for exported exposures.
//!
//! Three naming schemes have been used across the archive's history:
//!
//! | Grammar | Example stem                                      |
//! |---------|---------------------------------------------------|
//! | Spaced  | `22-10-02 Ektar 100 Seebach 1`                    |
//! | Dashed  | `22-07-28 - 1 - Flims - Superia 400 -  - 5s`      |
//! | Hashed  | `23-01-01 - Zurich - Ektar 100 - F3 - 3s - #2`    |
//!
//! The separators decide which grammar applies, so a stem is only ever
//! checked against one of them.

use serde::{Deserialize, Serialize};

const SEPARATOR: &str = " - ";

/// Which naming scheme a filename follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameGrammar {
    Spaced,
    Dashed,
    Hashed,
}

/// Fields recovered from a recognized filename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameFields {
    pub grammar: NameGrammar,
    /// Frame number written in the filename
    pub index: u32,
    pub location: Option<String>,
    pub stock_hint: Option<String>,
}

/// Result of parsing a filename stem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ParsedName {
    Recognized(NameFields),
    /// Sentinel for stems that match no grammar
    FormatError { grammar: Option<NameGrammar>, reason: String },
}

impl ParsedName {
    pub fn fields(&self) -> Option<&NameFields> {
        match self {
            ParsedName::Recognized(fields) => Some(fields),
            ParsedName::FormatError { .. } => None,
        }
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self, ParsedName::FormatError { .. })
    }

    pub fn index(&self) -> Option<u32> {
        self.fields().map(|f| f.index)
    }
}

/// Parse a filename stem (no extension)
pub fn parse_name(stem: &str) -> ParsedName {
    let stem = stem.trim();

    if !stem.contains(SEPARATOR) {
        parse_spaced(stem)
    } else if stem.contains('#') {
        parse_hashed(stem)
    } else {
        parse_dashed(stem)
    }
}

fn parse_spaced(stem: &str) -> ParsedName {
    let tokens: Vec<&str> = stem.split_whitespace().collect();
    if tokens.len() < 2 {
        return format_error(None, format!("'{}' has no frame number", stem));
    }

    let last = tokens[tokens.len() - 1];
    let Some(index) = parse_index(last) else {
        return format_error(
            Some(NameGrammar::Spaced),
            format!("frame number '{}' is not an integer", last),
        );
    };

    let location = (tokens.len() >= 3).then(|| tokens[tokens.len() - 2].to_string());
    let stock_hint = if tokens.len() > 3 {
        non_empty(&tokens[1..tokens.len() - 2].join(" "))
    } else {
        None
    };

    ParsedName::Recognized(NameFields {
        grammar: NameGrammar::Spaced,
        index,
        location,
        stock_hint,
    })
}

fn parse_dashed(stem: &str) -> ParsedName {
    let parts: Vec<&str> = stem.split(SEPARATOR).map(str::trim).collect();
    let Some(index) = parts.get(1).and_then(|p| parse_index(p)) else {
        return format_error(
            Some(NameGrammar::Dashed),
            format!("second field of '{}' is not a frame number", stem),
        );
    };

    ParsedName::Recognized(NameFields {
        grammar: NameGrammar::Dashed,
        index,
        location: parts.get(2).and_then(|p| non_empty(p)),
        stock_hint: parts.get(3).and_then(|p| non_empty(p)),
    })
}

fn parse_hashed(stem: &str) -> ParsedName {
    let parts: Vec<&str> = stem.split(SEPARATOR).map(str::trim).collect();
    let last = parts[parts.len() - 1];

    let Some((_, number)) = last.rsplit_once('#') else {
        return format_error(
            Some(NameGrammar::Hashed),
            format!("last field '{}' has no '#'", last),
        );
    };
    let Some(index) = parse_index(number) else {
        return format_error(
            Some(NameGrammar::Hashed),
            format!("'#{}' is not a frame number", number),
        );
    };

    // Fields between the date and the trailing '#n'
    let inner = &parts[..parts.len() - 1];
    ParsedName::Recognized(NameFields {
        grammar: NameGrammar::Hashed,
        index,
        location: inner.get(1).and_then(|p| non_empty(p)),
        stock_hint: inner.get(2).and_then(|p| non_empty(p)),
    })
}

fn parse_index(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn format_error(grammar: Option<NameGrammar>, reason: String) -> ParsedName {
    ParsedName::FormatError { grammar, reason }
}
