//! Shutter speed parsing.
//!
//! Accepted encodings:
//! - fraction: `1/125`, `1/2.5`
//! - compound: `1h`, `2m30s`, `1h 5m`, `5s`
//! - decimal seconds: `0.5`
//! - integer seconds: `2`

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A parsed shutter speed, keeping the text it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShutterSpeed {
    pub text: String,
    pub seconds: f64,
}

impl ShutterSpeed {
    pub fn parse(text: &str) -> Result<Self, String> {
        parse_seconds(text).map(|seconds| Self {
            text: text.trim().to_string(),
            seconds,
        })
    }
}

fn fraction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)\s*/\s*(\d+(?:\.\d+)?)$").expect("valid fraction regex")
    })
}

fn compound_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+(?:\.\d+)?)\s*s)?$")
            .expect("valid compound regex")
    })
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d*\.\d+$").expect("valid decimal regex"))
}

/// Convert a shutter speed string to seconds
pub fn parse_seconds(text: &str) -> Result<f64, String> {
    let value = text.trim().to_ascii_lowercase();
    if value.is_empty() {
        return Err("empty shutter speed".to_string());
    }

    if let Some(caps) = fraction_pattern().captures(&value) {
        let numerator: f64 = caps[1].parse().map_err(|_| format!("bad numerator in '{}'", text))?;
        let denominator: f64 = caps[2].parse().map_err(|_| format!("bad denominator in '{}'", text))?;
        if denominator == 0.0 {
            return Err(format!("zero denominator in '{}'", text));
        }
        return Ok(numerator / denominator);
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<u64>()
            .map(|s| s as f64)
            .map_err(|_| format!("integer out of range in '{}'", text));
    }

    if decimal_pattern().is_match(&value) {
        return value.parse().map_err(|_| format!("bad decimal '{}'", text));
    }

    if let Some(caps) = compound_pattern().captures(&value) {
        let hours = caps.get(1).map(|m| m.as_str().parse::<f64>());
        let minutes = caps.get(2).map(|m| m.as_str().parse::<f64>());
        let seconds = caps.get(3).map(|m| m.as_str().parse::<f64>());

        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            return Err(format!("unrecognized shutter speed '{}'", text));
        }

        let mut total = 0.0;
        for (part, scale) in [(hours, 3600.0), (minutes, 60.0), (seconds, 1.0)] {
            if let Some(parsed) = part {
                total += parsed.map_err(|_| format!("bad component in '{}'", text))? * scale;
            }
        }
        return Ok(total);
    }

    Err(format!("unrecognized shutter speed '{}'", text))
}
