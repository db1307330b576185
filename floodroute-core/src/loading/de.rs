//! Parsing of loosely typed dataset attributes
//!
//! Road datasets encode booleans as real booleans, numbers, or any of a dozen
//! strings. Each family has an explicit truth table here; nothing relies on
//! implicit truthiness.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Flood flag from a JSON attribute.
///
/// | input | result |
/// |---|---|
/// | `true` / `false` | as is |
/// | number | `true` when finite and non-zero |
/// | string | see [`parse_flag_text`] |
/// | `null`, array, object | `false` |
pub fn parse_flood_flag(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v.is_finite() && v != 0.0),
        JsonValue::String(s) => parse_flag_text(s),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => false,
    }
}

/// Flag from text, trimmed and case-insensitive.
///
/// `1`, `true`, `t`, `yes`, `y`, `on` are true; `0`, `false`, `f`, `no`, `n`,
/// `off` and the empty string are false; any other numeric text is true when
/// non-zero. Everything else is false.
pub fn parse_flag_text(text: &str) -> bool {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => true,
        "0" | "false" | "f" | "no" | "n" | "off" | "" => false,
        other => other
            .parse::<f64>()
            .is_ok_and(|v| v.is_finite() && v != 0.0),
    }
}

/// Travel direction of a road from its `oneway` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oneway {
    TwoWay,
    /// One-way along the digitised direction
    Forward,
    /// One-way against the digitised direction (`-1`, `reverse`)
    Reverse,
}

impl Oneway {
    /// Direction from text; anything but a reverse marker follows
    /// [`parse_flag_text`]
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "-1" | "reverse" => Oneway::Reverse,
            other if parse_flag_text(other) => Oneway::Forward,
            _ => Oneway::TwoWay,
        }
    }

    /// Direction from a JSON attribute; numbers and booleans follow
    /// [`parse_flood_flag`] except for `-1`
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::String(s) => Self::from_text(s),
            JsonValue::Number(n) if n.as_f64() == Some(-1.0) => Oneway::Reverse,
            other if parse_flood_flag(other) => Oneway::Forward,
            _ => Oneway::TwoWay,
        }
    }
}

/// Speed from a `maxspeed`-style value: `50`, `50 km/h`, `30 mph`, `walk`.
pub fn parse_speed(raw: &str) -> Option<f64> {
    let text = raw.trim().to_ascii_lowercase();
    if text == "walk" {
        return Some(5.0);
    }
    let (number, factor) = if let Some(stripped) = text.strip_suffix("mph") {
        (stripped, 1.609_344)
    } else if let Some(stripped) = text.strip_suffix("km/h") {
        (stripped, 1.0)
    } else if let Some(stripped) = text.strip_suffix("kmh") {
        (stripped, 1.0)
    } else {
        (text.as_str(), 1.0)
    };
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v * factor)
}

/// Number from a JSON attribute that may be a number or numeric text
pub fn json_f64(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|v: &f64| v.is_finite())
}

/// Tags from either a JSON object or an hstore-style string
/// (`"maxspeed"=>"50", "lanes"=>"2"`)
pub fn parse_tags(value: &JsonValue) -> BTreeMap<String, String> {
    match value {
        JsonValue::Object(map) => map
            .iter()
            .filter_map(|(k, v)| match v {
                JsonValue::String(s) => Some((k.clone(), s.clone())),
                JsonValue::Number(n) => Some((k.clone(), n.to_string())),
                JsonValue::Bool(b) => Some((k.clone(), b.to_string())),
                _ => None,
            })
            .collect(),
        JsonValue::String(s) => parse_tag_text(s),
        _ => BTreeMap::new(),
    }
}

/// Tags from text holding a JSON object or hstore pairs
pub fn parse_tag_text(text: &str) -> BTreeMap<String, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return BTreeMap::new();
    }
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<JsonValue>(trimmed) {
            return parse_tags(&value);
        }
    }
    trimmed
        .split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once("=>")?;
            let key = key.trim().trim_matches('"');
            let value = value.trim().trim_matches('"');
            (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

pub(super) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().is_some_and(parse_flag_text))
}

pub(super) fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite()))
}
