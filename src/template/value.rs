//! Typed crawl-start option values

use serde::Serialize;
use std::fmt;

/// The value of one crawl-start option
///
/// Serializes untagged, so a request renders as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    String(String),
    Int(i32),
    Long(i64),
    StringList(Vec<String>),
}

/// The type of an option value, without the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    String,
    Int,
    Long,
    StringList,
}

impl OptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Long => "64-bit integer",
            Self::StringList => "string list",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::String(_) => OptionKind::String,
            Self::Int(_) => OptionKind::Int,
            Self::Long(_) => OptionKind::Long,
            Self::StringList(_) => OptionKind::StringList,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value of an `Int` or `Long` option, widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i64::from(*i)),
            Self::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Converts a TOML value to an option value of the same kind as `self`
    ///
    /// Returns `None` if the TOML value cannot represent this kind.
    pub fn coerce_toml(&self, value: &toml::Value) -> Option<OptionValue> {
        match (self, value) {
            (Self::String(_), toml::Value::String(s)) => Some(Self::String(s.clone())),
            (Self::Int(_), toml::Value::Integer(i)) => Some(Self::Int(saturate_i32(*i))),
            (Self::Long(_), toml::Value::Integer(i)) => Some(Self::Long(*i)),
            (Self::StringList(_), toml::Value::Array(_)) => {
                toml_string_array(value).map(Self::StringList)
            }
            _ => None,
        }
    }

    /// Infers an option value from a TOML value for a key with no built-in default
    pub fn from_toml(value: &toml::Value) -> Option<OptionValue> {
        match value {
            toml::Value::String(s) => Some(Self::String(s.clone())),
            toml::Value::Integer(i) => Some(Self::Long(*i)),
            toml::Value::Array(_) => toml_string_array(value).map(Self::StringList),
            _ => None,
        }
    }
}

impl OptionValue {
    /// Coerces a caller-supplied JSON value to the kind of `self`
    ///
    /// Strings are taken as-is for `String` options and numbers are rendered. Integer
    /// options accept JSON integers, floats without a fractional part and trimmed numeric
    /// strings; values past the option's range saturate to its bounds. List options accept
    /// an array (elements rendered as strings) or a comma-separated string. Returns `None`
    /// for any other shape.
    pub fn coerce_json(&self, value: &serde_json::Value) -> Option<OptionValue> {
        use serde_json::Value;

        match (self, value) {
            (Self::String(_), Value::String(s)) => Some(Self::String(s.clone())),
            (Self::String(_), Value::Number(n)) => Some(Self::String(n.to_string())),
            (Self::Int(_), _) => json_integer(value).map(|i| Self::Int(saturate_i32(i))),
            (Self::Long(_), _) => json_integer(value).map(Self::Long),
            (Self::StringList(_), Value::Array(items)) => Some(Self::StringList(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            (Self::StringList(_), Value::String(s)) => Some(Self::StringList(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Renders the value as JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::from(s.as_str()),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Long(l) => serde_json::Value::from(*l),
            Self::StringList(list) => serde_json::Value::from(list.clone()),
        }
    }
}

/// Integer content of a JSON number or of a string holding one, saturated to i64
fn json_integer(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().and_then(whole_f64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_f64))
        }
        _ => None,
    }
}

/// A finite float without fractional part; the cast saturates at the i64 bounds
fn whole_f64(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

fn saturate_i32(i: i64) -> i32 {
    i32::try_from(i).unwrap_or(if i < 0 { i32::MIN } else { i32::MAX })
}

/// Returns the elements of a TOML array if all of them are strings
fn toml_string_array(value: &toml::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<i64> for OptionValue {
    fn from(l: i64) -> Self {
        Self::Long(l)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}
