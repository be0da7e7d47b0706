//! Immutable value tree for parsed JSON documents.
//!
//! `serde_json` does the text-to-tree work; we re-tag its output into our
//! own six-kind union so the rest of the crate never touches serde types.
//! Numbers collapse to f64 (double precision, like the documents they
//! came from). Object member order is preserved for error messages.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A parsed JSON value. Constructed once, read-only thereafter.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Json {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Json>),
    Object(IndexMap<String, Json>),
}

impl From<serde_json::Value> for Json {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Json::Null,
            serde_json::Value::Bool(b) => Json::Boolean(b),
            // u64/i64 outside f64's exact range widen lossily, same as the
            // double-based documents this models.
            serde_json::Value::Number(n) => Json::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Json::String(s),
            serde_json::Value::Array(xs) => Json::Array(xs.into_iter().map(Json::from).collect()),
            serde_json::Value::Object(m) => {
                Json::Object(m.into_iter().map(|(k, v)| (k, Json::from(v))).collect())
            }
        }
    }
}

impl Json {
    /// One of `array`, `boolean`, `null`, `number`, `object`, `string`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Json::Null => "null",
            Json::Boolean(_) => "boolean",
            Json::Number(_) => "number",
            Json::String(_) => "string",
            Json::Array(_) => "array",
            Json::Object(_) => "object",
        }
    }

    /// Kind name with its article, for error tails ("an array", "a boolean").
    pub fn kind_with_article(&self) -> &'static str {
        match self {
            Json::Null => "null",
            Json::Boolean(_) => "a boolean",
            Json::Number(_) => "a number",
            Json::String(_) => "a string",
            Json::Array(_) => "an array",
            Json::Object(_) => "an object",
        }
    }
}

/// Render a number the way a JSON console would: integral values print
/// without a fractional tail, so `[1, 2]` comes back as `[1,2]`.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else if n.is_finite() {
        write!(f, "{n}")
    } else {
        // JSON has no NaN/Infinity literal; mirror serde_json's null.
        f.write_str("null")
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    // serde_json handles the escaping rules; strings always serialize.
    match serde_json::to_string(s) {
        Ok(q) => f.write_str(&q),
        Err(_) => write!(f, "{s:?}"),
    }
}

impl fmt::Display for Json {
    /// Compact rendering used verbatim inside error trails.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Json::Null => f.write_str("null"),
            Json::Boolean(b) => write!(f, "{b}"),
            Json::Number(n) => write_number(f, *n),
            Json::String(s) => write_string(f, s),
            Json::Array(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
            Json::Object(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_string(f, k)?;
                    write!(f, ":{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(text: &str) -> Json {
        Json::from(serde_json::from_str::<serde_json::Value>(text).unwrap())
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(tree("[1, 2]").to_string(), "[1,2]");
        assert_eq!(tree("2.5").to_string(), "2.5");
        assert_eq!(tree("-7").to_string(), "-7");
    }

    #[test]
    fn objects_render_in_insertion_order() {
        let v = tree(r#"{"b": 1, "a": {"x": true}}"#);
        assert_eq!(v.to_string(), r#"{"b":1,"a":{"x":true}}"#);
    }

    #[test]
    fn strings_are_escaped() {
        let v = tree(r#""he said \"hi\"""#);
        assert_eq!(v.to_string(), r#""he said \"hi\"""#);
    }

    #[test]
    fn kinds_and_articles() {
        assert_eq!(tree("[]").kind_name(), "array");
        assert_eq!(tree("[]").kind_with_article(), "an array");
        assert_eq!(tree("true").kind_with_article(), "a boolean");
        assert_eq!(tree("null").kind_with_article(), "null");
    }

    #[test]
    fn serializes_back_to_plain_json() {
        let v = tree(r#"{"p": [true, null, "x"]}"#);
        let out = serde_json::to_string(&v).unwrap();
        assert_eq!(out, r#"{"p":[true,null,"x"]}"#);
    }
}
