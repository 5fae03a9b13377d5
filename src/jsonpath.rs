//! # JSONPath
//!
//! JSONPath extraction over credential claims. Every query returns the
//! matched values together with the concrete (wildcard-free) path reached,
//! so the same node can be addressed again later — for example when
//! projecting a credential for limit disclosure.

use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};
use serde_json_path::JsonPath;

/// A single JSONPath match: the value found and the concrete path that
/// reached it, in normalized bracket form (`$['a'][0]['b']`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located {
    /// The matched value.
    pub value: Value,

    /// The concrete path to the value.
    pub path: String,
}

/// Evaluate a JSONPath expression against a JSON document, returning every
/// match in document order.
///
/// A query with no matches returns an empty vector.
///
/// # Errors
///
/// Returns an error if the expression is not valid JSONPath.
pub fn extract(root: &Value, expr: &str) -> Result<Vec<Located>> {
    let path =
        JsonPath::parse(expr).map_err(|e| anyhow!("invalid JSONPath expression {expr}: {e}"))?;

    Ok(path
        .query_located(root)
        .into_iter()
        .map(|node| Located {
            value: node.node().clone(),
            path: node.location().to_string(),
        })
        .collect())
}

/// One step of a concrete path: an object member name or an array index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Object member name.
    Name(String),

    /// Array index.
    Index(usize),
}

/// Parse a concrete path (as produced by [`extract`]) into its segments.
///
/// # Errors
///
/// Returns an error if the path contains wildcards or is otherwise not in
/// normalized bracket form.
pub fn concrete(path: &str) -> Result<Vec<Segment>> {
    let Some(mut rest) = path.strip_prefix('$') else {
        bail!("concrete path must start with '$': {path}");
    };

    let mut segments = vec![];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            bail!("expected '[' in concrete path: {path}");
        };

        if let Some(quoted) = inner.strip_prefix('\'') {
            // quoted member name, with `\'` and `\\` escapes
            let mut name = String::new();
            let mut chars = quoted.char_indices();
            let mut end = None;

            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, esc)) = chars.next() {
                            name.push(esc);
                        }
                    }
                    '\'' => {
                        end = Some(i);
                        break;
                    }
                    _ => name.push(c),
                }
            }

            let Some(end) = end else {
                bail!("unterminated name in concrete path: {path}");
            };
            let Some(after) = quoted[end + 1..].strip_prefix(']') else {
                bail!("expected ']' in concrete path: {path}");
            };

            segments.push(Segment::Name(name));
            rest = after;
        } else {
            let Some(end) = inner.find(']') else {
                bail!("expected ']' in concrete path: {path}");
            };
            let index = inner[..end]
                .parse::<usize>()
                .map_err(|e| anyhow!("invalid index in concrete path {path}: {e}"))?;

            segments.push(Segment::Index(index));
            rest = &inner[end + 1..];
        }
    }

    Ok(segments)
}

/// Insert a value into a JSON document at the location described by the
/// segments, creating intermediate objects and arrays as needed. Arrays are
/// padded with `null` up to the target index so that concrete indices are
/// preserved.
pub fn insert(target: &mut Value, segments: &[Segment], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *target = value;
        return;
    };

    match first {
        Segment::Name(name) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                let entry = map.entry(name.clone()).or_insert(Value::Null);
                insert(entry, rest, value);
            }
        }
        Segment::Index(index) => {
            if !target.is_array() {
                *target = Value::Array(vec![]);
            }
            if let Value::Array(arr) = target {
                while arr.len() <= *index {
                    arr.push(Value::Null);
                }
                insert(&mut arr[*index], rest, value);
            }
        }
    }
}
