//! # Constraint Filters
//!
//! Evaluates the JSON-Schema-subset `filter` carried by a constraint field
//! against a single value extracted from a credential.
//!
//! The engine is total: a value that does not satisfy a keyword — including
//! a type mismatch — evaluates to "no match" rather than an error. Unknown
//! keywords are ignored for forward compatibility.

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A JSON-Schema-subset filter, as used by the `filter` property of a
/// constraint field.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Filter {
    /// Expected JSON type: `string`, `number`, `integer`, `boolean`,
    /// `array`, `object`, or `null`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// The value must equal this constant.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_: Option<Value>,

    /// The value must equal one of these constants.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,

    /// ECMAScript regular expression the (string) value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Semantic string format: `date`, `date-time`, `time`, `email`, `uri`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Inclusive lower bound for date formats (lexicographic ISO-8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_minimum: Option<String>,

    /// Inclusive upper bound for date formats (lexicographic ISO-8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_maximum: Option<String>,

    /// Exclusive lower bound for date formats (lexicographic ISO-8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_exclusive_minimum: Option<String>,

    /// Exclusive upper bound for date formats (lexicographic ISO-8601).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_exclusive_maximum: Option<String>,

    /// Inclusive numeric lower bound. Accepts a number or a numeric string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<NumberOrString>,

    /// Inclusive numeric upper bound. Accepts a number or a numeric string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<NumberOrString>,

    /// Exclusive numeric lower bound. Accepts a number or a numeric string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<NumberOrString>,

    /// Exclusive numeric upper bound. Accepts a number or a numeric string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<NumberOrString>,

    /// Minimum length of the (string) value, in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// Maximum length of the (string) value, in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Negates the nested filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Filter>>,
}

/// A number, or a string holding one. Numeric bounds in deployed
/// definitions appear in both forms.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum NumberOrString {
    /// A JSON number.
    Number(Number),

    /// A numeric string.
    String(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::String(s) => s.trim().parse().ok(),
        }
    }
}

/// The outcome of evaluating a [`Filter`] against a value.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterResult {
    /// Whether the value satisfied every recognized keyword.
    pub matched: bool,

    /// The value, normalized: numeric strings compared against numeric
    /// bounds are returned as numbers.
    pub value: Value,
}

impl Filter {
    /// Evaluate the filter against a value.
    #[must_use]
    pub fn evaluate(&self, value: &Value) -> FilterResult {
        let matched = self.matched(value);
        let value = if matched { self.normalize(value) } else { value.clone() };
        FilterResult { matched, value }
    }

    fn matched(&self, value: &Value) -> bool {
        if let Some(type_) = &self.type_ {
            if !type_matches(type_, value) {
                return false;
            }
        }
        if let Some(const_) = &self.const_ {
            if value != const_ {
                return false;
            }
        }
        if let Some(enum_) = &self.enum_ {
            if !enum_.contains(value) {
                return false;
            }
        }
        if let Some(pattern) = &self.pattern {
            let Some(s) = value.as_str() else {
                return false;
            };
            // an unparseable pattern matches nothing
            let Ok(re) = Regex::new(pattern) else {
                return false;
            };
            if !re.is_match(s) {
                return false;
            }
        }
        if !self.format_matched(value) {
            return false;
        }
        if !self.bounds_matched(value) {
            return false;
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            let Some(s) = value.as_str() else {
                return false;
            };
            let len = s.chars().count() as u64;
            if self.min_length.is_some_and(|min| len < min) {
                return false;
            }
            if self.max_length.is_some_and(|max| len > max) {
                return false;
            }
        }
        if let Some(not) = &self.not {
            if not.matched(value) {
                return false;
            }
        }

        true
    }

    fn format_matched(&self, value: &Value) -> bool {
        let Some(format) = &self.format else {
            return true;
        };
        let Some(s) = value.as_str() else {
            return false;
        };

        let valid = match format.as_str() {
            "date" => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
            "date-time" => DateTime::parse_from_rfc3339(s).is_ok(),
            "time" => parse_time(s),
            "email" => {
                // HTML5 email pattern with a required top-level label;
                // full RFC 5322 address syntax is not attempted
                Regex::new(
                    r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
                )
                .is_ok_and(|re| re.is_match(s))
            }
            "uri" => url::Url::parse(s).is_ok(),
            // unrecognized formats are ignored
            _ => true,
        };
        if !valid {
            return false;
        }

        // lexicographic ISO-8601 comparison for date formats
        if matches!(format.as_str(), "date" | "date-time" | "time") {
            if self.format_minimum.as_deref().is_some_and(|min| s < min) {
                return false;
            }
            if self.format_exclusive_minimum.as_deref().is_some_and(|min| s <= min) {
                return false;
            }
            if self.format_maximum.as_deref().is_some_and(|max| s > max) {
                return false;
            }
            if self.format_exclusive_maximum.as_deref().is_some_and(|max| s >= max) {
                return false;
            }
        }

        true
    }

    fn bounds_matched(&self, value: &Value) -> bool {
        if !self.has_numeric_bounds() {
            return true;
        }
        let Some(n) = as_number(value) else {
            return false;
        };

        if let Some(min) = &self.minimum {
            if !min.as_f64().is_some_and(|m| n >= m) {
                return false;
            }
        }
        if let Some(max) = &self.maximum {
            if !max.as_f64().is_some_and(|m| n <= m) {
                return false;
            }
        }
        if let Some(min) = &self.exclusive_minimum {
            if !min.as_f64().is_some_and(|m| n > m) {
                return false;
            }
        }
        if let Some(max) = &self.exclusive_maximum {
            if !max.as_f64().is_some_and(|m| n < m) {
                return false;
            }
        }

        true
    }

    const fn has_numeric_bounds(&self) -> bool {
        self.minimum.is_some()
            || self.maximum.is_some()
            || self.exclusive_minimum.is_some()
            || self.exclusive_maximum.is_some()
    }

    fn normalize(&self, value: &Value) -> Value {
        if self.has_numeric_bounds() {
            if let Value::String(s) = value {
                if let Ok(n) = s.trim().parse::<f64>() {
                    if let Some(number) = Number::from_f64(n) {
                        return Value::Number(number);
                    }
                }
            }
        }
        value.clone()
    }
}

fn type_matches(type_: &str, value: &Value) -> bool {
    match type_ {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => false,
    }
}

// Accepts a number or a numeric string (`OneOfNumberString`).
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// RFC 3339 time-of-day, with or without fractional seconds and offset.
fn parse_time(s: &str) -> bool {
    let naive = s.strip_suffix('Z').unwrap_or_else(|| {
        s.rfind(['+', '-']).map_or(s, |at| &s[..at])
    });
    NaiveTime::parse_from_str(naive, "%H:%M:%S%.f").is_ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn filter(value: Value) -> Filter {
        serde_json::from_value(value).expect("should deserialize")
    }

    #[test]
    fn const_and_enum() {
        let f = filter(json!({"type": "string", "const": "EmployeeIDCredential"}));
        assert!(f.evaluate(&json!("EmployeeIDCredential")).matched);
        assert!(!f.evaluate(&json!("PermanentResidentCard")).matched);

        let f = filter(json!({"enum": ["red", "green"]}));
        assert!(f.evaluate(&json!("green")).matched);
        assert!(!f.evaluate(&json!("blue")).matched);
    }

    #[test]
    fn pattern() {
        let f = filter(json!({"type": "string", "pattern": "EmployeeID[a-zA-Z]+"}));
        assert!(f.evaluate(&json!("EmployeeIDCredential")).matched);
        assert!(!f.evaluate(&json!(1234)).matched);
    }

    #[test]
    fn type_mismatch_is_no_match() {
        let f = filter(json!({"type": "integer"}));
        assert!(f.evaluate(&json!(25)).matched);
        assert!(!f.evaluate(&json!("25")).matched);
        assert!(!f.evaluate(&json!(25.5)).matched);
    }

    #[test]
    fn numeric_bounds_accept_numeric_strings() {
        let f = filter(json!({"minimum": 18}));
        assert!(f.evaluate(&json!(21)).matched);
        assert!(!f.evaluate(&json!(17)).matched);

        // numeric string is coerced and normalized
        let result = f.evaluate(&json!("21"));
        assert!(result.matched);
        assert_eq!(result.value, json!(21.0));

        let f = filter(json!({"exclusiveMaximum": "65"}));
        assert!(f.evaluate(&json!(64)).matched);
        assert!(!f.evaluate(&json!(65)).matched);
    }

    #[test]
    fn date_formats() {
        let f = filter(json!({"format": "date"}));
        assert!(f.evaluate(&json!("2023-11-20")).matched);
        assert!(!f.evaluate(&json!("20/11/2023")).matched);

        let f = filter(json!({"format": "date-time"}));
        assert!(f.evaluate(&json!("2023-11-20T23:21:55Z")).matched);

        let f = filter(json!({"format": "date", "formatMinimum": "2000-01-01"}));
        assert!(f.evaluate(&json!("2000-01-01")).matched);
        assert!(!f.evaluate(&json!("1999-12-31")).matched);

        let f = filter(json!({"format": "date", "formatExclusiveMaximum": "2000-01-01"}));
        assert!(!f.evaluate(&json!("2000-01-01")).matched);
    }

    #[test]
    fn email_format() {
        let f = filter(json!({"format": "email"}));
        assert!(f.evaluate(&json!("alice@example.com")).matched);
        assert!(f.evaluate(&json!("a@b.co")).matched);
        assert!(!f.evaluate(&json!("a@b..c")).matched);
        assert!(!f.evaluate(&json!("a@b")).matched);
        assert!(!f.evaluate(&json!("not-an-email")).matched);
    }

    #[test]
    fn negation() {
        let f = filter(json!({"not": {"const": "revoked"}}));
        assert!(f.evaluate(&json!("active")).matched);
        assert!(!f.evaluate(&json!("revoked")).matched);
    }

    #[test]
    fn unknown_keywords_ignored() {
        let f = filter(json!({"type": "array", "contains": {"const": "IDCredential"}}));
        assert!(f.evaluate(&json!(["VerifiableCredential"])).matched);
    }
}
