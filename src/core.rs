//! # Core Utilities for Credibil Presentation Exchange
//!
//! The two JSON shape helpers the data model is built on: credentials and
//! issuers arrive either as strings (a JWT, a URI) or as objects, and
//! several data-model properties hold either one value or an array of
//! them.

use serde::{Deserialize, Serialize};

/// `Kind` allows serde to serialize/deserialize a string or an object —
/// a JWT-encoded or JSON-LD credential, a URI or object `@context` entry,
/// a URI or object issuer.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Kind<T> {
    /// Simple string value
    String(String),

    /// Complex object value
    Object(T),
}

impl<T> Default for Kind<T> {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl<T> Kind<T> {
    /// The string form, when the value is one — the JWT of an enveloped
    /// credential, or the URI of a context entry.
    pub const fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Object(_) => None,
        }
    }
}

/// `OneMany` allows serde to serialize/deserialize a single object or a
/// set of objects, as the data model permits for `type`,
/// `credentialSubject`, `credentialSchema`, `credentialStatus`, and
/// `proof`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneMany<T> {
    /// Single object
    One(T),

    /// Set of objects
    Many(Vec<T>),
}

impl<T: Default> Default for OneMany<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

impl<T> OneMany<T> {
    /// Iterate the contained object(s) without cloning, single objects as
    /// a one-element sequence.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(one) => std::slice::from_ref(one).iter(),
            Self::Many(many) => many.iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a OneMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
