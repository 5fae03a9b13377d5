//! # Credential Wrapping
//!
//! Normalizes externally supplied credentials — JWT-encoded or JSON-LD —
//! into a single in-memory representation with a stable JSONPath root, so
//! that one JSONPath syntax works across envelopes. JWT envelopes are
//! decoded (without signature verification, which is out of scope) and the
//! `vc` claim becomes the claims root, with registered JWT claims folded
//! into their canonical data-model locations.

use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value, json};

use crate::core::Kind;
use crate::w3c_vc::VerifiableCredential;

/// The envelope format of a wrapped credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimFormat {
    /// VC signed as a JWT.
    JwtVc,

    /// VC secured with an embedded (Linked Data) proof.
    LdpVc,
}

impl ClaimFormat {
    /// The claim format designation, as used in `format` maps and
    /// submission descriptor maps.
    #[must_use]
    pub const fn designation(self) -> &'static str {
        match self {
            Self::JwtVc => "jwt_vc",
            Self::LdpVc => "ldp_vc",
        }
    }

    /// Whether a `format` map key addresses this envelope. Registered
    /// aliases of each envelope are accepted.
    #[must_use]
    pub fn matches(self, key: &str) -> bool {
        match self {
            Self::JwtVc => matches!(key, "jwt" | "jwt_vc" | "jwt_vc_json" | "jwt_vc_json-ld"),
            Self::LdpVc => matches!(key, "ldp" | "ldp_vc"),
        }
    }
}

impl Display for ClaimFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.designation())
    }
}

/// A credential wrapped for evaluation: the original envelope plus a
/// decoded JSON view with canonical claim locations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Queryable {
    /// Decoded claims — the root all JSONPath expressions are evaluated
    /// against.
    pub claims: Value,

    /// Typed view of the same claims.
    pub vc: VerifiableCredential,

    /// The envelope format the credential arrived in.
    pub format: ClaimFormat,

    /// The JWS algorithm, for JWT envelopes.
    pub alg: Option<String>,

    /// The credential as issued.
    pub issued: Kind<Value>,
}

impl Queryable {
    /// Wrap an issued credential for evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if a JWT envelope cannot be decoded or the claims do
    /// not deserialize as a credential.
    pub fn from_issued(issued: &Kind<Value>) -> Result<Self> {
        let (claims, format, alg) = match issued {
            Kind::String(encoded) => {
                let (claims, alg) = decode_jwt(encoded)?;
                (claims, ClaimFormat::JwtVc, Some(alg))
            }
            Kind::Object(object) => (object.clone(), ClaimFormat::LdpVc, None),
        };

        let vc: VerifiableCredential = serde_json::from_value(claims.clone())
            .map_err(|e| anyhow!("credential claims do not deserialize: {e}"))?;

        Ok(Self {
            claims,
            vc,
            format,
            alg,
            issued: issued.clone(),
        })
    }

    /// Replace the credential with a projected (limit-disclosure) view.
    ///
    /// # Errors
    ///
    /// Returns an error if the projected claims do not deserialize as a
    /// credential.
    pub(crate) fn project(&mut self, claims: Value) -> Result<()> {
        self.vc = serde_json::from_value(claims.clone())
            .map_err(|e| anyhow!("projected claims do not deserialize: {e}"))?;
        self.issued = Kind::Object(claims.clone());
        self.claims = claims;
        Ok(())
    }
}

impl FromStr for Queryable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if &s[0..1] == "{" {
            return Self::from_issued(&Kind::Object(serde_json::from_str(s)?));
        }
        Self::from_issued(&Kind::String(s.to_string()))
    }
}

// Decode an unverified JWT credential into canonical claim locations,
// returning the claims and the JWS algorithm.
fn decode_jwt(token: &str) -> Result<(Value, String)> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        bail!("credential is not a compact JWT");
    }

    let header: Value = serde_json::from_slice(
        &Base64UrlUnpadded::decode_vec(parts[0])
            .map_err(|e| anyhow!("issue decoding JWT header: {e}"))?,
    )?;
    let payload: Value = serde_json::from_slice(
        &Base64UrlUnpadded::decode_vec(parts[1])
            .map_err(|e| anyhow!("issue decoding JWT payload: {e}"))?,
    )?;

    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("JWT header has no alg"))?
        .to_string();

    // the `vc` claim is the claims root; bare claim sets are used as-is
    let mut claims = payload.get("vc").cloned().unwrap_or_else(|| payload.clone());
    let Some(map) = claims.as_object_mut() else {
        bail!("JWT vc claim is not an object");
    };

    // fold registered claims into canonical locations
    if let Some(iss) = payload.get("iss") {
        map.entry("issuer").or_insert(iss.clone());
    }
    if let Some(jti) = payload.get("jti") {
        map.entry("id").or_insert(jti.clone());
    }
    if let Some(sub) = payload.get("sub").and_then(Value::as_str) {
        let subject = map.entry("credentialSubject").or_insert(Value::Object(Map::new()));
        if let Value::Object(subject) = subject {
            subject.entry("id").or_insert(json!(sub));
        }
    }
    if let Some(nbf) = payload.get("nbf").and_then(Value::as_i64) {
        if let Some(issued_at) = DateTime::from_timestamp(nbf, 0) {
            map.entry("issuanceDate")
                .or_insert(json!(issued_at.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
    }
    if let Some(exp) = payload.get("exp").and_then(Value::as_i64) {
        if let Some(expires_at) = DateTime::from_timestamp(exp, 0) {
            map.entry("expirationDate")
                .or_insert(json!(expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
    }

    Ok((claims, alg))
}
