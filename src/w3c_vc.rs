//! # Verifiable Credentials
//!
//! A naive implementation of the W3C [Verifiable Credentials Data Model
//! v1.1](https://www.w3.org/TR/vc-data-model), trimmed to the properties
//! Presentation Exchange evaluation touches. Credentials are evaluated as
//! JSON; these types give structured access to the envelope properties
//! (issuer, subject, proof, schema) the evaluation handlers reason about.

pub mod queryable;
pub mod vp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{Kind, OneMany};

/// `VerifiableCredential` represents the subset of the W3C Verifiable
/// Credential data model v1.1 used during evaluation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiableCredential {
    /// The @context property is used to map property URIs into short-form
    /// aliases. It is an ordered set where the first item is
    /// "`https://www.w3.org/2018/credentials/v1`".
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// If present, the id property's value MUST be a single URL, which MAY
    /// be dereferenceable. For example,
    /// "`http://example.edu/credentials/3732`".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The type property is used to determine whether a provided credential
    /// is appropriate for the intended use-case. An unordered set of terms
    /// or URIs.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// A URI or object with an id property identifying the credential's
    /// issuer.
    pub issuer: Kind<Issuer>,

    /// An XMLSCHEMA11-2 (RFC3339) date-time the credential was issued.
    /// e.g. 2010-01-01T19:23:24Z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,

    /// An XMLSCHEMA11-2 (RFC3339) date-time the credential ceases to be
    /// valid. e.g. 2010-06-30T19:23:24Z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// A set of objects containing claims about credential subject(s).
    pub credential_subject: OneMany<CredentialSubject>,

    /// One or more schemas that can be used to check credential data
    /// conformance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<OneMany<CredentialSchema>>,

    /// Used to determine the status of the credential, such as whether it
    /// is suspended or revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<OneMany<CredentialStatus>>,

    /// One or more cryptographic proofs that can be used to detect
    /// tampering and verify authorship of the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<OneMany<Proof>>,
}

impl VerifiableCredential {
    /// The issuer's identifier, regardless of whether the issuer is a URI
    /// or an object.
    #[must_use]
    pub fn issuer_id(&self) -> &str {
        match &self.issuer {
            Kind::String(id) => id,
            Kind::Object(issuer) => &issuer.id,
        }
    }

    /// Identifiers of the credential's subjects, omitting subjects with no
    /// id.
    #[must_use]
    pub fn subject_ids(&self) -> Vec<String> {
        self.credential_subject.iter().filter_map(|s| s.id.clone()).collect()
    }

    /// Proof types securing the credential.
    #[must_use]
    pub fn proof_types(&self) -> Vec<String> {
        self.proof
            .as_ref()
            .map(|proof| proof.iter().map(|p| p.type_.clone()).collect())
            .unwrap_or_default()
    }
}

/// The issuer of a credential, when expressed as an object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Issuer {
    /// A URI identifying the issuer.
    pub id: String,

    /// Additional issuer properties (for example a name).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Claims about a credential subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialSubject {
    /// Identifier of the subject the claims are about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The subject's claims.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// A schema the credential's data conforms to.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialSchema {
    /// URI of the schema.
    pub id: String,

    /// Schema type, e.g. "`JsonSchemaValidator2018`".
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// The status of a credential (suspended, revoked, and so on).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialStatus {
    /// URI where status information can be retrieved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Status type, e.g. "`BitstringStatusListEntry`".
    #[serde(rename = "type")]
    pub type_: String,

    /// Status-type-specific properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An embedded (Data Integrity) proof.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Proof {
    /// The signature suite used, e.g. "`Ed25519Signature2018`".
    #[serde(rename = "type")]
    pub type_: String,

    /// The reason the proof was created, e.g. "`assertionMethod`".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// The key material the proof verifies against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,

    /// Suite-specific proof properties (signature values and so on).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn issuer_forms() {
        let vc: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "credentialSubject": {"id": "did:example:subject"}
        }))
        .expect("should deserialize");
        assert_eq!(vc.issuer_id(), "did:example:issuer");
        assert_eq!(vc.subject_ids(), vec!["did:example:subject".to_string()]);

        let vc: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": "VerifiableCredential",
            "issuer": {"id": "did:example:issuer", "name": "Example University"},
            "credentialSubject": {"degree": "BachelorDegree"}
        }))
        .expect("should deserialize");
        assert_eq!(vc.issuer_id(), "did:example:issuer");
        assert!(vc.subject_ids().is_empty());
    }

    #[test]
    fn proof_types() {
        let vc: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "credentialSubject": {},
            "proof": {
                "type": "BbsBlsSignature2020",
                "proofPurpose": "assertionMethod",
                "verificationMethod": "did:example:issuer#key-1"
            }
        }))
        .expect("should deserialize");
        assert_eq!(vc.proof_types(), vec!["BbsBlsSignature2020".to_string()]);
    }
}
