//! # Presentation Definition
//!
//! Types for the [Presentation Definition]: a Verifier-authored document
//! stating what credentials and fields a Holder must present. Versions 1 and
//! 2 of the data model are normalized into the one set of types below; the
//! presence of a v1 `schema` list on any descriptor marks a definition as
//! v1.
//!
//! [Presentation Definition]: (https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// A Presentation Definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PresentationDefinition {
    /// A unique identifier for the definition.
    pub id: String,

    /// A human-friendly name for the definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Describes the purpose for which the definition's inputs are being
    /// requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Claim format designations the Verifier accepts, keyed by format
    /// identifier (`jwt_vc`, `ldp_vc`, ...), each carrying the signature
    /// suites or JWS algorithms allowed for that format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<BTreeMap<String, FormatProfile>>,

    /// Requirements a conformant submission must satisfy. Inputs listed in
    /// `input_descriptors` are all required unless requirements say
    /// otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_requirements: Option<Vec<SubmissionRequirement>>,

    /// The inputs (credentials) required for submission.
    pub input_descriptors: Vec<InputDescriptor>,
}

impl PresentationDefinition {
    /// The data model version the definition was authored against.
    #[must_use]
    pub fn version(&self) -> Version {
        if self.input_descriptors.iter().any(|d| d.schema.is_some()) {
            Version::V1
        } else {
            Version::V2
        }
    }

    /// Find a constraint field by its `id`, searching every descriptor.
    #[must_use]
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.input_descriptors
            .iter()
            .filter_map(|d| d.constraints.fields.as_ref())
            .flatten()
            .find(|f| f.id.as_deref() == Some(field_id))
    }
}

/// Presentation Exchange data model versions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Version {
    /// Presentation Exchange v1: descriptors carry a `schema` list.
    V1,

    /// Presentation Exchange v2: formats are declared in `format` maps.
    #[default]
    V2,
}

/// One requirement within a Presentation Definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InputDescriptor {
    /// A unique identifier for the descriptor (unique within the
    /// definition).
    pub id: String,

    /// Group names referenced by `submission_requirements`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<String>>,

    /// A human-friendly name for the descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Describes the purpose for which the claim's data is being requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Per-descriptor claim format designations, overriding the
    /// definition's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<BTreeMap<String, FormatProfile>>,

    /// Constraint the descriptor places on candidate credentials.
    pub constraints: Constraints,

    /// Credential schemas the candidate must conform to (v1 only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<SchemaRef>>,
}

/// Algorithms or proof types allowed for a claim format.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatProfile {
    /// Allowed JWS algorithms (JWT-based formats).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<Vec<String>>,

    /// Allowed signature suites (Linked Data formats).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_type: Option<Vec<String>>,
}

/// A reference to a credential schema (v1).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SchemaRef {
    /// URI of the schema.
    pub uri: String,

    /// Whether the candidate credential must conform to the schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Constraints an input descriptor places on candidate credentials.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Constraints {
    /// Claims the candidate credential must contain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,

    /// When set, the submitted credential must (or should) contain no more
    /// data than the `fields` describe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_disclosure: Option<Optionality>,

    /// When set, the credential's subject must (or should) be its issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_is_issuer: Option<Optionality>,

    /// Fields whose subject the Holder must be.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_holder: Option<Vec<HolderSubject>>,

    /// Fields whose credentials must share one subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_subject: Option<Vec<HolderSubject>>,
}

/// A single claim requirement within a constraint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Field {
    /// Identifies the field for cross-references from `is_holder`,
    /// `same_subject`, and `submission_requirements`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// One or more JSONPath expressions, tried in order. The first
    /// expression that selects a value settles the field, accommodating
    /// format differences between credential envelopes.
    pub path: Vec<String>,

    /// A human-friendly name for the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Describes the purpose for which the field's data is being requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// A filter the selected value must satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    /// When set, the submission reveals only whether the filter held, not
    /// the underlying value. Requires `filter`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Optionality>,

    /// When `true`, a candidate lacking the field is still valid (v2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Whether a directive must be honored or is merely preferred.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Optionality {
    /// The directive must be satisfied.
    Required,

    /// The directive should be satisfied; failure is reported as a warning.
    Preferred,
}

/// Field identifiers bound to a subject requirement (`is_holder` /
/// `same_subject`).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct HolderSubject {
    /// Identifiers of the constraint fields the directive applies to.
    pub field_id: Vec<String>,

    /// Whether the requirement must be honored.
    pub directive: Optionality,
}

/// A rule combining descriptor groups into higher-level selection logic.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubmissionRequirement {
    /// The selection rule to apply.
    pub rule: Rule,

    /// A human-friendly name, echoed in error reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Describes the purpose of the requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// The descriptor group the rule draws from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Nested requirements the rule draws from, instead of a group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_nested: Option<Vec<SubmissionRequirement>>,

    /// Exact number of inputs a `pick` must satisfy (shorthand for
    /// `min = max = count`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Minimum number of inputs a `pick` must satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,

    /// Maximum number of inputs a `pick` may satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

/// Submission requirement rules.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Every input the requirement draws from must be satisfied.
    #[default]
    All,

    /// A bounded number of the inputs must be satisfied.
    Pick,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn version_detection() {
        let v1: PresentationDefinition = serde_json::from_value(json!({
            "id": "pd-1",
            "input_descriptors": [{
                "id": "employment",
                "schema": [{"uri": "https://www.w3.org/2018/credentials/v1"}],
                "constraints": {}
            }]
        }))
        .expect("should deserialize");
        assert_eq!(v1.version(), Version::V1);

        let v2: PresentationDefinition = serde_json::from_value(json!({
            "id": "pd-2",
            "format": {"jwt_vc": {"alg": ["EdDSA", "ES256K"]}},
            "input_descriptors": [{
                "id": "employment",
                "constraints": {
                    "fields": [{
                        "path": ["$.type"],
                        "filter": {"type": "string", "const": "EmployeeIDCredential"}
                    }]
                }
            }]
        }))
        .expect("should deserialize");
        assert_eq!(v2.version(), Version::V2);
    }

    #[test]
    fn field_lookup() {
        let definition: PresentationDefinition = serde_json::from_value(json!({
            "id": "pd-3",
            "input_descriptors": [{
                "id": "identity",
                "constraints": {
                    "fields": [{"id": "subject_dob", "path": ["$.credentialSubject.birthDate"]}]
                }
            }]
        }))
        .expect("should deserialize");

        assert!(definition.field("subject_dob").is_some());
        assert!(definition.field("unknown").is_none());
    }
}
