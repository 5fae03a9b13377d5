//! # Presentation Submission
//!
//! The [Presentation Submission] maps a definition's input descriptors to
//! the credentials chosen to satisfy them, by JSONPath into the object the
//! submission is embedded in.
//!
//! [Presentation Submission]: (https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission)

use serde::{Deserialize, Serialize};

/// A mapping from input descriptor ids to the paths of the credentials
/// chosen to satisfy them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PresentationSubmission {
    /// A unique identifier for the submission.
    pub id: String,

    /// The `id` of the Presentation Definition the submission responds to.
    pub definition_id: String,

    /// One entry per satisfied input descriptor.
    pub descriptor_map: Vec<DescriptorMap>,
}

/// Maps one input descriptor to the credential satisfying it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DescriptorMap {
    /// The `id` of the input descriptor the entry satisfies.
    pub id: String,

    /// Claim format designation of the referenced credential (`jwt_vc`,
    /// `ldp_vc`, ...).
    pub format: String,

    /// JSONPath to the credential, evaluated against the object the
    /// submission is embedded in.
    pub path: String,

    /// Path to the claim when the credential is nested inside another
    /// object (for example a credential inside a presentation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_nested: Option<PathNested>,
}

/// A nested claim path within a [`DescriptorMap`] entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PathNested {
    /// Claim format designation at this level of nesting.
    pub format: String,

    /// JSONPath relative to the parent entry's target.
    pub path: String,

    /// Further nesting, for doubly-enveloped claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_nested: Option<Box<PathNested>>,
}

/// Where a generated Presentation Submission is placed.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresentationSubmissionLocation {
    /// Embedded in the Verifiable Presentation's `presentation_submission`
    /// property.
    #[default]
    Presentation,

    /// Returned alongside the presentation, for transports that carry the
    /// submission separately (for example a DIDComm attachment).
    External,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserialize_submission() {
        let submission: PresentationSubmission = serde_json::from_value(json!({
            "id": "a30e3b91-fb77-4d22-95fa-871689c322e2",
            "definition_id": "32f54163-7166-48f1-93d8-ff217bdb0653",
            "descriptor_map": [{
                "id": "employment_input",
                "format": "ldp_vc",
                "path": "$.verifiableCredential[0]"
            }]
        }))
        .expect("should deserialize");

        assert_eq!(submission.descriptor_map.len(), 1);
        assert_eq!(submission.descriptor_map[0].path, "$.verifiableCredential[0]");
        assert!(submission.descriptor_map[0].path_nested.is_none());
    }
}
