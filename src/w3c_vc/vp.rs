//! # Verifiable Presentations
//!
//! [Verifiable Presentations](https://www.w3.org/TR/vc-data-model/#presentations-0)
//!
//! Specifications:
//! - <https://identity.foundation/presentation-exchange/spec/v2.0.0>
//! - <https://identity.foundation/claim-format-registry>

use std::str::FromStr;

use anyhow::bail;
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::{Kind, OneMany};
use crate::submission::PresentationSubmission;

const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// A Verifiable Presentation is used to combine and present credentials to
/// a Verifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiablePresentation {
    #[allow(rustdoc::bare_urls)]
    /// The @context property is used to map property URIs into short-form
    /// aliases. It is an ordered set where the first item is `"https://www.w3.org/2018/credentials/v1"`.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// MAY be used to provide a unique identifier for the presentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The type property expresses the type of presentation. Consists of
    /// `VerifiablePresentation` and, optionally, more specific presentation
    /// types.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The verifiableCredential property MUST be constructed from one or
    /// more verifiable credentials, or of data derived from verifiable
    /// credentials in a cryptographically verifiable format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<Vec<Kind<Value>>>,

    /// Holder is a URI for the entity that is generating the presentation.
    /// For example, did:example:ebfeb1f712ebc6f1c276e12ec21.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    /// The submission mapping input descriptors to the presented
    /// credentials, when embedded in the presentation.
    #[serde(rename = "presentation_submission", skip_serializing_if = "Option::is_none")]
    pub presentation_submission: Option<PresentationSubmission>,
}

impl VerifiablePresentation {
    /// Returns a new [`VpBuilder`], which can be used to build a
    /// [`VerifiablePresentation`].
    #[must_use]
    pub fn builder() -> VpBuilder {
        VpBuilder::new()
    }
}

/// [`VpBuilder`] is used to build a [`VerifiablePresentation`].
#[derive(Clone, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct VpBuilder {
    vp: VerifiablePresentation,
}

impl VpBuilder {
    /// Returns a new [`VpBuilder`].
    #[must_use]
    pub fn new() -> Self {
        let mut builder = Self::default();

        // sensible defaults
        builder.vp.id = Some(format!("urn:uuid:{}", Uuid::new_v4()));
        builder.vp.context.push(Kind::String(BASE_CONTEXT.to_string()));
        builder.vp.type_ = OneMany::One("VerifiablePresentation".to_string());
        builder
    }

    /// Sets the `id` property.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.vp.id = Some(id.into());
        self
    }

    /// Adds a URI to the `@context` property.
    #[must_use]
    pub fn add_context(mut self, context: Kind<Value>) -> Self {
        self.vp.context.push(context);
        self
    }

    /// Adds a type to the `type` property.
    #[must_use]
    pub fn add_type(mut self, type_: impl Into<String>) -> Self {
        let mut vp_type = match self.vp.type_ {
            OneMany::One(t) => vec![t],
            OneMany::Many(t) => t,
        };
        vp_type.push(type_.into());

        self.vp.type_ = OneMany::Many(vp_type);
        self
    }

    /// Adds a `verifiable_credential`.
    #[must_use]
    pub fn add_credential(mut self, vc: Kind<Value>) -> Self {
        if let Some(verifiable_credential) = self.vp.verifiable_credential.as_mut() {
            verifiable_credential.push(vc);
        } else {
            self.vp.verifiable_credential = Some(vec![vc]);
        }
        self
    }

    /// Sets the `holder` property.
    #[must_use]
    pub fn holder(mut self, holder: impl Into<String>) -> Self {
        self.vp.holder = Some(holder.into());
        self
    }

    /// Embeds a Presentation Submission.
    #[must_use]
    pub fn presentation_submission(mut self, submission: PresentationSubmission) -> Self {
        self.vp.presentation_submission = Some(submission);
        self
    }

    /// Turns this builder into a [`VerifiablePresentation`].
    ///
    /// # Errors
    ///
    /// Fails if any of the VP's mandatory fields are not set.
    pub fn build(self) -> anyhow::Result<VerifiablePresentation> {
        if self.vp.context.first() != Some(&Kind::String(BASE_CONTEXT.to_string())) {
            bail!("context must start with {BASE_CONTEXT}");
        }
        if !self.vp.type_.iter().any(|t| t == "VerifiablePresentation") {
            bail!("type must include VerifiablePresentation");
        }

        Ok(self.vp)
    }
}

impl TryFrom<VpBuilder> for VerifiablePresentation {
    type Error = anyhow::Error;

    fn try_from(builder: VpBuilder) -> anyhow::Result<Self, Self::Error> {
        builder.build()
    }
}

impl FromStr for VerifiablePresentation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self, Self::Err> {
        if &s[0..1] != "{" {
            // base64 encoded string
            let dec = Base64UrlUnpadded::decode_vec(s)?;
            return Ok(serde_json::from_slice(dec.as_slice())?);
        }

        // stringified JSON
        Ok(serde_json::from_str(s)?)
    }
}
