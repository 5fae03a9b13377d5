//! # Presentations
//!
//! Builds a Verifiable Presentation from the credentials selected for a
//! definition, placing the Presentation Submission either inside the
//! presentation or alongside it. Signing is delegated to a caller-supplied
//! callback: evaluation completes first, then the callback is awaited and
//! its result embedded verbatim.

use serde_json::Value;
use tracing::instrument;

use crate::core::Kind;
use crate::definition::PresentationDefinition;
use crate::error::{Error, Result};
use crate::evaluate::{EvaluationOptions, Status};
use crate::select;
use crate::submission::{PresentationSubmission, PresentationSubmissionLocation};
use crate::w3c_vc::vp::VerifiablePresentation;

const SUBMISSION_CONTEXT: &str =
    "https://identity.foundation/presentation-exchange/submission/v1";

/// An unsigned presentation and its submission.
#[derive(Clone, Debug, PartialEq)]
pub struct PresentationResult {
    /// The unsigned presentation, carrying the selected credentials.
    pub presentation: VerifiablePresentation,

    /// The synthesized submission.
    pub presentation_submission: PresentationSubmission,

    /// Where the submission has been placed.
    pub presentation_submission_location: PresentationSubmissionLocation,
}

/// A signed presentation and its submission.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiablePresentationResult {
    /// The signed presentation, exactly as returned by the signing
    /// callback.
    pub verifiable_presentation: Kind<Value>,

    /// The synthesized submission.
    pub presentation_submission: PresentationSubmission,

    /// Where the submission has been placed.
    pub presentation_submission_location: PresentationSubmissionLocation,
}

/// Build an unsigned Verifiable Presentation from the credentials
/// satisfying the definition.
///
/// # Errors
///
/// Returns an error if the credentials do not satisfy the definition's
/// requirements, or under the same conditions as
/// [`crate::evaluate_credentials`].
#[instrument(level = "debug", skip_all)]
pub fn presentation_from(
    definition: &PresentationDefinition, credentials: &[Kind<Value>], opts: &EvaluationOptions,
) -> Result<PresentationResult> {
    tracing::debug!("presentation_from");

    let (client, selection) = select::evaluate_and_resolve(definition, credentials, opts)?;
    if selection.status == Status::Error {
        return Err(Error::SubmissionFailure(selection.unsatisfied.join(", ")));
    }

    let (submission, order) =
        select::synthesize(definition, &selection.chosen, &client.credentials, opts, true);
    let location = opts.presentation_submission_location;

    let mut builder = VerifiablePresentation::builder();
    if let Some(holder) = opts.holder_dids.first() {
        builder = builder.holder(holder.clone());
    }
    for &j in &order {
        builder = builder.add_credential(client.credentials[j].issued.clone());
    }
    if location == PresentationSubmissionLocation::Presentation {
        builder = builder
            .add_context(Kind::String(SUBMISSION_CONTEXT.to_string()))
            .add_type("PresentationSubmission")
            .presentation_submission(submission.clone());
    }

    Ok(PresentationResult {
        presentation: builder.build()?,
        presentation_submission: submission,
        presentation_submission_location: location,
    })
}

/// Build and sign a Verifiable Presentation. Evaluation completes, then
/// the signing callback is awaited and its result embedded verbatim.
///
/// # Errors
///
/// Returns an error under the same conditions as [`presentation_from`], or
/// when the signing callback fails.
#[instrument(level = "debug", skip_all)]
pub async fn verifiable_presentation_from<F, Fut>(
    definition: &PresentationDefinition, credentials: &[Kind<Value>], sign: F,
    opts: &EvaluationOptions,
) -> Result<VerifiablePresentationResult>
where
    F: FnOnce(VerifiablePresentation) -> Fut,
    Fut: Future<Output = anyhow::Result<Kind<Value>>>,
{
    tracing::debug!("verifiable_presentation_from");

    let result = presentation_from(definition, credentials, opts)?;
    let signed = sign(result.presentation).await.map_err(Error::ServerError)?;

    Ok(VerifiablePresentationResult {
        verifiable_presentation: signed,
        presentation_submission: result.presentation_submission,
        presentation_submission_location: result.presentation_submission_location,
    })
}
