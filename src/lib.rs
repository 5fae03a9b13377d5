//! An API for evaluating Verifiable Credentials against the requirements of
//! a Verifier, based on the [DIF Presentation Exchange](https://identity.foundation/presentation-exchange/spec/v2.0.0)
//! specification.
//!
//! A Verifier publishes a Presentation Definition describing the
//! credentials and fields it requires. A wallet evaluates its credentials
//! against the definition, selects a satisfying subset, and responds with a
//! Verifiable Presentation and a Presentation Submission mapping each input
//! descriptor to the credential that satisfies it.
//!
//! This crate implements the evaluation core of that exchange:
//!
//! * [`evaluate_credentials`] / [`evaluate_presentation`] — test candidate
//!   credentials against every input descriptor, recording per-pair results.
//! * [`select_from`] — compute the minimal set of credentials satisfying
//!   the definition's submission requirements.
//! * [`presentation_from`] / [`verifiable_presentation_from`] — build an
//!   (optionally signed) presentation embedding the submission.
//! * [`validate_definition`] / [`validate_submission`] — structural
//!   validation ahead of evaluation.
//!
//! Cryptographic signing and verification are out of scope: signing is
//! delegated to a caller-supplied callback, and JWT credentials are decoded
//! without signature checks. Evaluation is a pure function of its inputs.

pub mod core;
pub mod definition;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod jsonpath;
pub mod presentation;
pub mod select;
pub mod submission;
pub mod validate;
pub mod w3c_vc;

pub use crate::core::{Kind, OneMany};
pub use crate::definition::PresentationDefinition;
pub use crate::error::Error;
pub use crate::evaluate::{
    CheckResult, EvaluationOptions, EvaluationResults, Status, evaluate_credentials,
    evaluate_presentation,
};
pub use crate::presentation::{
    PresentationResult, VerifiablePresentationResult, presentation_from,
    verifiable_presentation_from,
};
pub use crate::select::{SelectResults, presentation_submission_from, select_from};
pub use crate::submission::{PresentationSubmission, PresentationSubmissionLocation};
pub use crate::validate::{ValidationReport, validate_definition, validate_submission};
pub use crate::w3c_vc::vp::VerifiablePresentation;
