//! # Evaluation
//!
//! The evaluation core: a fixed chain of handlers, each reading the results
//! of prior stages and appending its own to a shared, append-only log. The
//! client seeds the log with one candidate entry per `(input descriptor,
//! credential)` pair, runs the chain, and projects the log into aggregated
//! [`EvaluationResults`].
//!
//! Constraint failures are recorded as `Error`-status log entries, never
//! returned as `Err`: evaluation is total over well-formed inputs.

pub(crate) mod handlers;

use anyhow::anyhow;
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::core::Kind;
use crate::definition::PresentationDefinition;
use crate::error::{Error, Result};
use crate::select;
use crate::submission::{DescriptorMap, PresentationSubmission, PresentationSubmissionLocation};
use crate::w3c_vc::queryable::Queryable;
use crate::w3c_vc::vp::VerifiablePresentation;

/// Severity of a check result. The final verdict for a `(descriptor,
/// credential)` pair is the maximum severity across the pair's log entries.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The check passed.
    #[default]
    Info,

    /// A preferred directive was not honored.
    Warn,

    /// A required constraint was not satisfied.
    Error,
}

/// One entry in the evaluation log.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CheckResult {
    /// JSONPath of the input descriptor, rooted at the definition
    /// (`$.input_descriptors[i]`).
    pub input_descriptor_path: String,

    /// JSONPath of the credential, rooted at the credential set
    /// (`$.verifiableCredential[j]`).
    pub verifiable_credential_path: String,

    /// Name of the handler that appended the entry.
    pub evaluator: &'static str,

    /// Severity of the entry.
    pub status: Status,

    /// Human-readable outcome.
    pub message: String,

    /// Handler-specific detail, read by later stages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Options recognized by evaluation and selection.
#[derive(Clone, Debug, Default)]
pub struct EvaluationOptions {
    /// DIDs the wallet controls, used by the subject binding checks.
    pub holder_dids: Vec<String>,

    /// Signature suites that support selective disclosure.
    pub limit_disclosure_signature_suites: Vec<String>,

    /// Caller-imposed claim format allow-list, intersected with the
    /// definition's.
    pub restrict_to_formats: Option<Vec<String>>,

    /// Allowed DID methods for credential issuers.
    pub restrict_to_did_methods: Option<Vec<String>>,

    /// A pre-existing submission to evaluate against instead of generating
    /// one.
    pub presentation_submission: Option<PresentationSubmission>,

    /// Force generation of a submission even when one is supplied or
    /// embedded.
    pub generate_presentation_submission: bool,

    /// Where a generated submission is placed.
    pub presentation_submission_location: PresentationSubmissionLocation,

    /// Identifier for generated submissions. Defaults to a new UUID;
    /// supply one for deterministic output.
    pub submission_id: Option<String>,
}

/// The aggregated outcome of evaluating credentials against a definition.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EvaluationResults {
    /// The Presentation Submission, when the definition's requirements can
    /// be met.
    pub value: Option<PresentationSubmission>,

    /// Preferred directives that were not honored.
    pub warnings: Vec<CheckResult>,

    /// Required constraints that were not satisfied.
    pub errors: Vec<CheckResult>,

    /// The credentials, in input order, with limit-disclosure projections
    /// applied where a descriptor required them.
    pub verifiable_credential: Vec<Kind<Value>>,

    /// Overall verdict: `Info` on success, `Warn` when only preferred
    /// directives were violated, `Error` on hard failure.
    pub are_required_credentials_present: Status,
}

/// Evaluate each candidate credential against each of the definition's
/// input descriptors.
///
/// # Errors
///
/// Returns an error if a credential cannot be decoded or the definition
/// carries an unparseable JSONPath expression. Unsatisfied constraints are
/// not errors: they are reported through the result log.
#[instrument(level = "debug", skip_all)]
pub fn evaluate_credentials(
    definition: &PresentationDefinition, credentials: &[Kind<Value>], opts: &EvaluationOptions,
) -> Result<EvaluationResults> {
    tracing::debug!("evaluate_credentials");

    let queryables = credentials
        .iter()
        .map(Queryable::from_issued)
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| Error::InvalidInput(e.to_string()))?;

    let mut client = EvaluationClient::new(definition, opts, queryables);
    client.evaluate()?;
    client.into_results()
}

/// Evaluate the credentials carried by a Verifiable Presentation. An
/// embedded `presentation_submission` is evaluated against, unless
/// `generate_presentation_submission` forces regeneration.
///
/// # Errors
///
/// Returns an error if the presentation cannot be decoded, or under the
/// same conditions as [`evaluate_credentials`].
#[instrument(level = "debug", skip_all)]
pub fn evaluate_presentation(
    definition: &PresentationDefinition, presentation: &Kind<Value>, opts: &EvaluationOptions,
) -> Result<EvaluationResults> {
    tracing::debug!("evaluate_presentation");

    let vp: VerifiablePresentation = match presentation {
        Kind::String(encoded) => {
            if encoded.starts_with('{') {
                serde_json::from_str(encoded).map_err(|e| Error::InvalidInput(e.to_string()))?
            } else {
                decode_jwt_vp(encoded)?
            }
        }
        Kind::Object(object) => serde_json::from_value(object.clone())
            .map_err(|e| Error::InvalidInput(e.to_string()))?,
    };

    let credentials = vp.verifiable_credential.unwrap_or_default();

    let mut opts = opts.clone();
    if opts.presentation_submission.is_none() && !opts.generate_presentation_submission {
        opts.presentation_submission = vp.presentation_submission;
    }

    evaluate_credentials(definition, &credentials, &opts)
}

// Decode the `vp` claim of an unverified JWT presentation.
fn decode_jwt_vp(token: &str) -> Result<VerifiablePresentation> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidInput("presentation is not a compact JWT".to_string()));
    }
    let payload: Value = Base64UrlUnpadded::decode_vec(parts[1])
        .map_err(|e| anyhow!("issue decoding JWT payload: {e}"))
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .map_err(|e: anyhow::Error| Error::InvalidInput(e.to_string()))?;

    let vp = payload.get("vp").cloned().unwrap_or(payload);
    serde_json::from_value(vp).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Runs the handler chain for one evaluation call. An instance serves a
/// single call and is discarded with its log once results are emitted.
pub(crate) struct EvaluationClient<'a> {
    /// The definition under evaluation. Read-only: callers wanting to
    /// amend a definition do so before handing it in.
    pub definition: &'a PresentationDefinition,

    /// Caller options.
    pub opts: &'a EvaluationOptions,

    /// Wrapped candidate credentials. Limit disclosure replaces entries
    /// with projected views.
    pub credentials: Vec<Queryable>,

    /// The append-only result log.
    pub results: Vec<CheckResult>,
}

impl<'a> EvaluationClient<'a> {
    pub fn new(
        definition: &'a PresentationDefinition, opts: &'a EvaluationOptions,
        credentials: Vec<Queryable>,
    ) -> Self {
        Self {
            definition,
            opts,
            credentials,
            results: vec![],
        }
    }

    /// Run the handler chain, seeding the log with one candidate entry per
    /// `(descriptor, credential)` pair.
    pub fn evaluate(&mut self) -> Result<()> {
        for i in 0..self.definition.input_descriptors.len() {
            for j in 0..self.credentials.len() {
                self.add(
                    i,
                    j,
                    "InputCandidate",
                    Status::Info,
                    "Input candidate received for evaluation",
                    None,
                );
            }
        }

        for handler in handlers::chain(self.definition.version()) {
            tracing::debug!("evaluate::{}", handler.name());
            handler.handle(self)?;
        }

        Ok(())
    }

    /// Append a result for the `(descriptor, credential)` pair.
    pub fn add(
        &mut self, descriptor: usize, credential: usize, evaluator: &'static str, status: Status,
        message: impl Into<String>, payload: Option<Value>,
    ) {
        self.results.push(CheckResult {
            input_descriptor_path: descriptor_path(descriptor),
            verifiable_credential_path: credential_path(credential),
            evaluator,
            status,
            message: message.into(),
            payload,
        });
    }

    /// Log entries for the `(descriptor, credential)` pair, in append
    /// order.
    pub fn entries(
        &self, descriptor: usize, credential: usize,
    ) -> impl Iterator<Item = &CheckResult> {
        let descriptor = descriptor_path(descriptor);
        let credential = credential_path(credential);

        self.results.iter().filter(move |r| {
            r.input_descriptor_path == descriptor && r.verifiable_credential_path == credential
        })
    }

    /// The pair's verdict: the maximum severity across its log entries.
    pub fn verdict(&self, descriptor: usize, credential: usize) -> Status {
        self.entries(descriptor, credential).map(|r| r.status).max().unwrap_or_default()
    }

    /// Credential indices usable for each descriptor, in index order.
    pub fn candidates(&self) -> Vec<Vec<usize>> {
        (0..self.definition.input_descriptors.len())
            .map(|i| {
                (0..self.credentials.len())
                    .filter(|&j| self.verdict(i, j) < Status::Error)
                    .collect()
            })
            .collect()
    }

    /// Project the log into aggregated results.
    pub fn into_results(self) -> Result<EvaluationResults> {
        let candidates = self.candidates();
        let selection = select::resolve(self.definition, &candidates, |i, j| self.verdict(i, j));

        let mut status = selection.status;
        let mut errors: Vec<CheckResult> =
            self.results.iter().filter(|r| r.status == Status::Error).cloned().collect();
        let warnings =
            self.results.iter().filter(|r| r.status == Status::Warn).cloned().collect();
        errors.extend(select::requirement_errors(&selection.unsatisfied));

        let value = if status == Status::Error {
            None
        } else if let Some(submission) = &self.opts.presentation_submission {
            if self.opts.generate_presentation_submission {
                Some(
                    select::synthesize(
                        self.definition,
                        &selection.chosen,
                        &self.credentials,
                        self.opts,
                        false,
                    )
                    .0,
                )
            } else {
                // a supplied submission is evaluated against, not trusted
                match self.verify_submission(submission, &candidates) {
                    Ok(()) => Some(submission.clone()),
                    Err(message) => {
                        status = Status::Error;
                        errors.push(CheckResult {
                            input_descriptor_path: "$".to_string(),
                            verifiable_credential_path: "$".to_string(),
                            evaluator: "SubmissionRequirement",
                            status: Status::Error,
                            message,
                            payload: None,
                        });
                        None
                    }
                }
            }
        } else {
            Some(
                select::synthesize(
                    self.definition,
                    &selection.chosen,
                    &self.credentials,
                    self.opts,
                    false,
                )
                .0,
            )
        };

        Ok(EvaluationResults {
            value,
            warnings,
            errors,
            verifiable_credential: self.credentials.into_iter().map(|q| q.issued).collect(),
            are_required_credentials_present: status,
        })
    }

    // Check a supplied submission maps each descriptor to a credential the
    // evaluation found eligible.
    fn verify_submission(
        &self, submission: &PresentationSubmission, candidates: &[Vec<usize>],
    ) -> Result<(), String> {
        if submission.definition_id != self.definition.id {
            return Err(format!(
                "Submission definition_id ({}) does not match the definition",
                submission.definition_id
            ));
        }

        for entry in &submission.descriptor_map {
            let Some(i) =
                self.definition.input_descriptors.iter().position(|d| d.id == entry.id)
            else {
                return Err(format!("Submission references unknown descriptor ({})", entry.id));
            };
            let Some(j) = entry_credential_index(entry) else {
                return Err(format!("Submission path ({}) is not indexable", entry.path));
            };
            if !candidates[i].contains(&j) {
                return Err(format!(
                    "Submitted credential does not satisfy descriptor ({})",
                    entry.id
                ));
            }
        }

        Ok(())
    }
}

pub(crate) fn descriptor_path(index: usize) -> String {
    format!("$.input_descriptors[{index}]")
}

pub(crate) fn credential_path(index: usize) -> String {
    format!("$.verifiableCredential[{index}]")
}

pub(crate) fn descriptor_index(path: &str) -> Option<usize> {
    path.strip_prefix("$.input_descriptors[")?.strip_suffix(']')?.parse().ok()
}

// The credential index a descriptor map entry points at: the trailing
// index of its innermost path.
fn entry_credential_index(entry: &DescriptorMap) -> Option<usize> {
    let mut path = &entry.path;
    let mut nested = entry.path_nested.as_ref();
    while let Some(inner) = nested {
        path = &inner.path;
        nested = inner.path_nested.as_deref();
    }

    let start = path.rfind('[')?;
    path[start + 1..].strip_suffix(']')?.parse().ok()
}
