//! # Evaluation Handlers
//!
//! The ordered stages of the evaluation chain. Each handler reads the
//! results of prior stages from the client's log and appends its own.
//! The chain is data, not inheritance: order is fixed by [`chain`] and
//! observable through the evaluator names recorded in the log.

mod format;
mod input_filter;
mod limit_disclosure;
mod mark;
mod predicate;
mod restriction;
mod subject;
mod uri;

use crate::definition::Version;
use crate::error::Result;
use crate::evaluate::EvaluationClient;

/// One stage of the evaluation chain.
pub(crate) trait Handler {
    /// The evaluator name recorded in result entries.
    fn name(&self) -> &'static str;

    /// Run the stage, reading and appending to the client's result log.
    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()>;
}

/// Assemble the handler chain for a definition version.
pub(crate) fn chain(version: Version) -> Vec<Box<dyn Handler>> {
    let mut chain: Vec<Box<dyn Handler>> = vec![];

    if version == Version::V1 {
        chain.push(Box::new(uri::UriEvaluation));
    }
    chain.push(Box::new(format::FormatEvaluation));
    chain.push(Box::new(restriction::DidRestriction));
    chain.push(Box::new(restriction::FormatRestriction));
    chain.push(Box::new(subject::SubjectIsIssuer));
    chain.push(Box::new(subject::SameSubject));
    chain.push(Box::new(subject::IsHolder));
    chain.push(Box::new(input_filter::FilterEvaluation));
    chain.push(Box::new(predicate::PredicateRelatedField));
    chain.push(Box::new(limit_disclosure::LimitDisclosure));
    chain.push(Box::new(mark::MarkForSubmission));

    chain
}
