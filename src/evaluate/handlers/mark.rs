//! The final stage: reduce each `(descriptor, credential)` pair's log
//! entries to a verdict and mark the usable pairs for submission.

use serde_json::json;

use crate::error::Result;
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};

pub(crate) struct MarkForSubmission;

impl Handler for MarkForSubmission {
    fn name(&self) -> &'static str {
        "MarkForSubmission"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;
        let mut eligible = vec![];

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            for j in 0..client.credentials.len() {
                if client.verdict(i, j) < Status::Error {
                    eligible.push((i, j, descriptor.group.clone()));
                }
            }
        }

        for (i, j, group) in eligible {
            client.add(
                i,
                j,
                self.name(),
                Status::Info,
                "Input candidate is eligible for submission",
                Some(json!({"group": group})),
            );
        }

        Ok(())
    }
}
