//! Predicate conversion: fields declaring a `predicate` reveal whether the
//! filter held rather than the underlying value. For `preferred`
//! predicates the payload value is irreversibly replaced with the boolean
//! `true`; the source credential is never touched.

use serde_json::{Value, json};

use crate::definition::Optionality;
use crate::error::Result;
use crate::evaluate::handlers::Handler;
use crate::evaluate::{CheckResult, EvaluationClient, Status, descriptor_index};

pub(crate) struct PredicateRelatedField;

impl Handler for PredicateRelatedField {
    fn name(&self) -> &'static str {
        "PredicateRelatedField"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;
        let mut converted = vec![];

        for result in &client.results {
            if result.evaluator != "FilterEvaluation" || result.status != Status::Info {
                continue;
            }
            let Some(payload) = &result.payload else {
                continue;
            };
            if payload.get("result").is_none() {
                continue;
            }

            // map the result back to its constraint field
            let Some(i) = descriptor_index(&result.input_descriptor_path) else {
                continue;
            };
            let Some(index) = payload.get("field").and_then(Value::as_u64) else {
                continue;
            };
            let field = definition.input_descriptors[i]
                .constraints
                .fields
                .as_ref()
                .and_then(|fields| fields.get(usize::try_from(index).unwrap_or(usize::MAX)));
            let Some(predicate) = field.and_then(|f| f.predicate) else {
                continue;
            };

            // `required` copies the payload as-is; `preferred` discloses
            // only that the predicate held
            let mut payload = payload.clone();
            if predicate == Optionality::Preferred {
                if let Some(value) = payload.pointer_mut("/result/value") {
                    *value = json!(true);
                }
            }

            converted.push(CheckResult {
                input_descriptor_path: result.input_descriptor_path.clone(),
                verifiable_credential_path: result.verifiable_credential_path.clone(),
                evaluator: self.name(),
                status: Status::Info,
                message: "Input candidate valid for presentation submission".to_string(),
                payload: Some(payload),
            });
        }

        client.results.extend(converted);
        Ok(())
    }
}
