//! Field constraint matching: for each `(descriptor, credential)` pair,
//! each constraint field tries its JSONPath expressions in order, and the
//! first value found is checked against the field's filter. Later stages
//! (predicate conversion, limit disclosure) key off this handler's results.

use serde_json::{Value, json};

use crate::definition::Field;
use crate::error::{Error, Result};
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};
use crate::jsonpath;

pub(crate) struct FilterEvaluation;

impl Handler for FilterEvaluation {
    fn name(&self) -> &'static str {
        "FilterEvaluation"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            let fields = descriptor.constraints.fields.as_deref().unwrap_or_default();

            if fields.is_empty() {
                // no constraint fields: the descriptor is trivially satisfied
                for j in 0..client.credentials.len() {
                    client.add(
                        i,
                        j,
                        self.name(),
                        Status::Info,
                        "Input descriptor has no constraint fields",
                        None,
                    );
                }
                continue;
            }

            for j in 0..client.credentials.len() {
                for (index, field) in fields.iter().enumerate() {
                    let outcome = evaluate_field(field, &client.credentials[j].claims)?;

                    match outcome {
                        Outcome::Match { path, value } => client.add(
                            i,
                            j,
                            self.name(),
                            Status::Info,
                            "Input candidate valid for presentation submission",
                            Some(json!({
                                "result": {"path": path, "value": value},
                                "valid": true,
                                "field": index
                            })),
                        ),
                        Outcome::FilterMiss { path, value } => client.add(
                            i,
                            j,
                            self.name(),
                            Status::Error,
                            format!("Input candidate failed filter evaluation: {path}"),
                            Some(json!({
                                "result": {"path": path, "value": value},
                                "valid": false,
                                "field": index
                            })),
                        ),
                        Outcome::NotFound => {
                            if field.optional.unwrap_or_default() {
                                client.add(
                                    i,
                                    j,
                                    self.name(),
                                    Status::Info,
                                    "Input candidate does not contain optional property",
                                    Some(json!({"valid": true, "field": index})),
                                );
                            } else {
                                client.add(
                                    i,
                                    j,
                                    self.name(),
                                    Status::Error,
                                    "Input candidate does not contain property",
                                    Some(json!({"valid": false, "field": index})),
                                );
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

enum Outcome {
    /// A value was found and satisfied the filter (or there was none).
    Match { path: String, value: Value },

    /// A value was found but failed the filter.
    FilterMiss { path: String, value: Value },

    /// No path expression selected a value.
    NotFound,
}

// Try each of the field's JSONPath expressions until one selects at least
// one value, then check the first value against the filter.
fn evaluate_field(field: &Field, claims: &Value) -> Result<Outcome> {
    for expr in &field.path {
        let hits =
            jsonpath::extract(claims, expr).map_err(|e| Error::InvalidPath(e.to_string()))?;
        let Some(first) = hits.into_iter().next() else {
            continue;
        };

        let Some(filter) = &field.filter else {
            return Ok(Outcome::Match {
                path: first.path,
                value: first.value,
            });
        };

        let result = filter.evaluate(&first.value);
        return Ok(if result.matched {
            Outcome::Match {
                path: first.path,
                value: result.value,
            }
        } else {
            Outcome::FilterMiss {
                path: first.path,
                value: result.value,
            }
        });
    }

    Ok(Outcome::NotFound)
}
