//! URI/schema matching for v1 definitions: a candidate credential's
//! `@context`, `type`, and `credentialSchema` URIs must cover the
//! descriptor's `schema` list.

use serde_json::json;

use crate::error::Result;
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};
use crate::w3c_vc::queryable::Queryable;

pub(crate) struct UriEvaluation;

impl Handler for UriEvaluation {
    fn name(&self) -> &'static str {
        "UriEvaluation"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            let Some(schemas) = &descriptor.schema else {
                continue;
            };
            // an empty list (rejected by validation) constrains nothing
            if schemas.is_empty() {
                continue;
            }

            for j in 0..client.credentials.len() {
                let uris = credential_uris(&client.credentials[j]);

                let missing: Vec<&str> = schemas
                    .iter()
                    .filter(|s| s.required.unwrap_or_default() && !uris.contains(&s.uri))
                    .map(|s| s.uri.as_str())
                    .collect();
                let any_match = schemas.iter().any(|s| uris.contains(&s.uri));

                if missing.is_empty() && any_match {
                    client.add(
                        i,
                        j,
                        self.name(),
                        Status::Info,
                        "Input candidate matches the descriptor's schema URIs",
                        None,
                    );
                } else {
                    client.add(
                        i,
                        j,
                        self.name(),
                        Status::Error,
                        "Input candidate does not match the descriptor's schema URIs",
                        Some(json!({"missing": missing})),
                    );
                }
            }
        }

        Ok(())
    }
}

// URIs a credential can be matched on: context entries, types, and schema
// ids.
fn credential_uris(queryable: &Queryable) -> Vec<String> {
    let mut uris: Vec<String> = queryable
        .vc
        .context
        .iter()
        .filter_map(|c| c.as_string().map(ToString::to_string))
        .collect();

    uris.extend(queryable.vc.type_.iter().cloned());

    if let Some(schemas) = &queryable.vc.credential_schema {
        uris.extend(schemas.iter().map(|s| s.id.clone()));
    }

    uris
}
