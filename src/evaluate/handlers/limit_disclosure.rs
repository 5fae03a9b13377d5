//! Limit disclosure: when a descriptor's constraints require (or prefer)
//! it and the credential's signature suite supports selective disclosure,
//! the credential is replaced with a projection containing only the claims
//! surfaced by the field constraints, plus the structurally mandatory
//! envelope properties.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::definition::Optionality;
use crate::error::{Error, Result};
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};
use crate::jsonpath::{self, Segment};
use crate::w3c_vc::queryable::Queryable;

// envelope properties every projection keeps
const MANDATORY: [&str; 9] = [
    "@context",
    "type",
    "id",
    "issuer",
    "issuanceDate",
    "expirationDate",
    "credentialSchema",
    "credentialStatus",
    "proof",
];

pub(crate) struct LimitDisclosure;

impl Handler for LimitDisclosure {
    fn name(&self) -> &'static str {
        "LimitDisclosure"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;

        // disclosed (path, value) pairs per credential, unioned across
        // descriptors in log order so predicate conversions win
        let mut disclosed: BTreeMap<usize, Vec<(String, Value)>> = BTreeMap::new();

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            let Some(directive) = descriptor.constraints.limit_disclosure else {
                continue;
            };

            for j in 0..client.credentials.len() {
                // a pair that already failed is not projected
                if client.verdict(i, j) >= Status::Error {
                    continue;
                }

                if !suite_supported(&client.credentials[j], &client.opts.limit_disclosure_signature_suites) {
                    match directive {
                        Optionality::Required => client.add(
                            i,
                            j,
                            self.name(),
                            Status::Error,
                            "Limit disclosure required but signature suite does not support it",
                            None,
                        ),
                        Optionality::Preferred => client.add(
                            i,
                            j,
                            self.name(),
                            Status::Warn,
                            "Limit disclosure preferred but signature suite does not support it",
                            None,
                        ),
                    }
                    continue;
                }

                let entries: Vec<(String, Value)> = client
                    .entries(i, j)
                    .filter(|r| {
                        matches!(r.evaluator, "FilterEvaluation" | "PredicateRelatedField")
                            && r.status == Status::Info
                    })
                    .filter_map(|r| {
                        let result = r.payload.as_ref()?.get("result")?;
                        let path = result.get("path")?.as_str()?.to_string();
                        Some((path, result.get("value")?.clone()))
                    })
                    .collect();

                let paths: Vec<&str> = entries.iter().map(|(p, _)| p.as_str()).collect();
                let payload = json!({"disclosed": paths});
                disclosed.entry(j).or_default().extend(entries);

                client.add(
                    i,
                    j,
                    self.name(),
                    Status::Info,
                    "Credential limited to disclosed claims",
                    Some(payload),
                );
            }
        }

        for (j, entries) in disclosed {
            let projected = project(&client.credentials[j].claims, &entries)?;
            client.credentials[j]
                .project(projected)
                .map_err(|e| Error::InvalidInput(e.to_string()))?;
        }

        Ok(())
    }
}

fn suite_supported(queryable: &Queryable, suites: &[String]) -> bool {
    queryable.vc.proof_types().iter().any(|t| suites.contains(t))
}

// Rebuild the credential from its mandatory envelope properties and the
// disclosed subject claims. Later entries override earlier ones at the
// same path, so predicate-converted values replace raw ones.
fn project(claims: &Value, entries: &[(String, Value)]) -> Result<Value> {
    let mut envelope = Map::new();
    if let Value::Object(map) = claims {
        for key in MANDATORY {
            if let Some(value) = map.get(key) {
                envelope.insert(key.to_string(), value.clone());
            }
        }
    }

    let mut projected = Value::Object(envelope);
    for (path, value) in entries {
        let segments = jsonpath::concrete(path).map_err(|e| Error::InvalidPath(e.to_string()))?;

        // only subject claims are projected; the envelope keeps its
        // mandatory properties regardless
        let Some(Segment::Name(first)) = segments.first() else {
            continue;
        };
        if first == "credentialSubject" {
            jsonpath::insert(&mut projected, &segments, value.clone());
        }
    }

    Ok(projected)
}
