//! Claim format matching: when the definition (or a descriptor) carries a
//! `format` map, a candidate's envelope and algorithm or proof type must be
//! covered by the allow-list.

use std::collections::BTreeMap;

use crate::definition::FormatProfile;
use crate::error::Result;
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};
use crate::w3c_vc::queryable::{ClaimFormat, Queryable};

pub(crate) struct FormatEvaluation;

impl Handler for FormatEvaluation {
    fn name(&self) -> &'static str {
        "FormatEvaluation"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            // the descriptor's format map overrides the definition's
            let Some(formats) = descriptor.format.as_ref().or(definition.format.as_ref()) else {
                continue;
            };

            for j in 0..client.credentials.len() {
                match allowed(formats, &client.credentials[j]) {
                    Ok(()) => client.add(
                        i,
                        j,
                        self.name(),
                        Status::Info,
                        "Input candidate format is accepted by the descriptor",
                        None,
                    ),
                    Err(reason) => client.add(i, j, self.name(), Status::Error, reason, None),
                }
            }
        }

        Ok(())
    }
}

fn allowed(
    formats: &BTreeMap<String, FormatProfile>, queryable: &Queryable,
) -> Result<(), String> {
    let Some((key, profile)) = formats.iter().find(|(k, _)| queryable.format.matches(k.as_str()))
    else {
        return Err(format!(
            "Credential format ({}) is not accepted by the descriptor",
            queryable.format
        ));
    };

    match queryable.format {
        ClaimFormat::JwtVc => {
            if let Some(algs) = &profile.alg {
                let Some(alg) = &queryable.alg else {
                    return Err(format!("Credential has no algorithm for format ({key})"));
                };
                if !algs.contains(alg) {
                    return Err(format!(
                        "Credential algorithm ({alg}) is not accepted for format ({key})"
                    ));
                }
            }
        }
        ClaimFormat::LdpVc => {
            if let Some(proof_types) = &profile.proof_type {
                let types = queryable.vc.proof_types();
                if !types.iter().any(|t| proof_types.contains(t)) {
                    return Err(format!(
                        "Credential proof type is not accepted for format ({key})"
                    ));
                }
            }
        }
    }

    Ok(())
}
