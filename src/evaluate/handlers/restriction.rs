//! Caller-imposed restrictions: issuer DID methods and claim formats the
//! wallet is willing to present, applied on top of whatever the definition
//! allows.

use crate::error::Result;
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};

pub(crate) struct DidRestriction;

impl Handler for DidRestriction {
    fn name(&self) -> &'static str {
        "DidRestriction"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let Some(methods) = &client.opts.restrict_to_did_methods else {
            return Ok(());
        };

        // the restriction is per credential; results are logged per pair
        let rejections: Vec<Option<String>> = client
            .credentials
            .iter()
            .map(|queryable| {
                let issuer = queryable.vc.issuer_id();
                match issuer.strip_prefix("did:").and_then(|rest| rest.split(':').next()) {
                    Some(method) if methods.iter().any(|m| m == method) => None,
                    Some(method) => {
                        Some(format!("Credential issuer DID method ({method}) is not allowed"))
                    }
                    None => Some("Credential issuer is not a DID".to_string()),
                }
            })
            .collect();

        for i in 0..client.definition.input_descriptors.len() {
            for (j, rejection) in rejections.iter().enumerate() {
                match rejection {
                    None => client.add(
                        i,
                        j,
                        self.name(),
                        Status::Info,
                        "Credential issuer DID method is allowed",
                        None,
                    ),
                    Some(reason) => {
                        client.add(i, j, self.name(), Status::Error, reason.clone(), None);
                    }
                }
            }
        }

        Ok(())
    }
}

pub(crate) struct FormatRestriction;

impl Handler for FormatRestriction {
    fn name(&self) -> &'static str {
        "FormatRestriction"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let Some(formats) = &client.opts.restrict_to_formats else {
            return Ok(());
        };

        let rejections: Vec<Option<String>> = client
            .credentials
            .iter()
            .map(|queryable| {
                let format = queryable.format;
                if formats.iter().any(|f| format.matches(f)) {
                    None
                } else {
                    Some(format!(
                        "Credential format ({format}) is excluded by caller restrictions"
                    ))
                }
            })
            .collect();

        for i in 0..client.definition.input_descriptors.len() {
            for (j, rejection) in rejections.iter().enumerate() {
                match rejection {
                    None => client.add(
                        i,
                        j,
                        self.name(),
                        Status::Info,
                        "Credential format is allowed by caller restrictions",
                        None,
                    ),
                    Some(reason) => {
                        client.add(i, j, self.name(), Status::Error, reason.clone(), None);
                    }
                }
            }
        }

        Ok(())
    }
}
