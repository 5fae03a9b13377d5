//! Subject binding checks: self-issued credentials (`subject_is_issuer`),
//! holder binding (`is_holder`), and cross-credential subject consistency
//! (`same_subject`).

use std::collections::BTreeSet;

use serde_json::json;

use crate::definition::Optionality;
use crate::error::{Error, Result};
use crate::evaluate::handlers::Handler;
use crate::evaluate::{EvaluationClient, Status};
use crate::jsonpath;

pub(crate) struct SubjectIsIssuer;

impl Handler for SubjectIsIssuer {
    fn name(&self) -> &'static str {
        "SubjectIsIssuer"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            let Some(directive) = descriptor.constraints.subject_is_issuer else {
                continue;
            };

            for j in 0..client.credentials.len() {
                let vc = &client.credentials[j].vc;
                let issuer = vc.issuer_id().to_string();
                let subjects = vc.subject_ids();

                if !subjects.is_empty() && subjects.iter().all(|s| *s == issuer) {
                    client.add(
                        i,
                        j,
                        self.name(),
                        Status::Info,
                        "Credential subject is the credential issuer",
                        None,
                    );
                } else {
                    let status = match directive {
                        Optionality::Required => Status::Error,
                        Optionality::Preferred => Status::Warn,
                    };
                    client.add(
                        i,
                        j,
                        self.name(),
                        status,
                        "Credential subject is not the credential issuer",
                        None,
                    );
                }
            }
        }

        Ok(())
    }
}

pub(crate) struct IsHolder;

impl Handler for IsHolder {
    fn name(&self) -> &'static str {
        "IsHolder"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;
        let holder_dids = client.opts.holder_dids.clone();

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            let Some(holder_subjects) = &descriptor.constraints.is_holder else {
                continue;
            };

            for j in 0..client.credentials.len() {
                let subjects = client.credentials[j].vc.subject_ids();

                for holder_subject in holder_subjects {
                    let held = !subjects.is_empty()
                        && subjects.iter().all(|s| holder_dids.contains(s));
                    let payload = json!({"field_id": holder_subject.field_id});

                    if held {
                        client.add(
                            i,
                            j,
                            self.name(),
                            Status::Info,
                            "Credential subject is controlled by the holder",
                            Some(payload),
                        );
                    } else {
                        let status = match holder_subject.directive {
                            Optionality::Required => Status::Error,
                            Optionality::Preferred => Status::Warn,
                        };
                        client.add(
                            i,
                            j,
                            self.name(),
                            status,
                            "Credential subject is not controlled by the holder",
                            Some(payload),
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

pub(crate) struct SameSubject;

impl Handler for SameSubject {
    fn name(&self) -> &'static str {
        "SameSubject"
    }

    fn handle(&self, client: &mut EvaluationClient<'_>) -> Result<()> {
        let definition = client.definition;

        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            let Some(same_subjects) = &descriptor.constraints.same_subject else {
                continue;
            };

            for same_subject in same_subjects {
                // credentials carrying every referenced field, and the
                // subject ids they resolve to
                let mut holders = vec![];
                let mut subjects = BTreeSet::new();

                for (j, queryable) in client.credentials.iter().enumerate() {
                    let mut carries_all = !same_subject.field_id.is_empty();

                    for field_id in &same_subject.field_id {
                        let Some(field) = definition.field(field_id) else {
                            carries_all = false;
                            break;
                        };

                        let mut found = false;
                        for expr in &field.path {
                            let hits = jsonpath::extract(&queryable.claims, expr)
                                .map_err(|e| Error::InvalidPath(e.to_string()))?;
                            if !hits.is_empty() {
                                found = true;
                                break;
                            }
                        }
                        if !found {
                            carries_all = false;
                            break;
                        }
                    }

                    if carries_all {
                        holders.push(j);
                        subjects.extend(queryable.vc.subject_ids());
                    }
                }

                let consistent = subjects.len() <= 1;
                let payload = json!({"field_id": same_subject.field_id});

                for j in holders {
                    if consistent {
                        client.add(
                            i,
                            j,
                            self.name(),
                            Status::Info,
                            "Credentials share a single subject",
                            Some(payload.clone()),
                        );
                    } else {
                        let status = match same_subject.directive {
                            Optionality::Required => Status::Error,
                            Optionality::Preferred => Status::Warn,
                        };
                        client.add(
                            i,
                            j,
                            self.name(),
                            status,
                            "Credentials do not share a single subject",
                            Some(payload.clone()),
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
