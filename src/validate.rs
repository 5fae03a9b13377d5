//! # Validation
//!
//! Structural validation of Presentation Definitions and Presentation
//! Submissions, run before evaluation. Validation never panics: every
//! problem found is reported as a check in the returned report.

use std::collections::HashSet;

use serde::Serialize;
use serde_json_path::JsonPath;
use tracing::instrument;

use crate::definition::{PresentationDefinition, Rule, SubmissionRequirement};
use crate::evaluate::Status;
use crate::submission::PresentationSubmission;

/// The outcome of validating a document.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ValidationReport {
    /// The checks performed, with a single `root` entry when all passed.
    pub checks: Vec<Check>,
}

impl ValidationReport {
    /// Whether the document passed validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(|c| c.status < Status::Error)
    }

    fn from_problems(problems: Vec<Check>) -> Self {
        if problems.is_empty() {
            return Self {
                checks: vec![Check {
                    tag: "root".to_string(),
                    status: Status::Info,
                    message: "ok".to_string(),
                }],
            };
        }
        Self { checks: problems }
    }
}

/// One validation check.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Check {
    /// Locates the checked element, e.g. `input_descriptors[2]`.
    pub tag: String,

    /// Severity of the finding.
    pub status: Status,

    /// What was found.
    pub message: String,
}

fn error(tag: impl Into<String>, message: impl Into<String>) -> Check {
    Check {
        tag: tag.into(),
        status: Status::Error,
        message: message.into(),
    }
}

/// Validate a Presentation Definition before evaluation.
#[instrument(level = "debug", skip_all)]
#[must_use]
pub fn validate_definition(definition: &PresentationDefinition) -> ValidationReport {
    let mut problems = vec![];

    if definition.id.is_empty() {
        problems.push(error("root", "definition id must not be empty"));
    }
    if definition.input_descriptors.is_empty() {
        problems.push(error("input_descriptors", "at least one input descriptor is required"));
    }

    let mut ids = HashSet::new();
    let mut groups = HashSet::new();

    for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
        let tag = format!("input_descriptors[{i}]");

        if descriptor.id.is_empty() {
            problems.push(error(&tag, "descriptor id must not be empty"));
        }
        if !ids.insert(descriptor.id.clone()) {
            problems.push(error(&tag, format!("duplicate descriptor id ({})", descriptor.id)));
        }
        groups.extend(descriptor.group.clone().unwrap_or_default());

        for field in descriptor.constraints.fields.as_deref().unwrap_or_default() {
            if field.path.is_empty() {
                problems.push(error(&tag, "field requires at least one path expression"));
            }
            for path in &field.path {
                if JsonPath::parse(path).is_err() {
                    problems.push(error(&tag, format!("invalid JSONPath expression ({path})")));
                }
            }
            if field.predicate.is_some() && field.filter.is_none() {
                problems.push(error(&tag, "predicate requires a filter"));
            }
        }

        if let Some(schemas) = &descriptor.schema {
            if schemas.is_empty() {
                problems.push(error(&tag, "schema requires at least one entry"));
            }
            for schema in schemas {
                if schema.uri.is_empty() {
                    problems.push(error(&tag, "schema uri must not be empty"));
                }
            }
        }
    }

    for (i, requirement) in
        definition.submission_requirements.as_deref().unwrap_or_default().iter().enumerate()
    {
        validate_requirement(
            requirement,
            &groups,
            &format!("submission_requirements[{i}]"),
            &mut problems,
        );
    }

    ValidationReport::from_problems(problems)
}

fn validate_requirement(
    requirement: &SubmissionRequirement, groups: &HashSet<String>, tag: &str,
    problems: &mut Vec<Check>,
) {
    match (&requirement.from, &requirement.from_nested) {
        (Some(group), None) => {
            if !groups.contains(group) {
                problems.push(error(tag, format!("group ({group}) is not used by any descriptor")));
            }
        }
        (None, Some(nested)) => {
            for (i, inner) in nested.iter().enumerate() {
                validate_requirement(inner, groups, &format!("{tag}.from_nested[{i}]"), problems);
            }
        }
        _ => {
            problems.push(error(tag, "requirement must have either from or from_nested"));
        }
    }

    if requirement.rule == Rule::Pick {
        if let (Some(min), Some(max)) = (requirement.min, requirement.max) {
            if min > max {
                problems.push(error(tag, format!("pick min ({min}) exceeds max ({max})")));
            }
        }
        if requirement.count == Some(0) {
            problems.push(error(tag, "pick count must be at least 1"));
        }
    }
}

/// Validate a Presentation Submission.
#[instrument(level = "debug", skip_all)]
#[must_use]
pub fn validate_submission(submission: &PresentationSubmission) -> ValidationReport {
    let mut problems = vec![];

    if submission.id.is_empty() {
        problems.push(error("root", "submission id must not be empty"));
    }
    if submission.definition_id.is_empty() {
        problems.push(error("root", "definition_id must not be empty"));
    }

    let mut ids = HashSet::new();
    for (i, entry) in submission.descriptor_map.iter().enumerate() {
        let tag = format!("descriptor_map[{i}]");

        if entry.id.is_empty() {
            problems.push(error(&tag, "descriptor id must not be empty"));
        }
        if !ids.insert(entry.id.clone()) {
            problems.push(error(&tag, format!("duplicate descriptor id ({})", entry.id)));
        }
        if JsonPath::parse(&entry.path).is_err() {
            problems.push(error(&tag, format!("invalid JSONPath expression ({})", entry.path)));
        }

        let mut nested = entry.path_nested.as_ref();
        while let Some(inner) = nested {
            if JsonPath::parse(&inner.path).is_err() {
                problems.push(error(&tag, format!("invalid JSONPath expression ({})", inner.path)));
            }
            nested = inner.path_nested.as_deref();
        }
    }

    ValidationReport::from_problems(problems)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn valid_definition() {
        let definition: PresentationDefinition = serde_json::from_value(json!({
            "id": "pd-1",
            "input_descriptors": [{
                "id": "employment",
                "group": ["A"],
                "constraints": {
                    "fields": [{
                        "path": ["$.credentialSubject.employeeId"],
                        "filter": {"type": "string"},
                        "predicate": "preferred"
                    }]
                }
            }],
            "submission_requirements": [{"rule": "all", "from": "A"}]
        }))
        .expect("should deserialize");

        let report = validate_definition(&definition);
        assert!(report.is_valid());
        assert_eq!(report.checks[0].tag, "root");
    }

    #[test]
    fn definition_problems() {
        let definition: PresentationDefinition = serde_json::from_value(json!({
            "id": "pd-2",
            "input_descriptors": [
                {"id": "a", "constraints": {"fields": [{"path": ["$["], "predicate": "required"}]}},
                {"id": "a", "schema": [], "constraints": {}}
            ],
            "submission_requirements": [{"rule": "pick", "from": "missing", "min": 3, "max": 2}]
        }))
        .expect("should deserialize");

        let report = validate_definition(&definition);
        assert!(!report.is_valid());

        let messages: Vec<&str> = report.checks.iter().map(|c| c.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("invalid JSONPath")));
        assert!(messages.iter().any(|m| m.contains("predicate requires a filter")));
        assert!(messages.iter().any(|m| m.contains("duplicate descriptor id")));
        assert!(messages.iter().any(|m| m.contains("not used by any descriptor")));
        assert!(messages.iter().any(|m| m.contains("exceeds max")));
        assert!(messages.iter().any(|m| m.contains("schema requires at least one entry")));
    }

    #[test]
    fn submission_problems() {
        let submission: PresentationSubmission = serde_json::from_value(json!({
            "id": "",
            "definition_id": "pd-1",
            "descriptor_map": [{"id": "a", "format": "ldp_vc", "path": "not-a-path"}]
        }))
        .expect("should deserialize");

        let report = validate_submission(&submission);
        assert!(!report.is_valid());
    }
}
