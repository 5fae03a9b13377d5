//! # Selection & Submission Synthesis
//!
//! Given the per-pair verdicts produced by evaluation, compute the set of
//! credentials satisfying the definition's `submission_requirements` (or,
//! absent requirements, all input descriptors) and synthesize the
//! Presentation Submission descriptor map.
//!
//! The search is deterministic: descriptors are assigned in declaration
//! order, the number of distinct credentials is minimized, and ties are
//! broken by the lower credential index.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::core::Kind;
use crate::definition::{PresentationDefinition, Rule, SubmissionRequirement};
use crate::error::{Error, Result};
use crate::evaluate::{CheckResult, EvaluationClient, EvaluationOptions, Status};
use crate::submission::{DescriptorMap, PresentationSubmission};
use crate::w3c_vc::queryable::Queryable;

/// The outcome of selecting credentials to satisfy a definition.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SelectResults {
    /// The selected credentials, in the order the descriptor map references
    /// them, with limit-disclosure projections applied.
    pub verifiable_credential: Vec<Kind<Value>>,

    /// One entry per satisfied input descriptor, with paths into
    /// `verifiable_credential`.
    pub matches: Vec<DescriptorMap>,

    /// Preferred directives that were not honored.
    pub warnings: Vec<CheckResult>,

    /// Required constraints that were not satisfied.
    pub errors: Vec<CheckResult>,

    /// Overall verdict for the selection.
    pub are_required_credentials_present: Status,
}

/// Select the minimal set of credentials satisfying the definition.
///
/// # Errors
///
/// Returns an error if a credential cannot be decoded or the definition
/// carries an unparseable JSONPath expression.
#[instrument(level = "debug", skip_all)]
pub fn select_from(
    definition: &PresentationDefinition, credentials: &[Kind<Value>], opts: &EvaluationOptions,
) -> Result<SelectResults> {
    tracing::debug!("select_from");

    let (client, selection) = evaluate_and_resolve(definition, credentials, opts)?;
    let (submission, order) = synthesize(definition, &selection.chosen, &client.credentials, opts, true);

    let mut errors: Vec<CheckResult> =
        client.results.iter().filter(|r| r.status == Status::Error).cloned().collect();
    errors.extend(requirement_errors(&selection.unsatisfied));
    let warnings =
        client.results.iter().filter(|r| r.status == Status::Warn).cloned().collect();

    Ok(SelectResults {
        verifiable_credential: order
            .iter()
            .map(|&j| client.credentials[j].issued.clone())
            .collect(),
        matches: submission.descriptor_map,
        warnings,
        errors,
        are_required_credentials_present: selection.status,
    })
}

/// Synthesize a Presentation Submission for credentials the caller has
/// already selected. Descriptor map paths index the supplied credential
/// list.
///
/// # Errors
///
/// Returns an error if the selected credentials do not satisfy the
/// definition, naming the unsatisfied requirement.
#[instrument(level = "debug", skip_all)]
pub fn presentation_submission_from(
    definition: &PresentationDefinition, credentials: &[Kind<Value>],
) -> Result<PresentationSubmission> {
    tracing::debug!("presentation_submission_from");

    let opts = EvaluationOptions::default();
    let (client, selection) = evaluate_and_resolve(definition, credentials, &opts)?;

    if selection.status == Status::Error {
        return Err(Error::SubmissionFailure(selection.unsatisfied.join(", ")));
    }

    Ok(synthesize(definition, &selection.chosen, &client.credentials, &opts, false).0)
}

/// A resolved selection: which `(descriptor, credential)` pairs to submit,
/// and whether the definition's requirements can be met.
pub(crate) struct Selection {
    /// Overall verdict for the selection.
    pub status: Status,

    /// Chosen `(descriptor index, credential index)` pairs, descriptors in
    /// declaration order.
    pub chosen: Vec<(usize, usize)>,

    /// Names of requirements (or ids of descriptors) that cannot be
    /// satisfied.
    pub unsatisfied: Vec<String>,
}

/// Wrap and evaluate credentials, then resolve the selection.
pub(crate) fn evaluate_and_resolve<'a>(
    definition: &'a PresentationDefinition, credentials: &[Kind<Value>],
    opts: &'a EvaluationOptions,
) -> Result<(EvaluationClient<'a>, Selection)> {
    let queryables = credentials
        .iter()
        .map(Queryable::from_issued)
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| Error::InvalidInput(e.to_string()))?;

    let mut client = EvaluationClient::new(definition, opts, queryables);
    client.evaluate()?;

    let candidates = client.candidates();
    let selection = resolve(definition, &candidates, |i, j| client.verdict(i, j));

    Ok((client, selection))
}

/// Resolve the definition's requirements against the candidate pairs.
/// `candidates` holds, per descriptor, the usable credential indices in
/// index order; `verdict` reports the pair severity used to degrade the
/// overall status to `Warn`.
pub(crate) fn resolve(
    definition: &PresentationDefinition, candidates: &[Vec<usize>],
    verdict: impl Fn(usize, usize) -> Status,
) -> Selection {
    let mut unsatisfied = vec![];

    let targets: Vec<usize> = if let Some(requirements) = &definition.submission_requirements {
        let mut targets = BTreeSet::new();
        for requirement in requirements {
            match resolve_requirement(requirement, definition, candidates) {
                Ok(descriptors) => targets.extend(descriptors),
                Err(name) => unsatisfied.push(name),
            }
        }
        targets.into_iter().collect()
    } else {
        // absent requirements, every descriptor must be satisfied
        let mut targets = vec![];
        for (i, descriptor) in definition.input_descriptors.iter().enumerate() {
            if candidates[i].is_empty() {
                unsatisfied.push(descriptor.id.clone());
            } else {
                targets.push(i);
            }
        }
        targets
    };

    let chosen = assign(&targets, candidates);

    let status = if unsatisfied.is_empty() {
        chosen.iter().map(|&(i, j)| verdict(i, j)).max().unwrap_or_default()
    } else {
        Status::Error
    };

    Selection {
        status,
        chosen,
        unsatisfied,
    }
}

// Resolve one requirement to the descriptor indices it selects, or the
// requirement's name when it cannot be satisfied.
fn resolve_requirement(
    requirement: &SubmissionRequirement, definition: &PresentationDefinition,
    candidates: &[Vec<usize>],
) -> Result<Vec<usize>, String> {
    let name = requirement
        .name
        .clone()
        .or_else(|| requirement.from.clone())
        .unwrap_or_else(|| "submission requirement".to_string());

    if let Some(group) = &requirement.from {
        let members: Vec<usize> = definition
            .input_descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.group.as_ref().is_some_and(|g| g.contains(group)))
            .map(|(i, _)| i)
            .collect();
        let satisfiable: Vec<usize> =
            members.iter().copied().filter(|&i| !candidates[i].is_empty()).collect();

        match requirement.rule {
            Rule::All => {
                if members.is_empty() || satisfiable.len() < members.len() {
                    Err(name)
                } else {
                    Ok(members)
                }
            }
            Rule::Pick => pick(requirement, satisfiable).ok_or(name),
        }
    } else if let Some(nested) = &requirement.from_nested {
        let outcomes: Vec<_> = nested
            .iter()
            .map(|n| resolve_requirement(n, definition, candidates))
            .collect();

        match requirement.rule {
            Rule::All => {
                let mut descriptors = vec![];
                for outcome in outcomes {
                    match outcome {
                        Ok(selected) => descriptors.extend(selected),
                        Err(_) => return Err(name),
                    }
                }
                Ok(descriptors)
            }
            Rule::Pick => {
                let satisfied: Vec<Vec<usize>> = outcomes.into_iter().flatten().collect();
                pick(requirement, satisfied).map(|s| s.into_iter().flatten().collect()).ok_or(name)
            }
        }
    } else {
        Err(name)
    }
}

// Apply a pick rule's cardinality: take the lowest-indexed satisfiable
// inputs up to `max` (with `count` as `min = max = count` shorthand), and
// fail below `min`.
fn pick<T>(requirement: &SubmissionRequirement, satisfiable: Vec<T>) -> Option<Vec<T>> {
    let min_needed = requirement.count.or(requirement.min).unwrap_or(1);
    let max_take = requirement.count.or(requirement.max).unwrap_or(satisfiable.len());
    let take = satisfiable.len().min(max_take);

    if take < min_needed {
        return None;
    }

    let mut satisfiable = satisfiable;
    satisfiable.truncate(take);
    Some(satisfiable)
}

// Deterministic backtracking over the target descriptors in declaration
// order: minimize the number of distinct credentials, ties broken by the
// lower credential index.
fn assign(targets: &[usize], candidates: &[Vec<usize>]) -> Vec<(usize, usize)> {
    let mut picks = Vec::with_capacity(targets.len());
    let mut used = BTreeSet::new();
    let mut best: Option<(usize, Vec<usize>)> = None;

    search(0, targets, candidates, &mut picks, &mut used, &mut best);

    best.map(|(_, picks)| targets.iter().copied().zip(picks).collect()).unwrap_or_default()
}

fn search(
    position: usize, targets: &[usize], candidates: &[Vec<usize>], picks: &mut Vec<usize>,
    used: &mut BTreeSet<usize>, best: &mut Option<(usize, Vec<usize>)>,
) {
    if let Some((distinct, _)) = best {
        if used.len() > *distinct {
            return;
        }
    }

    if position == targets.len() {
        let better = match best {
            None => true,
            Some((distinct, picks_so_far)) => {
                (used.len(), picks.as_slice()) < (*distinct, picks_so_far.as_slice())
            }
        };
        if better {
            *best = Some((used.len(), picks.clone()));
        }
        return;
    }

    for &j in &candidates[targets[position]] {
        let inserted = used.insert(j);
        picks.push(j);
        search(position + 1, targets, candidates, picks, used, best);
        picks.pop();
        if inserted {
            used.remove(&j);
        }
    }
}

/// Synthesize a submission for the chosen pairs. When `remap` is set,
/// descriptor map paths index the returned credential order (for building
/// presentations); otherwise they index the original credential list.
/// Returns the submission and the distinct credential indices in
/// first-reference order.
pub(crate) fn synthesize(
    definition: &PresentationDefinition, chosen: &[(usize, usize)], credentials: &[Queryable],
    opts: &EvaluationOptions, remap: bool,
) -> (PresentationSubmission, Vec<usize>) {
    let mut order: Vec<usize> = vec![];
    let mut descriptor_map = vec![];

    for &(i, j) in chosen {
        let position = order.iter().position(|&seen| seen == j).unwrap_or_else(|| {
            order.push(j);
            order.len() - 1
        });
        let k = if remap { position } else { j };

        descriptor_map.push(DescriptorMap {
            id: definition.input_descriptors[i].id.clone(),
            format: credentials[j].format.designation().to_string(),
            path: format!("$.verifiableCredential[{k}]"),
            path_nested: None,
        });
    }

    let submission = PresentationSubmission {
        id: opts.submission_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        definition_id: definition.id.clone(),
        descriptor_map,
    };

    (submission, order)
}

/// Log-shaped entries for requirements that cannot be satisfied.
pub(crate) fn requirement_errors(unsatisfied: &[String]) -> Vec<CheckResult> {
    unsatisfied
        .iter()
        .map(|name| CheckResult {
            input_descriptor_path: "$".to_string(),
            verifiable_credential_path: "$".to_string(),
            evaluator: "SubmissionRequirement",
            status: Status::Error,
            message: format!("Submission requirement ({name}) is not satisfied"),
            payload: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(value: serde_json::Value) -> SubmissionRequirement {
        serde_json::from_value(value).expect("should deserialize")
    }

    #[test]
    fn assign_minimizes_distinct_credentials() {
        // descriptor 0 could use credential 1, descriptor 1 only credential 1:
        // one credential covers both
        let candidates = vec![vec![0, 1], vec![1]];
        let chosen = assign(&[0, 1], &candidates);
        assert_eq!(chosen, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn assign_breaks_ties_by_lower_index() {
        let candidates = vec![vec![0, 1], vec![0, 1]];
        let chosen = assign(&[0, 1], &candidates);
        assert_eq!(chosen, vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn pick_takes_up_to_max() {
        let req = requirement(serde_json::json!({"rule": "pick", "from": "A", "min": 2, "max": 3}));
        assert_eq!(pick(&req, vec![0, 1, 2, 3]), Some(vec![0, 1, 2]));
        assert_eq!(pick(&req, vec![0, 1]), Some(vec![0, 1]));
        assert_eq!(pick(&req, vec![0]), None);
    }

    #[test]
    fn pick_count_is_exact() {
        let req = requirement(serde_json::json!({"rule": "pick", "from": "A", "count": 2}));
        assert_eq!(pick(&req, vec![0, 1, 2]), Some(vec![0, 1]));
        assert_eq!(pick(&req, vec![0]), None);
    }
}
