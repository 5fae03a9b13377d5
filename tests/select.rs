//! Tests for credential selection and submission synthesis.

mod utils;

use credibil_pex::{
    Error, EvaluationOptions, Kind, PresentationDefinition, Status, presentation_submission_from,
    select_from, validate_definition,
};
use serde_json::{Value, json};

fn definition(value: Value) -> PresentationDefinition {
    serde_json::from_value(value).expect("should deserialize")
}

fn vc(subject: Value) -> Kind<Value> {
    Kind::Object(json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiableCredential"],
        "issuer": "did:example:issuer",
        "credentialSubject": subject
    }))
}

// One credential covering both descriptors beats two single-purpose ones.
#[test]
fn selects_minimal_credential_set() {
    utils::init_tracer();

    let definition = definition(json!({
        "id": "minimal-set",
        "input_descriptors": [
            {"id": "name", "constraints": {"fields": [{"path": ["$.credentialSubject.name"]}]}},
            {"id": "dob", "constraints": {"fields": [{"path": ["$.credentialSubject.birthDate"]}]}}
        ]
    }));
    let credentials = vec![
        vc(json!({"name": "Alice"})),
        vc(json!({"name": "Alice", "birthDate": "1990-05-17"})),
    ];

    let results = select_from(&definition, &credentials, &EvaluationOptions::default())
        .expect("should select");

    assert_eq!(results.are_required_credentials_present, Status::Info);
    assert_eq!(results.verifiable_credential.len(), 1);
    assert_eq!(results.verifiable_credential[0], credentials[1]);

    // both descriptors map to the single selected credential
    assert_eq!(results.matches.len(), 2);
    assert_eq!(results.matches[0].path, "$.verifiableCredential[0]");
    assert_eq!(results.matches[1].path, "$.verifiableCredential[0]");
}

#[test]
fn nested_requirements() {
    utils::init_tracer();

    let definition = definition(json!({
        "id": "nested",
        "submission_requirements": [{
            "rule": "pick",
            "count": 1,
            "from_nested": [
                {"rule": "all", "from": "citizenship"},
                {"rule": "all", "from": "residence"}
            ]
        }],
        "input_descriptors": [
            {
                "id": "passport",
                "group": ["citizenship"],
                "constraints": {"fields": [{"path": ["$.credentialSubject.passportNumber"]}]}
            },
            {
                "id": "utility-bill",
                "group": ["residence"],
                "constraints": {"fields": [{"path": ["$.credentialSubject.address"]}]}
            }
        ]
    }));

    // only the residence branch is satisfiable
    let credentials = vec![vc(json!({"address": "10 Main St"}))];
    let results = select_from(&definition, &credentials, &EvaluationOptions::default())
        .expect("should select");

    assert_eq!(results.are_required_credentials_present, Status::Info);
    assert_eq!(results.matches.len(), 1);
    assert_eq!(results.matches[0].id, "utility-bill");
}

#[test]
fn unsatisfied_requirement_is_named() {
    utils::init_tracer();

    let definition = definition(json!({
        "id": "unsatisfied",
        "submission_requirements": [
            {"rule": "all", "from": "A", "name": "employment proof"}
        ],
        "input_descriptors": [{
            "id": "employment",
            "group": ["A"],
            "constraints": {"fields": [{"path": ["$.credentialSubject.employeeId"]}]}
        }]
    }));

    let credentials = vec![vc(json!({"unrelated": true}))];
    let results = select_from(&definition, &credentials, &EvaluationOptions::default())
        .expect("should select");

    assert_eq!(results.are_required_credentials_present, Status::Error);
    assert!(results.verifiable_credential.is_empty());
    assert!(
        results
            .errors
            .iter()
            .any(|e| e.message.contains("employment proof"))
    );
}

#[test]
fn submission_from_selected_credentials() {
    utils::init_tracer();

    let definition = definition(json!({
        "id": "pre-selected",
        "input_descriptors": [
            {"id": "name", "constraints": {"fields": [{"path": ["$.credentialSubject.name"]}]}},
            {"id": "dob", "constraints": {"fields": [{"path": ["$.credentialSubject.birthDate"]}]}}
        ]
    }));
    let selected = vec![
        vc(json!({"name": "Alice"})),
        vc(json!({"birthDate": "1990-05-17"})),
    ];

    let submission =
        presentation_submission_from(&definition, &selected).expect("should synthesize");

    assert_eq!(submission.definition_id, "pre-selected");
    assert_eq!(submission.descriptor_map.len(), 2);

    // paths index the supplied credential list
    assert_eq!(submission.descriptor_map[0].id, "name");
    assert_eq!(submission.descriptor_map[0].path, "$.verifiableCredential[0]");
    assert_eq!(submission.descriptor_map[1].id, "dob");
    assert_eq!(submission.descriptor_map[1].path, "$.verifiableCredential[1]");

    // credentials that cannot satisfy the definition are an error
    let unrelated = vec![vc(json!({"unrelated": true}))];
    let err = presentation_submission_from(&definition, &unrelated)
        .expect_err("should fail to synthesize");
    assert!(matches!(err, Error::SubmissionFailure(_)));
}

// A requirement referencing an unused group fails validation and, at
// selection time, the requirement is reported unsatisfied.
#[test]
fn requirement_group_must_exist() {
    utils::init_tracer();

    let definition = definition(json!({
        "id": "bad-group",
        "submission_requirements": [{"rule": "all", "from": "B"}],
        "input_descriptors": [{
            "id": "employment",
            "group": ["A"],
            "constraints": {"fields": [{"path": ["$.credentialSubject.employeeId"]}]}
        }]
    }));

    assert!(!validate_definition(&definition).is_valid());

    let credentials = vec![vc(json!({"employeeId": "1234"}))];
    let results = select_from(&definition, &credentials, &EvaluationOptions::default())
        .expect("should select");
    assert_eq!(results.are_required_credentials_present, Status::Error);
}
