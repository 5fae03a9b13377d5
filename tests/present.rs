//! Tests for presentation building: submission placement, signing, and
//! evaluating a returned presentation.

mod utils;

use credibil_pex::{
    EvaluationOptions, Kind, OneMany, PresentationDefinition, PresentationSubmissionLocation,
    Status, evaluate_presentation, jsonpath, presentation_from, verifiable_presentation_from,
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

fn employment_definition() -> PresentationDefinition {
    definition(json!({
        "id": "employment-check",
        "input_descriptors": [{
            "id": "employment",
            "constraints": {"fields": [{"path": ["$.credentialSubject.employeeId"]}]}
        }]
    }))
}

#[test]
fn embedded_submission() {
    utils::init_tracer();

    let definition = employment_definition();
    let credentials = vec![vc(json!({"employeeId": "1234567890"}))];

    let opts = EvaluationOptions {
        holder_dids: vec!["did:example:holder".to_string()],
        ..EvaluationOptions::default()
    };
    let result = presentation_from(&definition, &credentials, &opts).expect("should build");

    let vp_json = serde_json::to_value(&result.presentation).expect("should serialize");

    assert_eq!(
        vp_json["@context"],
        json!([
            "https://www.w3.org/2018/credentials/v1",
            "https://identity.foundation/presentation-exchange/submission/v1"
        ])
    );
    assert_eq!(vp_json["type"], json!(["VerifiablePresentation", "PresentationSubmission"]));
    assert_eq!(vp_json["holder"], json!("did:example:holder"));

    // every descriptor map path resolves to a credential in the
    // presentation
    let submission = &result.presentation_submission;
    assert_eq!(vp_json["presentation_submission"]["id"], json!(submission.id));
    for entry in &submission.descriptor_map {
        let hits = jsonpath::extract(&vp_json, &entry.path).expect("path should parse");
        assert_eq!(hits.len(), 1);
        assert_eq!(Kind::Object(hits[0].value.clone()), credentials[0]);
    }
}

#[test]
fn external_submission() {
    utils::init_tracer();

    let definition = employment_definition();
    let credentials = vec![vc(json!({"employeeId": "1234567890"}))];

    let opts = EvaluationOptions {
        presentation_submission_location: PresentationSubmissionLocation::External,
        ..EvaluationOptions::default()
    };
    let result = presentation_from(&definition, &credentials, &opts).expect("should build");

    // the submission travels alongside the presentation, not inside it
    assert!(result.presentation.presentation_submission.is_none());
    assert_eq!(
        result.presentation.type_,
        OneMany::One("VerifiablePresentation".to_string())
    );
    assert_eq!(result.presentation_submission.descriptor_map.len(), 1);
}

#[tokio::test]
async fn signed_presentation() {
    utils::init_tracer();

    let definition = employment_definition();
    let credentials = vec![vc(json!({"employeeId": "1234567890"}))];

    // evaluation completes before the signing callback runs; its result is
    // embedded verbatim
    let result = verifiable_presentation_from(
        &definition,
        &credentials,
        |vp| async move {
            assert!(vp.presentation_submission.is_some());
            Ok(Kind::String("header.payload.signature".to_string()))
        },
        &EvaluationOptions::default(),
    )
    .await
    .expect("should build and sign");

    assert_eq!(
        result.verifiable_presentation,
        Kind::String("header.payload.signature".to_string())
    );
    assert_eq!(result.presentation_submission.descriptor_map[0].id, "employment");
}

#[test]
fn evaluate_returned_presentation() {
    utils::init_tracer();

    let definition = employment_definition();
    let credentials = vec![vc(json!({"employeeId": "1234567890"}))];

    let result =
        presentation_from(&definition, &credentials, &EvaluationOptions::default())
            .expect("should build");
    let vp_json = serde_json::to_value(&result.presentation).expect("should serialize");

    // the embedded submission is evaluated against, not regenerated
    let results = evaluate_presentation(
        &definition,
        &Kind::Object(vp_json.clone()),
        &EvaluationOptions::default(),
    )
    .expect("should evaluate");

    assert_eq!(results.are_required_credentials_present, Status::Info);
    assert_eq!(results.value, Some(result.presentation_submission));

    // forcing regeneration produces a fresh submission id
    let opts = EvaluationOptions {
        generate_presentation_submission: true,
        submission_id: Some("regenerated".to_string()),
        ..EvaluationOptions::default()
    };
    let results =
        evaluate_presentation(&definition, &Kind::Object(vp_json), &opts).expect("should evaluate");
    assert_eq!(results.value.expect("should have a submission").id, "regenerated");
}
