//! Integration tests for the enrollment flows

use serde_json::json;

mod common;
use common::TestApp;

#[tokio::test]
async fn test_full_merchant_registration() {
    let app = TestApp::new().await;

    let (status, body) = app.request("POST", "/enroll/merchant", None).await;
    assert_eq!(status, 200);
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    // Step 1: primary identity
    let (status, body) = app
        .request(
            "PUT",
            &format!("/enroll/{id}/primary"),
            Some(json!({
                "owner_name": "Meena Gupta",
                "government_id": "998877665544",
                "phone": "9123456789",
            })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["primary_complete"], json!(false));

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/verify/government-id"), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["code"].as_str().unwrap().len(), 6);

    let (status, _) = app
        .request("POST", &format!("/enroll/{id}/verify/phone"), None)
        .await;
    assert_eq!(status, 200);

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/advance"), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["stage"], json!("collect_detail"));

    // Step 2: business detail
    let (status, _) = app
        .request(
            "PUT",
            &format!("/enroll/{id}/detail"),
            Some(json!({
                "legal_name": "MEENA GUPTA",
                "date_of_birth": "1988-04-17",
                "tax_id": "MGUPT4421Q",
                "income": "2-6",
            })),
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = app
        .request("POST", &format!("/enroll/{id}/fingerprint"), None)
        .await;
    assert_eq!(status, 200);

    let (status, _) = app
        .request("POST", &format!("/enroll/{id}/face"), None)
        .await;
    assert_eq!(status, 200);

    let (status, body) = app
        .request(
            "POST",
            &format!("/enroll/{id}/location"),
            Some(json!({ "address": "Shop 12, Market Street" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["detail_complete"], json!(true));

    // Step 3: review (masked identifiers shown back)
    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/review"), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["stage"], json!("review"));
    assert_eq!(body["review"]["government_id"], json!("XXXX XXXX 5544"));
    assert_eq!(body["needs_reverification"], json!(false));

    // Step 4: credentials, then finalize into a session
    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/issue"), None)
        .await;
    assert_eq!(status, 200);
    let merchant_id = body["merchant_id"].as_str().unwrap().to_string();
    assert_eq!(merchant_id.len(), 12);
    assert!(merchant_id.chars().all(|c| c.is_ascii_digit()));
    let reference = body["reference"].as_str().unwrap().to_string();
    assert_eq!(reference.len(), 12);

    // Issuing again returns the same identifiers.
    let (_, body) = app
        .request("POST", &format!("/enroll/{id}/issue"), None)
        .await;
    assert_eq!(body["merchant_id"], json!(merchant_id));

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/finalize"), None)
        .await;
    assert_eq!(status, 200);
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(body["merchant"]["merchant_id"], json!(merchant_id));

    // Session lifecycle: visible while active, gone after logout.
    let (status, body) = app
        .request("GET", &format!("/sessions/{session_id}"), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["role"], json!("MERCHANT"));
    assert_eq!(body["is_registered"], json!(true));

    let (status, _) = app
        .request("POST", &format!("/sessions/{session_id}/logout"), None)
        .await;
    assert_eq!(status, 200);

    let (status, _) = app
        .request("GET", &format!("/sessions/{session_id}"), None)
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_closed_gate_blocks_advance() {
    let app = TestApp::new().await;

    let (_, body) = app.request("POST", "/enroll/merchant", None).await;
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    app.request(
        "PUT",
        &format!("/enroll/{id}/primary"),
        Some(json!({ "owner_name": "Meena Gupta", "phone": "9123456789" })),
    )
    .await;

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/advance"), None)
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], json!("gate_closed"));
}

#[tokio::test]
async fn test_review_edit_blocks_issuance_until_reverified() {
    let app = TestApp::new().await;

    let (_, body) = app.request("POST", "/enroll/merchant", None).await;
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    app.request(
        "PUT",
        &format!("/enroll/{id}/primary"),
        Some(json!({
            "owner_name": "Meena Gupta",
            "government_id": "998877665544",
            "phone": "9123456789",
        })),
    )
    .await;
    app.request("POST", &format!("/enroll/{id}/verify/government-id"), None)
        .await;
    app.request("POST", &format!("/enroll/{id}/verify/phone"), None)
        .await;
    app.request("POST", &format!("/enroll/{id}/advance"), None)
        .await;
    app.request(
        "PUT",
        &format!("/enroll/{id}/detail"),
        Some(json!({
            "legal_name": "MEENA GUPTA",
            "date_of_birth": "1988-04-17",
            "tax_id": "MGUPT4421Q",
            "income": "2-6",
        })),
    )
    .await;
    app.request("POST", &format!("/enroll/{id}/fingerprint"), None)
        .await;
    app.request("POST", &format!("/enroll/{id}/face"), None).await;
    app.request(
        "POST",
        &format!("/enroll/{id}/location"),
        Some(json!({ "address": "Shop 12, Market Street" })),
    )
    .await;
    app.request("POST", &format!("/enroll/{id}/review"), None)
        .await;

    // Change the tax ID away from the snapshot.
    let (status, body) = app
        .request(
            "PUT",
            &format!("/enroll/{id}/review"),
            Some(json!({ "tax_id": "ZZZZZ9999Z" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["needs_reverification"], json!(true));

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/issue"), None)
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], json!("reverification_required"));

    let (status, _) = app
        .request("POST", &format!("/enroll/{id}/reverify"), None)
        .await;
    assert_eq!(status, 200);

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/issue"), None)
        .await;
    assert_eq!(status, 200);

    // The finalized record carries the re-verified tax ID.
    let (status, body2) = app
        .request("POST", &format!("/enroll/{id}/finalize"), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body2["merchant"]["tax_id"], json!("ZZZZZ9999Z"));
    assert_eq!(
        body2["merchant"]["merchant_id"],
        body["merchant_id"].clone()
    );
}

#[tokio::test]
async fn test_customer_registration_and_logout() {
    let app = TestApp::new().await;

    let (_, body) = app.request("POST", "/enroll/customer", None).await;
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    app.request(
        "PUT",
        &format!("/enroll/{id}/primary"),
        Some(json!({ "name": "Asha Rao", "phone": "9111111111" })),
    )
    .await;
    app.request("POST", &format!("/enroll/{id}/verify/phone"), None)
        .await;
    app.request("POST", &format!("/enroll/{id}/fingerprint"), None)
        .await;
    app.request("POST", &format!("/enroll/{id}/face"), None).await;

    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/finalize"), None)
        .await;
    assert_eq!(status, 200);
    let customer_id = body["customer"]["customer_id"].as_str().unwrap();
    assert!(customer_id.starts_with("BH-CUST-"));
    assert!(body["session_id"].as_str().is_some());
}

#[tokio::test]
async fn test_known_identity_is_diverted_to_sign_in() {
    let app = TestApp::new().await;

    let (_, body) = app.request("POST", "/enroll/customer", None).await;
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    // The seeded demo phone reproduces the registered biometric hashes.
    app.request(
        "PUT",
        &format!("/enroll/{id}/primary"),
        Some(json!({ "name": "Conference Carl", "phone": "9876543210" })),
    )
    .await;
    app.request("POST", &format!("/enroll/{id}/verify/phone"), None)
        .await;
    app.request("POST", &format!("/enroll/{id}/fingerprint"), None)
        .await;

    let (_, body) = app.request("GET", &format!("/enroll/{id}"), None).await;
    assert_eq!(body["identity_matched"], json!(true));

    app.request("POST", &format!("/enroll/{id}/face"), None).await;

    // Duplicate registration is blocked before any new ID is minted.
    let (status, body) = app
        .request("POST", &format!("/enroll/{id}/finalize"), None)
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], json!("identity_matched"));

    // A wrong claimed ID is a retryable mismatch, not a lockout.
    let (status, body) = app
        .request(
            "POST",
            &format!("/enroll/{id}/sign-in"),
            Some(json!({ "claimed_id": "BH-CUST-WRONG" })),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], json!("id_mismatch"));

    let (status, body) = app
        .request(
            "POST",
            &format!("/enroll/{id}/sign-in"),
            Some(json!({ "claimed_id": "BH-CUST-PROTOTYPE" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["customer"]["customer_id"],
        json!("BH-CUST-PROTOTYPE")
    );
    assert!(body["session_id"].as_str().is_some());
}

#[tokio::test]
async fn test_forgot_id_recovery_reveals_identifier() {
    let app = TestApp::new().await;

    let (_, body) = app.request("POST", "/enroll/customer", None).await;
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    app.request(
        "PUT",
        &format!("/enroll/{id}/primary"),
        Some(json!({ "name": "Conference Carl", "phone": "9876543210" })),
    )
    .await;
    app.request("POST", &format!("/enroll/{id}/fingerprint"), None)
        .await;

    let (status, body) = app
        .request(
            "POST",
            &format!("/enroll/{id}/recovery"),
            Some(json!({ "phone": "9876543210" })),
        )
        .await;
    assert_eq!(status, 200);
    let code = body["code"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "POST",
            &format!("/enroll/{id}/recovery/confirm"),
            Some(json!({ "code": "000000" })),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], json!("recovery_code_mismatch"));

    let (status, body) = app
        .request(
            "POST",
            &format!("/enroll/{id}/recovery/confirm"),
            Some(json!({ "code": code })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["customer_id"], json!("BH-CUST-PROTOTYPE"));
}

#[tokio::test]
async fn test_cancelled_enrollment_is_gone() {
    let app = TestApp::new().await;

    let (_, body) = app.request("POST", "/enroll/customer", None).await;
    let id = body["enrollment_id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request("DELETE", &format!("/enroll/{id}"), None)
        .await;
    assert_eq!(status, 200);

    let (status, _) = app.request("GET", &format!("/enroll/{id}"), None).await;
    assert_eq!(status, 404);
}
