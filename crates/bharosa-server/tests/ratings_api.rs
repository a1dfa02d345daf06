//! Integration tests for ratings, offers, insights and standings

use serde_json::json;

use bharosa_advisor::FALLBACK_INSIGHT;

mod common;
use common::TestApp;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, _) = app.request("GET", "/health", None).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_rating_then_edit_applies_marginal_change() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/merchants/S-8821/ratings",
            Some(json!({
                "rater": "BH-CUST-PROTOTYPE",
                "value": 5,
                "comment": "Excellent trust service and fast verification.",
            })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["score"], json!(750));
    assert_eq!(body["edited"], json!(false));

    // Editing 5 → 1 moves the score by the marginal damped delta only:
    // 742 + 0.4×20 + 0.4×(−20−20) = 726.
    let (status, body) = app
        .request(
            "POST",
            "/merchants/S-8821/ratings",
            Some(json!({
                "rater": "BH-CUST-PROTOTYPE",
                "value": 1,
                "comment": "Changed my mind.",
            })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["score"], json!(726));
    assert_eq!(body["edited"], json!(true));

    // Still exactly one rating for the pair.
    let (_, body) = app.request("GET", "/merchants/S-8821", None).await;
    let ratings = body["standing"]["ratings"].as_array().unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["value"], json!(1));
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected() {
    let app = TestApp::new().await;

    for value in [0, 6] {
        let (status, body) = app
            .request(
                "POST",
                "/merchants/S-8821/ratings",
                Some(json!({ "rater": "BH-CUST-X", "value": value })),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("invalid_rating"));
    }
}

#[tokio::test]
async fn test_rating_unknown_merchant_is_404() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            "POST",
            "/merchants/S-0000/ratings",
            Some(json!({ "rater": "BH-CUST-X", "value": 4 })),
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_merchant_standing_with_advice() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/merchants/S-8821", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["standing"]["score"], json!(742));
    assert_eq!(body["trust_level"], json!("GOOD"));
    assert_eq!(body["advice"]["tone"], json!("TRUST"));

    let (_, body) = app.request("GET", "/merchants/S-0092", None).await;
    assert_eq!(body["trust_level"], json!("POOR"));
    assert_eq!(body["advice"]["tone"], json!("CAUTION"));
}

#[tokio::test]
async fn test_offers_are_priced_by_score() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/merchants/S-8821/offers", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["score"], json!(742));

    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 4);

    let standard = offers.iter().find(|o| o["id"] == json!("b1")).unwrap();
    assert_eq!(standard["eligible"], json!(true));
    assert_eq!(standard["adjusted_interest"], json!(5.5));

    let sovereign = offers.iter().find(|o| o["id"] == json!("b4")).unwrap();
    assert_eq!(sovereign["eligible"], json!(false));
    assert_eq!(sovereign["adjusted_interest"], json!(10.5));
}

#[tokio::test]
async fn test_insights_fall_back_when_advisor_unavailable() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request("GET", "/insights?role=MERCHANT", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["role"], json!("MERCHANT"));
    assert_eq!(body["insight"], json!(FALLBACK_INSIGHT));
}

#[tokio::test]
async fn test_seed_data_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/demo/seeds", None).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["customers"][0]["customer_id"],
        json!("BH-CUST-PROTOTYPE")
    );
    assert_eq!(body["merchants"][0]["merchant_id"], json!("S-8821"));
    assert_eq!(body["standings"].as_array().unwrap().len(), 3);
    assert_eq!(body["offers"].as_array().unwrap().len(), 4);
}
