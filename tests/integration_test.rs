//! Integration tests for the memorial QR demo API
//!
//! These tests verify the entire application stack including:
//! - HTTP routing
//! - Request/response handling
//! - Draft snapshot persistence through the embedded database
//! - Error handling

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

// Import from the main crate
use memoria::route::create_app;
use memoria::store::{init_db, AppState};

/// Helper function to create a test application with a temporary database
fn setup_test_app() -> (axum::Router, NamedTempFile) {
    // Create a temporary database file
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();

    // Initialize database and seed the demo state
    let db = init_db(db_path).expect("Failed to initialize test database");
    let state = AppState::demo(Arc::new(db));

    // Create the app
    let app = create_app(state);

    (app, temp_db)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

/// Helper to build a GET request
fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Helper to build a JSON request with the given method
fn json_request(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Scan & resolution flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_scan_claimed_code_redirects_to_memorial() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/q/CLAIMED1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers().get("location").unwrap();
    assert_eq!(location, "/m/jane-doe");
}

#[tokio::test]
async fn test_scan_is_case_insensitive() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/q/claimed2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers().get("location").unwrap();
    assert_eq!(location, "/m/john-doe");
}

#[tokio::test]
async fn test_scan_unclaimed_code_offers_claim_flow() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/q/demo123")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "unclaimed");
    assert_eq!(body["code"], "DEMO123");
    assert!(body["qr_preview"].as_str().unwrap().contains("DEMO123"));
}

#[tokio::test]
async fn test_scan_unknown_code_degrades_with_hints() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/q/NOSUCH")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "unknown");
    assert_eq!(body["try_unclaimed"], "/q/DEMO123");
    assert_eq!(body["try_claimed"], "/q/CLAIMED1");
}

#[tokio::test]
async fn test_resolve_endpoint_returns_tagged_result() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(get("/api/codes/claimed1"))
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "claimed");
    assert_eq!(body["target_slug"], "jane-doe");

    let response = app.clone().oneshot(get("/api/codes/TRYME")).await.unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "unclaimed");
    assert_eq!(body["code"], "TRYME");

    let response = app.oneshot(get("/api/codes/whatever")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "unknown");
    assert_eq!(body["code"], "WHATEVER");
}

// ---------------------------------------------------------------------------
// Claim flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_claim_unclaimed_code_success() {
    let (app, _temp_db) = setup_test_app();

    let payload = json!({ "code": "demo456", "slug": "New-Memorial" });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/claim", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "DEMO456");
    assert_eq!(body["target_slug"], "new-memorial");
    assert_eq!(body["memorial_url"], "/m/new-memorial");

    // The code now resolves as claimed
    let response = app.oneshot(get("/api/codes/DEMO456")).await.unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "claimed");
    assert_eq!(body["target_slug"], "new-memorial");
}

#[tokio::test]
async fn test_claim_already_claimed_code_conflicts() {
    let (app, _temp_db) = setup_test_app();

    let payload = json!({ "code": "CLAIMED1", "slug": "other" });
    let response = app
        .oneshot(json_request("POST", "/api/claim", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "already_claimed");
    assert_eq!(body["target_slug"], "jane-doe");
}

#[tokio::test]
async fn test_claim_unknown_code_not_found() {
    let (app, _temp_db) = setup_test_app();

    let payload = json!({ "code": "NOSUCH", "slug": "whatever" });
    let response = app
        .oneshot(json_request("POST", "/api/claim", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_claim_empty_slug_rejected() {
    let (app, _temp_db) = setup_test_app();

    let payload = json!({ "code": "DEMO123", "slug": "   " });
    let response = app
        .oneshot(json_request("POST", "/api/claim", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Minting & print sheets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mint_codes_become_unclaimed() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/codes", &json!({ "count": 5 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response.into_body()).await;
    let minted = body["minted"].as_array().unwrap();
    assert_eq!(minted.len(), 5);
    // 3 demo codes + 5 minted
    assert_eq!(body["unclaimed_total"], 8);

    // A minted code resolves as unclaimed
    let code = minted[0].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/api/codes/{}", code)))
        .await
        .unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["state"], "unclaimed");
}

#[tokio::test]
async fn test_print_batch_sheet_has_twelve_codes() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .oneshot(get("/api/admin/print/spring24"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["batch"], "SPRING24");
    let codes = body["codes"].as_array().unwrap();
    assert_eq!(codes.len(), 12);
    assert_eq!(codes[0]["code"], "SPRING24-01");
    assert_eq!(codes[11]["code"], "SPRING24-12");
    assert!(codes[0]["claim_url"]
        .as_str()
        .unwrap()
        .ends_with("/q/SPRING24-01"));
    assert!(codes[0]["qr_src"].as_str().unwrap().contains("qrserver"));
}

#[tokio::test]
async fn test_print_batch_escapes_codes_in_claim_urls() {
    let (app, _temp_db) = setup_test_app();

    // A batch name with a space must come back percent-encoded in the URLs
    let response = app
        .oneshot(get("/api/admin/print/winter%2025"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["batch"], "WINTER 25");
    assert_eq!(body["codes"][0]["code"], "WINTER 25-01");
    assert!(body["codes"][0]["claim_url"]
        .as_str()
        .unwrap()
        .ends_with("/q/WINTER%2025-01"));
    assert!(!body["codes"][0]["qr_src"].as_str().unwrap().contains(' '));
}

// ---------------------------------------------------------------------------
// Memorial directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_memorial_by_slug() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/api/memorials/jane-doe")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["name"], "Jane A. Doe");
    assert_eq!(body["unlisted"], true);
    assert_eq!(body["photos"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_memorial_degrades_with_hint() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/api/memorials/nobody")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["try"], "/api/memorials/jane-doe");
}

// ---------------------------------------------------------------------------
// Orders & partner dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_partner_summary_over_demo_ledger() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/api/partners/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["partner_code"], "FH-DEMO-001");
    assert!(body["referral_link"]
        .as_str()
        .unwrap()
        .contains("/q/DEMO123?ref=FH-DEMO-001"));

    assert_eq!(body["summary"]["paid_order_count"], 2);
    assert_eq!(body["summary"]["referred_order_count"], 1);
    assert_eq!(body["summary"]["gross_paid_usd"].as_f64().unwrap(), 240.0);
    assert_eq!(
        body["summary"]["commission_owed_usd"].as_f64().unwrap(),
        24.0
    );

    // Presentation strings are rounded to cents at the edge
    assert_eq!(body["display"]["gross_paid"], "$240.00");
    assert_eq!(body["display"]["commission_owed"], "$24.00");

    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 3);
    // Paid referral earns commission, paid direct and pending do not
    assert_eq!(orders[0]["commission"], "$24.00");
    assert_eq!(orders[1]["commission"], "$0.00");
    assert_eq!(orders[2]["commission"], "$0.00");
}

#[tokio::test]
async fn test_ingest_order_updates_summary() {
    let (app, _temp_db) = setup_test_app();

    let payload = json!({
        "id": "ord_2001",
        "buyer_name": "Lee Family",
        "amount_usd": 60.0,
        "status": "paid",
        "from_referral": true,
        "commission_rate": 0.2
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/orders", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get("/api/partners/summary")).await.unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["summary"]["paid_order_count"], 3);
    assert_eq!(body["summary"]["gross_paid_usd"].as_f64().unwrap(), 300.0);
    assert_eq!(body["display"]["commission_owed"], "$36.00");
}

#[tokio::test]
async fn test_ingest_rejects_invalid_orders() {
    let (app, _temp_db) = setup_test_app();

    // Negative amount
    let payload = json!({
        "id": "ord_bad1",
        "buyer_name": "X",
        "amount_usd": -5.0,
        "status": "paid",
        "from_referral": false,
        "commission_rate": 0.2
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/orders", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Rate above 1
    let payload = json!({
        "id": "ord_bad2",
        "buyer_name": "X",
        "amount_usd": 5.0,
        "status": "paid",
        "from_referral": false,
        "commission_rate": 1.5
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/orders", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Duplicate id against the demo seed
    let payload = json!({
        "id": "ord_1001",
        "buyer_name": "X",
        "amount_usd": 5.0,
        "status": "paid",
        "from_referral": false,
        "commission_rate": 0.2
    });
    let response = app
        .oneshot(json_request("POST", "/api/orders", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_orders() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/api/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["data"][0]["id"], "ord_1001");
}

// ---------------------------------------------------------------------------
// Upload buffer over HTTP
// ---------------------------------------------------------------------------

fn upload_payload(names: &[&str]) -> Value {
    let files: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "content_type": "image/png",
                "data_base64": STANDARD.encode([1u8, 2, 3]),
            })
        })
        .collect();
    json!({ "files": files })
}

#[tokio::test]
async fn test_upload_add_list_remove() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/uploads",
            &upload_payload(&["a.png", "b.png", "c.png"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["count"], 3);
    assert!(body["warning"].is_null());
    assert!(body["accepted"][0]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    // Remove the middle file, order preserved
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/uploads/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["removed"], "b.png");
    assert_eq!(body["count"], 2);

    let response = app.oneshot(get("/api/uploads")).await.unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["files"][0]["name"], "a.png");
    assert_eq!(body["files"][1]["name"], "c.png");
}

#[tokio::test]
async fn test_upload_remove_out_of_range() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/uploads/99")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "index_out_of_range");
}

#[tokio::test]
async fn test_upload_invalid_base64_rejected() {
    let (app, _temp_db) = setup_test_app();

    let payload = json!({
        "files": [{
            "name": "bad.png",
            "content_type": "image/png",
            "data_base64": "not base64 at all!!!"
        }]
    });
    let response = app
        .oneshot(json_request("POST", "/api/uploads", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_full_buffer_rejects_next_batch() {
    let (app, _temp_db) = setup_test_app();

    // The demo buffer allows 10 files; push 10 then one more batch
    let names: Vec<String> = (0..10).map(|i| format!("f{i}.png")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/uploads",
            &upload_payload(&name_refs),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Buffer full: the next batch cannot accept anything
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/uploads",
            &upload_payload(&["late.png"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "batch_rejected");
}

// ---------------------------------------------------------------------------
// Draft snapshot store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_draft_defaults_before_any_save() {
    let (app, _temp_db) = setup_test_app();

    let response = app.oneshot(get("/api/draft")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["saved"], false);
    assert_eq!(body["draft"]["slug"], "jane-doe");
    assert_eq!(body["draft"]["name"], "Jane A. Doe");
}

#[tokio::test]
async fn test_draft_save_load_reset_round_trip() {
    let (app, _temp_db) = setup_test_app();

    let draft = json!({
        "slug": "maria-santos",
        "name": "Maria Santos",
        "dates": "1932 - 2021",
        "bio": "A life well lived.",
        "unlisted": false,
        "photos": ["data:image/png;base64,AQID"],
        "links": { "website": "https://example.com" }
    });

    // Save
    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/draft", &draft))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["memorial_url"], "/m/maria-santos");

    // Load: the saved snapshot came back from the store
    let response = app.clone().oneshot(get("/api/draft")).await.unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["saved"], true);
    assert_eq!(body["draft"]["name"], "Maria Santos");
    assert_eq!(body["draft"]["photos"][0], "data:image/png;base64,AQID");

    // Reset
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/draft")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Back to the default
    let response = app.oneshot(get("/api/draft")).await.unwrap();
    let body = response_json(response.into_body()).await;
    assert_eq!(body["saved"], false);
    assert_eq!(body["draft"]["name"], "Jane A. Doe");
}
