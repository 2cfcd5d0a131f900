//! HTTP request handlers for the memorial QR demo API
//!
//! This module implements all the endpoint logic for:
//! - Resolving scanned access codes (claimed / unclaimed / unknown)
//! - Claiming codes and minting fresh ones for sticker sheets
//! - Serving memorial content from the directory
//! - The partner commission dashboard over the order ledger
//! - The photo upload buffer
//! - Saving/loading/resetting the memorial draft snapshot

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use rust_decimal::Decimal;
use serde_json::json;

use crate::commission::{aggregate, LedgerError};
use crate::model::{
    ClaimRequest, MemorialDraft, MintRequest, Order, OrderStatus, RawFile, ResolutionResult,
    UploadRequest,
};
use crate::resolver::{resolve, ClaimError};
use crate::store::{AppState, DEMO_DRAFT_KEY};
use crate::upload::BufferError;

/// Base URL of this deployment, used when building claim/referral links
///
/// Assembled from the `URL` and `PORT` environment variables, defaulting to
/// the local dev server.
fn site_base() -> String {
    let base_url = std::env::var("URL").unwrap_or_else(|_| "http://localhost".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    format!("{}:{}", base_url, port)
}

/// QR image URL for arbitrary data, matching the demo's external generator
fn qr_image_url(data: &str, size: u32) -> String {
    format!(
        "https://api.qrserver.com/v1/create-qr-code/?size={size}x{size}&data={}",
        urlencoding::encode(data)
    )
}

/// Resolves an access code to its claim state
///
/// Pure lookup endpoint: returns the tagged [`ResolutionResult`] for the
/// code, after normalization (trim + uppercase). Never fails; unknown or
/// malformed codes come back as `state = "unknown"`.
///
/// # Response
///
/// - **200 OK** - always, with one of:
///   `{"state":"claimed","target_slug":"jane-doe"}`,
///   `{"state":"unclaimed","code":"DEMO123"}`,
///   `{"state":"unknown","code":"NOPE"}`
pub async fn resolve_code(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let index = state.codes.read().unwrap();
    Json(resolve(&code, &index))
}

/// Handles a QR scan hitting /q/{code}
///
/// This is the flow behind the printed sticker:
///
/// - claimed code: 307 redirect straight to the memorial page
/// - unclaimed code: the claim-flow payload (claim URL, QR preview)
/// - unknown code: informational 404 pointing at known-good demo codes,
///   never a hard failure page
pub async fn scan_code(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let resolution = {
        let index = state.codes.read().unwrap();
        resolve(&code, &index)
    };

    match resolution {
        ResolutionResult::Claimed { target_slug } => {
            let memorial_url = format!("/m/{}", target_slug);
            Redirect::temporary(&memorial_url).into_response()
        }
        ResolutionResult::Unclaimed { code } => {
            let scan_url = format!("{}/q/{}", site_base(), code);
            Json(json!({
                "state": "unclaimed",
                "code": code,
                "message": "This code is unclaimed. Claim it to create a memorial.",
                "claim_url": "/api/claim",
                "qr_preview": qr_image_url(&scan_url, 160),
            }))
            .into_response()
        }
        ResolutionResult::Unknown { code } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "state": "unknown",
                "code": code,
                "message": "Invalid or unknown code.",
                "try_unclaimed": "/q/DEMO123",
                "try_claimed": "/q/CLAIMED1",
            })),
        )
            .into_response(),
    }
}

/// Claims an unclaimed access code for a memorial slug
///
/// Moves the code from the unclaimed allow-list into the claimed mapping.
/// Runtime state only, mirroring the demo's in-memory data.
///
/// # Request Body
///
/// ```json
/// { "code": "DEMO123", "slug": "jane-doe" }
/// ```
///
/// # Response
///
/// - **201 Created** - code claimed, returns the new record and memorial URL
/// - **404 Not Found** - code is not a known access code
/// - **409 Conflict** - code is already claimed
/// - **422 Unprocessable Entity** - empty/invalid slug
pub async fn claim_code(
    State(state): State<AppState>,
    Json(payload): Json<ClaimRequest>,
) -> impl IntoResponse {
    let mut index = state.codes.write().unwrap();

    match index.claim(&payload.code, &payload.slug) {
        Ok(record) => (
            StatusCode::CREATED,
            Json(json!({
                "code": record.code,
                "target_slug": record.target_slug,
                "memorial_url": format!("/m/{}", record.target_slug),
            })),
        )
            .into_response(),
        Err(ClaimError::UnknownCode(code)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("Code {} is not a known access code", code),
                "code": "unknown_code"
            })),
        )
            .into_response(),
        Err(ClaimError::AlreadyClaimed { code, target_slug }) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": format!("Code {} is already claimed", code),
                "code": "already_claimed",
                "target_slug": target_slug
            })),
        )
            .into_response(),
        Err(ClaimError::InvalidSlug(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Slug must not be empty",
                "code": "invalid_slug"
            })),
        )
            .into_response(),
    }
}

/// Mints fresh unclaimed access codes
///
/// Generates random 8-character uppercase codes, skips collisions against
/// both sets, and adds them to the unclaimed allow-list so they can be
/// printed and later claimed.
///
/// # Request Body
///
/// ```json
/// { "count": 12 }
/// ```
///
/// # Response
///
/// - **201 Created** - the minted codes plus the new allow-list size
pub async fn mint_codes(
    State(state): State<AppState>,
    Json(payload): Json<MintRequest>,
) -> impl IntoResponse {
    // Default one sticker sheet, cap a single request at 100
    let count = payload.count.unwrap_or(12).min(100);

    let mut index = state.codes.write().unwrap();
    let mut minted: Vec<String> = Vec::with_capacity(count);
    while minted.len() < count {
        let code: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();

        // Collision with an existing code: roll again
        if index.contains(&code) {
            continue;
        }
        index.add_unclaimed(&code);
        minted.push(code);
    }

    tracing::info!(count = minted.len(), "minted unclaimed codes");

    (
        StatusCode::CREATED,
        Json(json!({
            "minted": minted,
            "unclaimed_total": index.unclaimed_count(),
        })),
    )
}

/// Builds a printable sticker sheet for a batch name
///
/// One sheet is 12 stickers: deterministic codes `{BATCH}-01..{BATCH}-12`,
/// each with its claim URL and a QR image URL.
///
/// # Example Request
///
/// `GET /api/admin/print/SPRING24`
pub async fn print_batch(Path(batch): Path<String>) -> impl IntoResponse {
    let batch = batch.trim().to_uppercase();
    let batch = if batch.is_empty() {
        "BATCH".to_string()
    } else {
        batch
    };
    let base = site_base();

    let codes: Vec<serde_json::Value> = (1..=12)
        .map(|i| {
            let code = format!("{}-{:02}", batch, i);
            let claim_url = format!("{}/q/{}", base, urlencoding::encode(&code));
            json!({
                "code": code,
                "claim_url": claim_url,
                "qr_src": qr_image_url(&claim_url, 240),
            })
        })
        .collect();

    Json(json!({
        "batch": batch,
        "per_page": 12,
        "codes": codes,
    }))
}

/// Serves a published memorial by slug
///
/// # Response
///
/// - **200 OK** - the memorial content
/// - **404 Not Found** - unknown or private slug, with a hint at the demo
///   memorial instead of a hard failure
pub async fn get_memorial(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.directory.lookup(&slug) {
        Some(memorial) => Json(memorial.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "This memorial is private or does not exist.",
                "try": "/api/memorials/jane-doe"
            })),
        )
            .into_response(),
    }
}

/// Lists the order ledger contents
pub async fn list_orders(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.lock().unwrap();
    Json(json!({
        "total": ledger.orders().len(),
        "data": ledger.orders(),
    }))
}

/// Ingests a new order into the ledger
///
/// Validation happens here at the boundary, keeping the aggregator total:
/// negative amounts and rates outside [0, 1] never reach it.
///
/// # Response
///
/// - **201 Created** - order accepted
/// - **409 Conflict** - duplicate order id
/// - **422 Unprocessable Entity** - malformed amount or rate
pub async fn ingest_order(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> impl IntoResponse {
    let mut ledger = state.ledger.lock().unwrap();

    match ledger.ingest(order) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Order recorded",
                "total": ledger.orders().len(),
            })),
        )
            .into_response(),
        Err(LedgerError::InvalidOrder { reason }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": reason,
                "code": "invalid_order"
            })),
        )
            .into_response(),
        Err(LedgerError::DuplicateOrder { id }) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": format!("Order {} already exists", id),
                "code": "duplicate_order"
            })),
        )
            .into_response(),
    }
}

/// Partner dashboard: referral link plus commission summary
///
/// Recomputes the summary from the ledger on every read. Money fields stay
/// exact decimals in `summary`; the `display` block carries the 2-decimal
/// presentation strings, rounded only here at the edge.
///
/// # Response
///
/// ```json
/// {
///   "partner_code": "FH-DEMO-001",
///   "referral_link": "http://localhost:8080/q/DEMO123?ref=FH-DEMO-001",
///   "summary": { "paid_order_count": 2, ... },
///   "display": { "gross_paid": "$240.00", "commission_owed": "$24.00" },
///   "orders": [ ... ]
/// }
/// ```
pub async fn partner_summary(State(state): State<AppState>) -> impl IntoResponse {
    let partner_code =
        std::env::var("PARTNER_CODE").unwrap_or_else(|_| "FH-DEMO-001".to_string());
    let referral_link = format!(
        "{}/q/DEMO123?ref={}",
        site_base(),
        urlencoding::encode(&partner_code)
    );

    let ledger = state.ledger.lock().unwrap();
    let summary = aggregate(ledger.orders());

    // Per-order rows with the commission each one earns
    let rows: Vec<serde_json::Value> = ledger
        .orders()
        .iter()
        .map(|o| {
            let commission = if o.status == OrderStatus::Paid && o.from_referral {
                o.amount_usd * o.commission_rate
            } else {
                Decimal::ZERO
            };
            json!({
                "id": o.id,
                "buyer_name": o.buyer_name,
                "status": o.status,
                "amount": format!("${:.2}", o.amount_usd.round_dp(2)),
                "commission": format!("${:.2}", commission.round_dp(2)),
            })
        })
        .collect();

    let gross_display = format!("${:.2}", summary.gross_paid_usd.round_dp(2));
    let commission_display = format!("${:.2}", summary.commission_owed_usd.round_dp(2));

    Json(json!({
        "partner_code": partner_code,
        "referral_link": referral_link,
        "summary": summary,
        "display": {
            "gross_paid": gross_display,
            "commission_owed": commission_display,
        },
        "orders": rows,
    }))
}

/// Lists the upload buffer contents, insertion order
pub async fn list_uploads(State(state): State<AppState>) -> impl IntoResponse {
    let buffer = state.uploads.lock().await;
    Json(json!({
        "count": buffer.len(),
        "files": buffer.list(),
    }))
}

/// Adds a batch of files to the upload buffer
///
/// Candidates arrive with base64-encoded content and are decoded into raw
/// files before validation. Count overflow truncates the batch and reports
/// a warning; a single oversize file rejects the whole batch.
///
/// # Response
///
/// - **200 OK** - accepted files plus an optional `warning` when the count
///   limit dropped part of the batch
/// - **400 Bad Request** - undecodable base64 content
/// - **413 Payload Too Large** - batch rejected (oversize file, or no room
///   left at all); the buffer is unchanged
pub async fn add_uploads(
    State(state): State<AppState>,
    Json(payload): Json<UploadRequest>,
) -> impl IntoResponse {
    // Decode every candidate up front so a bad payload rejects cleanly
    let mut candidates = Vec::with_capacity(payload.files.len());
    for file in payload.files {
        let bytes = match STANDARD.decode(&file.data_base64) {
            Ok(bytes) => bytes,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": format!("File \"{}\" is not valid base64", file.name),
                        "code": "invalid_encoding"
                    })),
                )
                    .into_response()
            }
        };
        candidates.push(RawFile {
            name: file.name,
            content_type: file.content_type,
            bytes,
        });
    }

    let mut buffer = state.uploads.lock().await;
    match buffer.add(candidates).await {
        Ok(outcome) => Json(json!({
            "accepted": outcome.accepted,
            "warning": outcome.rejection,
            "count": buffer.len(),
        }))
        .into_response(),
        Err(BufferError::BatchRejected { reason }) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": reason,
                "code": "batch_rejected"
            })),
        )
            .into_response(),
        // remove_at is the only source of this variant
        Err(BufferError::IndexOutOfRange { .. }) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "unexpected buffer error").into_response()
        }
    }
}

/// Removes one file from the upload buffer by index
///
/// # Response
///
/// - **200 OK** - removed, remaining files keep their relative order
/// - **404 Not Found** - index outside [0, count); buffer unchanged
pub async fn remove_upload(
    Path(index): Path<usize>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let mut buffer = state.uploads.lock().await;

    match buffer.remove_at(index) {
        Ok(removed) => Json(json!({
            "removed": removed.name,
            "count": buffer.len(),
        }))
        .into_response(),
        Err(BufferError::IndexOutOfRange { index, len }) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("Index {} is out of range for {} file(s)", index, len),
                "code": "index_out_of_range"
            })),
        )
            .into_response(),
        Err(BufferError::BatchRejected { .. }) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "unexpected buffer error").into_response()
        }
    }
}

/// Loads the saved memorial draft, or the default when none was saved
///
/// # Response
///
/// `saved` tells the editor whether this came from the store or is the
/// pristine default.
pub async fn get_draft(State(state): State<AppState>) -> impl IntoResponse {
    match state.drafts.load(DEMO_DRAFT_KEY).unwrap() {
        Some(draft) => Json(json!({ "saved": true, "draft": draft })),
        None => Json(json!({ "saved": false, "draft": MemorialDraft::default() })),
    }
}

/// Saves the memorial draft snapshot
///
/// Overwrites any previous snapshot; the store keeps exactly one draft per
/// scope, matching the reference save action.
pub async fn save_draft(
    State(state): State<AppState>,
    Json(mut draft): Json<MemorialDraft>,
) -> impl IntoResponse {
    draft.saved_at = Utc::now();
    state.drafts.save(DEMO_DRAFT_KEY, &draft).unwrap();

    Json(json!({
        "message": "Draft saved",
        "memorial_url": format!("/m/{}", draft.slug),
        "saved_at": draft.saved_at,
    }))
}

/// Clears the saved draft (the editor's reset action)
///
/// Always succeeds; resetting an already-empty store is a no-op. Returns
/// the default draft the editor should fall back to.
pub async fn reset_draft(State(state): State<AppState>) -> impl IntoResponse {
    state.drafts.clear(DEMO_DRAFT_KEY).unwrap();

    Json(json!({
        "message": "Draft reset",
        "draft": MemorialDraft::default(),
    }))
}
