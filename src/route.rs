//! Route definitions for the memorial QR demo API
//!
//! This module configures all HTTP routes and maps them to their respective
//! handlers. It creates the Axum router with the application state.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handler::{
    add_uploads, claim_code, get_draft, get_memorial, ingest_order, list_orders, list_uploads,
    mint_codes, partner_summary, print_batch, remove_upload, reset_draft, resolve_code, save_draft,
    scan_code,
};
use crate::store::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /q/{code}` - QR scan flow (redirects claimed codes to /m/{slug})
/// - `GET /api/codes/{code}` - Raw resolution result for a code
/// - `POST /api/claim` - Claim an unclaimed code for a memorial slug
/// - `POST /api/admin/codes` - Mint fresh unclaimed codes
/// - `GET /api/admin/print/{batch}` - 12-sticker print sheet for a batch
/// - `GET /api/memorials/{slug}` - Published memorial content
/// - `GET|POST /api/orders` - Order ledger (list / ingest with validation)
/// - `GET /api/partners/summary` - Commission summary + referral link
/// - `GET|POST /api/uploads` - Upload buffer (list / add batch)
/// - `DELETE /api/uploads/{index}` - Remove one file by index
/// - `GET|PUT|DELETE /api/draft` - Draft snapshot (load / save / reset)
///
/// # Arguments
///
/// * `state` - Application state with the injected demo data sets and the
///   draft store
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use memoria::store::{init_db, AppState};
/// # use memoria::route::create_app;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState::demo(Arc::new(db));
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/codes/{code}", get(resolve_code))
        .route("/claim", post(claim_code))
        .route("/admin/codes", post(mint_codes))
        .route("/admin/print/{batch}", get(print_batch))
        .route("/memorials/{slug}", get(get_memorial))
        .route("/orders", get(list_orders).post(ingest_order))
        .route("/partners/summary", get(partner_summary))
        .route("/uploads", get(list_uploads).post(add_uploads))
        .route("/uploads/{index}", delete(remove_upload))
        .route("/draft", get(get_draft).put(save_draft).delete(reset_draft));

    Router::new()
        // Public scan endpoint - what a printed QR sticker points at
        .route("/q/{code}", get(scan_code))
        // Mount API routes under /api
        .nest("/api", api_routes)
        // Inject the application state into all handlers
        .with_state(state)
}
