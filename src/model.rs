//! Data models for the memorial QR demo application
//!
//! This module defines all the data structures used throughout the application,
//! including the domain records (claims, orders, uploads, memorials) and the
//! request/response payloads of the JSON API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a claimed access code
///
/// An access code printed on a physical QR sticker that has already been
/// associated with a memorial. Immutable once constructed: claiming a code
/// creates a fresh record, nothing ever rewrites an existing one.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClaimRecord {
    /// The access code, always stored normalized (trimmed, uppercase)
    pub code: String,

    /// Public URL identifier of the memorial this code points to
    /// (e.g., "jane-doe" for /m/jane-doe)
    pub target_slug: String,
}

/// Outcome of resolving an access code
///
/// Exactly one variant is produced for every input string; resolution is
/// total and never fails. Serialized with a `state` tag so clients can
/// switch on it directly:
///
/// ```json
/// { "state": "claimed", "target_slug": "jane-doe" }
/// { "state": "unclaimed", "code": "DEMO123" }
/// { "state": "unknown", "code": "NOPE" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolutionResult {
    /// The code is already bound to a memorial
    Claimed { target_slug: String },

    /// The code is known and eligible for the claim flow
    Unclaimed { code: String },

    /// The code is in neither set (includes empty/malformed input)
    Unknown { code: String },
}

/// Payment status of an order
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
    Pending,
    Refunded,
}

/// A memorial purchase order as seen by the partner dashboard
///
/// Created externally (demo: the fixed ledger seed or `POST /api/orders`),
/// consumed only for aggregation, never mutated.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Order {
    /// Unique order identifier (e.g., "ord_1001")
    pub id: String,

    /// Display name of the buyer
    pub buyer_name: String,

    /// Order amount in USD; kept as a decimal so commission math stays exact
    pub amount_usd: Decimal,

    /// Current payment status
    pub status: OrderStatus,

    /// Whether this order came in through a partner's referral link
    pub from_referral: bool,

    /// Commission fraction owed to the referring partner, in [0, 1]
    /// (e.g., 0.2 for 20%)
    pub commission_rate: Decimal,

    /// Timestamp when this order entered the ledger
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Summary statistics for the partner dashboard
///
/// Derived from the order ledger on every read, never persisted. All money
/// fields are exact decimals; rounding to 2 decimal places happens only when
/// the handler formats the presentation strings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CommissionSummary {
    /// Number of orders with status = paid (referral or not)
    pub paid_order_count: u64,

    /// Number of paid orders that came through a referral
    pub referred_order_count: u64,

    /// Sum of amounts over all paid orders
    pub gross_paid_usd: Decimal,

    /// Sum of amount x rate over paid referred orders
    pub commission_owed_usd: Decimal,
}

/// A file the user selected or dropped, before conversion
///
/// Carries the raw bytes; the upload buffer converts these into a
/// [`UploadedFile`] with an embedded data URL.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Original file name (e.g., "grandma.jpg")
    pub name: String,

    /// MIME type reported by the file source (e.g., "image/jpeg")
    pub content_type: String,

    /// Raw file content
    pub bytes: Vec<u8>,
}

/// A converted file held by the upload buffer
///
/// The `url` is a base64 data URL so previews survive a page refresh when a
/// presentation layer chooses to persist the buffer contents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name
    pub name: String,

    /// File size in bytes
    pub size_bytes: u64,

    /// Data URL ("data:image/jpeg;base64,...") built from the raw content
    pub url: String,
}

/// Optional media links attached to a memorial or draft
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vimeo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// A single photo entry on a published memorial
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemorialPhoto {
    /// Image URL
    pub src: String,

    /// Alt text / caption
    pub alt: String,
}

/// A published memorial as served by the memorial directory
///
/// The directory is an external collaborator of the code resolver: the
/// resolver only ever handles the slug, never this content.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Memorial {
    /// Public URL identifier (e.g., "jane-doe")
    pub slug: String,

    /// Full display name
    pub name: String,

    /// Life dates, kept as simple display text (e.g., "1950 - 2020")
    pub dates: String,

    /// Short biography
    pub bio: String,

    /// Cover image URL
    pub cover_img: String,

    /// Gallery photos
    pub photos: Vec<MemorialPhoto>,

    /// Optional media links
    #[serde(default)]
    pub links: MemorialLinks,

    /// Unlisted memorials are reachable only via link/QR, not via search
    pub unlisted: bool,
}

/// The owner's editable memorial draft
///
/// This is the snapshot the draft store persists (the reference behavior is
/// a browser-local save/reset; here it lands in the embedded database). The
/// photo entries are data URLs produced by the upload buffer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemorialDraft {
    /// Slug the memorial will publish under
    pub slug: String,

    /// Full display name
    pub name: String,

    /// Life dates as display text
    pub dates: String,

    /// Biography text
    pub bio: String,

    /// Unlisted flag (only people with the link/QR can view)
    pub unlisted: bool,

    /// Photo previews as data URLs
    #[serde(default)]
    pub photos: Vec<String>,

    /// Optional media links
    #[serde(default)]
    pub links: MemorialLinks,

    /// Timestamp of the last save
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl Default for MemorialDraft {
    /// The editor's starting content, matching the demo fixture
    fn default() -> Self {
        MemorialDraft {
            slug: "jane-doe".to_string(),
            name: "Jane A. Doe".to_string(),
            dates: "1950 - 2020".to_string(),
            bio: "Write a short biography here. This is only stored in the demo draft store."
                .to_string(),
            unlisted: true,
            photos: Vec::new(),
            links: MemorialLinks::default(),
            saved_at: Utc::now(),
        }
    }
}

/// Request payload for claiming an unclaimed access code
///
/// # Example
/// ```json
/// {
///   "code": "DEMO123",
///   "slug": "jane-doe"
/// }
/// ```
#[derive(Deserialize)]
pub struct ClaimRequest {
    /// The access code to claim (matched case-insensitively)
    pub code: String,

    /// Slug of the memorial the code should point to
    pub slug: String,
}

/// Request payload for minting fresh unclaimed codes
///
/// # Example
/// ```json
/// { "count": 12 }
/// ```
#[derive(Deserialize)]
pub struct MintRequest {
    /// How many codes to mint (default 12, the size of one sticker sheet)
    pub count: Option<usize>,
}

/// One upload candidate as submitted over the API
///
/// The content travels base64-encoded; the handler decodes it into a
/// [`RawFile`] before handing it to the upload buffer.
#[derive(Deserialize)]
pub struct UploadCandidate {
    /// Original file name
    pub name: String,

    /// MIME type (e.g., "image/png")
    pub content_type: String,

    /// Base64-encoded file content
    pub data_base64: String,
}

/// Request payload for adding files to the upload buffer
#[derive(Deserialize)]
pub struct UploadRequest {
    /// The batch of candidate files, in display order
    pub files: Vec<UploadCandidate>,
}
