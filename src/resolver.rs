//! Access code resolution and the claim flow
//!
//! This module implements the state lookup behind the QR scan flow:
//! a scanned code is either already claimed (points to a memorial),
//! unclaimed (eligible for the claim workflow), or unknown.
//!
//! Resolution is a pure function over a [`CodeIndex`] that is passed in by
//! the caller. The demo seeds a fixed in-memory index, but nothing here
//! assumes that: a deployment can build the index from a persistent store
//! without touching resolution semantics.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::{ClaimRecord, ResolutionResult};

/// Errors raised by claim-flow transitions on a [`CodeIndex`]
///
/// Plain resolution never fails; only the mutating claim operation can.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClaimError {
    /// The code is not on the unclaimed allow-list and not claimed either
    #[error("code {0} is not a known access code")]
    UnknownCode(String),

    /// The code is already bound to a memorial
    #[error("code {code} is already claimed for {target_slug}")]
    AlreadyClaimed { code: String, target_slug: String },

    /// The requested slug is empty or not a usable URL identifier
    #[error("invalid memorial slug: {0:?}")]
    InvalidSlug(String),
}

/// Normalizes an access code for lookup
///
/// Codes are matched case-insensitively: trim surrounding whitespace, then
/// uppercase. Every comparison in this module goes through this first, so
/// "demo123", " DEMO123 " and "DEMO123" all hit the same entry.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The claimed mapping and unclaimed allow-list, bundled for injection
///
/// Both sets key on normalized codes. The two sets are kept disjoint by the
/// mutating operations here, but [`resolve`] does not rely on that: the
/// claimed mapping is checked first, so a code erroneously present in both
/// still resolves as claimed.
#[derive(Debug, Clone, Default)]
pub struct CodeIndex {
    claimed: HashMap<String, ClaimRecord>,
    unclaimed: HashSet<String>,
}

impl CodeIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the demo index used by the reference fixtures
    ///
    /// - CLAIMED1 -> jane-doe, CLAIMED2 -> john-doe
    /// - DEMO123, DEMO456, TRYME are unclaimed
    pub fn demo() -> Self {
        let mut index = Self::new();
        index.insert_claim("CLAIMED1", "jane-doe");
        index.insert_claim("CLAIMED2", "john-doe");
        for code in ["DEMO123", "DEMO456", "TRYME"] {
            index.add_unclaimed(code);
        }
        index
    }

    /// Records a code as claimed, pointing at `target_slug`
    ///
    /// The code is removed from the unclaimed allow-list so the sets stay
    /// disjoint. Overwrites any previous claim for the same code.
    pub fn insert_claim(&mut self, code: &str, target_slug: &str) -> ClaimRecord {
        let code = normalize_code(code);
        self.unclaimed.remove(&code);
        let record = ClaimRecord {
            code: code.clone(),
            target_slug: target_slug.to_string(),
        };
        self.claimed.insert(code, record.clone());
        record
    }

    /// Adds a code to the unclaimed allow-list
    pub fn add_unclaimed(&mut self, code: &str) {
        self.unclaimed.insert(normalize_code(code));
    }

    /// Whether a normalized form of `code` exists in either set
    pub fn contains(&self, code: &str) -> bool {
        let code = normalize_code(code);
        self.claimed.contains_key(&code) || self.unclaimed.contains(&code)
    }

    /// Number of codes currently on the unclaimed allow-list
    pub fn unclaimed_count(&self) -> usize {
        self.unclaimed.len()
    }

    /// Executes the claim transition: unclaimed code -> claimed record
    ///
    /// # Errors
    ///
    /// - [`ClaimError::InvalidSlug`] if the slug is empty after trimming
    /// - [`ClaimError::AlreadyClaimed`] if the code is already bound
    /// - [`ClaimError::UnknownCode`] if the code is not on the allow-list
    pub fn claim(&mut self, code: &str, slug: &str) -> Result<ClaimRecord, ClaimError> {
        let slug = slug.trim().to_lowercase();
        if slug.is_empty() {
            return Err(ClaimError::InvalidSlug(slug));
        }

        let normalized = normalize_code(code);
        if let Some(existing) = self.claimed.get(&normalized) {
            return Err(ClaimError::AlreadyClaimed {
                code: normalized,
                target_slug: existing.target_slug.clone(),
            });
        }
        if !self.unclaimed.contains(&normalized) {
            return Err(ClaimError::UnknownCode(normalized));
        }

        Ok(self.insert_claim(&normalized, &slug))
    }
}

/// Classifies an access code against the index
///
/// Total function: every input string, including the empty string and
/// whitespace noise, produces exactly one [`ResolutionResult`]. The lookup
/// order is load-bearing:
///
/// 1. claimed mapping (wins ties)
/// 2. unclaimed allow-list
/// 3. fallback to Unknown
///
/// No I/O, no side effects.
pub fn resolve(code: &str, index: &CodeIndex) -> ResolutionResult {
    let normalized = normalize_code(code);

    if let Some(record) = index.claimed.get(&normalized) {
        return ResolutionResult::Claimed {
            target_slug: record.target_slug.clone(),
        };
    }

    if index.unclaimed.contains(&normalized) {
        return ResolutionResult::Unclaimed { code: normalized };
    }

    ResolutionResult::Unknown { code: normalized }
}
