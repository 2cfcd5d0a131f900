//! Client-side upload buffer
//!
//! An ordered, bounded, in-memory list of converted files backing the photo
//! picker. Candidates come in as raw bytes, get converted to base64 data
//! URLs (so a presentation layer can persist previews as-is), and are held
//! in insertion order until removed.
//!
//! Two limits apply, with deliberately different behavior preserved from the
//! reference implementation:
//!
//! - over the file-count limit: excess candidates are silently dropped and
//!   the caller is told how many were still allowed
//! - over the per-file size limit: the ENTIRE batch is rejected and nothing
//!   is added
//!
//! The asymmetry is flagged as an open product question in DESIGN.md; it is
//! intentional here only in the sense of being faithful.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::model::{RawFile, UploadedFile};

/// Callback invoked with the full buffer contents after every mutation
pub type ChangeObserver = Box<dyn Fn(&[UploadedFile]) + Send + Sync>;

/// Errors raised by upload buffer operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The whole batch was discarded; nothing was added
    #[error("{reason}")]
    BatchRejected { reason: String },

    /// `remove_at` was called with an index outside [0, len)
    #[error("index {index} is out of range for {len} file(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result of a successful (possibly partial) add
#[derive(Debug)]
pub struct AddOutcome {
    /// The files that were converted and appended, in input order
    pub accepted: Vec<UploadedFile>,

    /// Set when the count limit dropped part of the batch
    /// (e.g., "Only 2 more file(s) allowed (max 10).")
    pub rejection: Option<String>,
}

/// Bounded, ordered buffer of uploaded files
///
/// Single-writer by contract: the buffer itself does no locking. The HTTP
/// layer wraps it in a mutex because a server is inherently multi-caller;
/// an embedded single-threaded caller needs nothing extra.
pub struct UploadBuffer {
    items: Vec<UploadedFile>,
    max_files: usize,
    max_size_bytes: u64,
    observer: Option<ChangeObserver>,
}

impl UploadBuffer {
    /// Creates an empty buffer with explicit limits
    pub fn new(max_files: usize, max_size_bytes: u64) -> Self {
        UploadBuffer {
            items: Vec::new(),
            max_files,
            max_size_bytes,
            observer: None,
        }
    }

    /// The reference defaults: 10 files, 10 MB each
    pub fn with_defaults() -> Self {
        Self::new(10, 10 * 1024 * 1024)
    }

    /// Registers the change observer
    ///
    /// Called with the complete new list after every successful `add` or
    /// `remove_at`. Replaces any previously registered observer.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: Fn(&[UploadedFile]) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Current contents, insertion order
    pub fn list(&self) -> &[UploadedFile] {
        &self.items
    }

    /// Number of files currently held
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Validates, converts and appends a batch of candidates
    ///
    /// The conversion of accepted candidates completes before the change
    /// observer fires, so the observer always sees the fully converted list.
    /// An empty candidate batch is a no-op (no notification).
    ///
    /// # Errors
    ///
    /// [`BufferError::BatchRejected`] when any candidate that survived the
    /// count cut exceeds the size limit, or when the count limit leaves no
    /// room for any candidate at all. The buffer is unchanged in both cases.
    pub async fn add(&mut self, candidates: Vec<RawFile>) -> Result<AddOutcome, BufferError> {
        if candidates.is_empty() {
            return Ok(AddOutcome {
                accepted: Vec::new(),
                rejection: None,
            });
        }

        // Count limit: keep the first `remaining` candidates, report the rest
        let remaining = self.max_files.saturating_sub(self.items.len());
        let rejection = (candidates.len() > remaining).then(|| {
            format!(
                "Only {} more file(s) allowed (max {}).",
                remaining, self.max_files
            )
        });
        let to_use: Vec<RawFile> = candidates.into_iter().take(remaining).collect();

        // Size limit: one oversize candidate sinks the whole batch
        if let Some(too_big) = to_use
            .iter()
            .find(|f| f.bytes.len() as u64 > self.max_size_bytes)
        {
            return Err(BufferError::BatchRejected {
                reason: format!(
                    "\"{}\" is larger than {} bytes.",
                    too_big.name, self.max_size_bytes
                ),
            });
        }

        // Nothing survived the count cut: reject instead of resolving empty
        if to_use.is_empty() {
            return Err(BufferError::BatchRejected {
                reason: rejection
                    .unwrap_or_else(|| "No files could be accepted.".to_string()),
            });
        }

        let mut accepted = Vec::with_capacity(to_use.len());
        for file in to_use {
            accepted.push(convert_to_data_url(file).await);
        }

        self.items.extend(accepted.iter().cloned());
        self.notify();

        Ok(AddOutcome {
            accepted,
            rejection,
        })
    }

    /// Removes and returns the file at `index`
    ///
    /// Remaining files keep their relative order.
    ///
    /// # Errors
    ///
    /// [`BufferError::IndexOutOfRange`] when `index >= len`; the buffer is
    /// left unchanged and no notification fires.
    pub fn remove_at(&mut self, index: usize) -> Result<UploadedFile, BufferError> {
        if index >= self.items.len() {
            return Err(BufferError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let removed = self.items.remove(index);
        self.notify();
        Ok(removed)
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer(&self.items);
        }
    }
}

/// Converts a raw file into its data-URL form
///
/// This is the buffer's only suspension point: the base64 encoding of a
/// potentially multi-megabyte file runs on the blocking pool rather than
/// the async executor.
async fn convert_to_data_url(file: RawFile) -> UploadedFile {
    let RawFile {
        name,
        content_type,
        bytes,
    } = file;
    let size_bytes = bytes.len() as u64;

    let encoded = tokio::task::spawn_blocking(move || STANDARD.encode(bytes))
        .await
        .expect("base64 encode task panicked");

    UploadedFile {
        name,
        size_bytes,
        url: format!("data:{};base64,{}", content_type, encoded),
    }
}
