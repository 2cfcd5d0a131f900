//! Draft snapshot store and shared application state
//!
//! This module handles the setup and configuration of the embedded redb
//! database and exposes the snapshot-store interface the editor's save/reset
//! actions run against. The reference behavior is a browser-local key-value
//! store scoped to one client; here the same load/save/clear contract is
//! backed by redb, and the [`SnapshotStore`] trait keeps the backend
//! swappable (file, embedded database, remote service).

use std::sync::{Arc, Mutex as StdMutex, RwLock};

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::commission::OrderLedger;
use crate::directory::MemorialDirectory;
use crate::model::MemorialDraft;
use crate::resolver::CodeIndex;
use crate::upload::UploadBuffer;

/// Table for memorial draft snapshots
///
/// Key: draft scope as string (the demo uses a single "demo" scope,
///      a multi-client deployment would key per client)
/// Value: JSON-serialized MemorialDraft as string
pub const TABLE_DRAFTS: TableDefinition<&str, &str> = TableDefinition::new("drafts_v1");

/// Draft scope used by the single-client demo
pub const DEMO_DRAFT_KEY: &str = "demo";

/// Errors surfaced by a snapshot store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend failed (I/O, corruption, serialization)
    #[error("snapshot store backend error: {0}")]
    Backend(String),
}

/// Generic key-value snapshot store for memorial drafts
///
/// `load` returns None when nothing was ever saved (or after `clear`);
/// callers fall back to the default draft in that case. `clear` on an
/// empty store is a no-op, matching the reference reset action.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<MemorialDraft>, StoreError>;
    fn save(&self, key: &str, draft: &MemorialDraft) -> Result<(), StoreError>;
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// redb-backed snapshot store
pub struct RedbSnapshotStore {
    db: Arc<Database>,
}

impl RedbSnapshotStore {
    pub fn new(db: Arc<Database>) -> Self {
        RedbSnapshotStore { db }
    }
}

impl SnapshotStore for RedbSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<MemorialDraft>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE_DRAFTS)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let Some(value) = table
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?
        else {
            return Ok(None);
        };

        let draft = serde_json::from_str::<MemorialDraft>(value.value())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some(draft))
    }

    fn save(&self, key: &str, draft: &MemorialDraft) -> Result<(), StoreError> {
        let draft_json =
            serde_json::to_string(draft).map_err(|e| StoreError::Backend(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE_DRAFTS)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            table
                .insert(key, draft_json.as_str())
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE_DRAFTS)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

/// Application state shared across all request handlers
///
/// Core data sets are injected here, never reached as process-wide
/// singletons, so tests and multi-tenant setups can supply their own.
/// The code index and ledger sit behind synchronous locks (no await points
/// while held); the upload buffer uses an async mutex because `add` awaits
/// mid-conversion.
#[derive(Clone)]
pub struct AppState {
    /// Claimed mapping + unclaimed allow-list for the resolver
    pub codes: Arc<RwLock<CodeIndex>>,

    /// Order ledger feeding the commission aggregator
    pub ledger: Arc<StdMutex<OrderLedger>>,

    /// Published memorial content, keyed by slug
    pub directory: Arc<MemorialDirectory>,

    /// The photo upload buffer (single demo client)
    pub uploads: Arc<Mutex<UploadBuffer>>,

    /// Draft snapshot store backing the editor's save/reset
    pub drafts: Arc<dyn SnapshotStore>,
}

impl AppState {
    /// Builds the demo state over an initialized database
    ///
    /// Seeds the reference fixtures and wires a tracing observer into the
    /// upload buffer so every buffer mutation is visible in the logs.
    pub fn demo(db: Arc<Database>) -> Self {
        let mut buffer = UploadBuffer::with_defaults();
        buffer.set_observer(|files| {
            tracing::debug!(count = files.len(), "upload buffer changed");
        });

        AppState {
            codes: Arc::new(RwLock::new(CodeIndex::demo())),
            ledger: Arc::new(StdMutex::new(OrderLedger::demo())),
            directory: Arc::new(MemorialDirectory::demo()),
            uploads: Arc::new(Mutex::new(buffer)),
            drafts: Arc::new(RedbSnapshotStore::new(db)),
        }
    }
}

/// Initializes the embedded database and creates required tables
///
/// Creates or opens the database file at the specified path, opens the
/// drafts table, and commits so the table structure is persisted.
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Example
///
/// ```no_run
/// # use memoria::store::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_DRAFTS)?;
    }
    write_txn.commit()?;

    Ok(db)
}
