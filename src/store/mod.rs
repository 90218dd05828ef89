//! Durable store abstraction.
//!
//! The store is the single source of truth shared by the orchestrator and the
//! settlement worker: hash records with TTL for the request ledger and the
//! address book, a FIFO queue for accepted swaps, and an ordered append log
//! for completed payouts. Every operation touches a single key; there are no
//! multi-key transactions, so callers must tolerate a record observed between
//! two field writes.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Upsert one field of a hash record. Does not affect the record's TTL.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> AppResult<()>;

    /// Read one field of a hash record, `None` when the field or the record
    /// is absent or the record has expired.
    async fn hash_get(&self, key: &str, field: &str) -> AppResult<Option<String>>;

    /// Read a full hash record; an empty map means absent or expired.
    async fn hash_get_all(&self, key: &str) -> AppResult<HashMap<String, String>>;

    /// Schedule automatic expiry of a hash record.
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()>;

    /// Append to the tail of a FIFO queue.
    async fn queue_push(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove and return the head of a FIFO queue, `None` when empty.
    async fn queue_pop(&self, key: &str) -> AppResult<Option<String>>;

    /// Append to an ordered log, keyed by score (a unix timestamp).
    async fn log_append(&self, key: &str, score: i64, value: &str) -> AppResult<()>;

    /// All log entries for a key in score order, for audit inspection.
    async fn log_entries(&self, key: &str) -> AppResult<Vec<String>>;
}
