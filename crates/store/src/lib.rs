//! Counter persistence for brewbot.
//!
//! Everything that remembers how many coffees a member has made sits behind
//! the [`CounterStore`] trait: a volatile in-memory map, an embedded redb
//! file, a DynamoDB table, and an S3 object. The backends differ sharply in
//! their concurrency guarantees; see the per-backend docs, in particular
//! the whole-object store's documented lost-update window.

use async_trait::async_trait;
use thiserror::Error;

use brewbot_core::{CounterTable, MemberId};

pub mod file;
pub mod memory;
pub mod object;
pub mod table;

pub use file::FileCounterStore;
pub use memory::InMemoryCounterStore;
pub use object::{Downloader, ObjectCounterStore, S3Downloader, S3Uploader, Uploader};
pub use table::TableCounterStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedded store failure: {0}")]
    File(#[from] redb::Error),
    #[error("stored count for `{member}` is not a number: `{raw}`")]
    MalformedCount { member: String, raw: String },
    #[error("counter object is empty")]
    EmptyObject,
    #[error("counter object decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("object transfer failed: {0}")]
    Transfer(String),
    #[error("table operation failed: {0}")]
    Table(String),
    #[error("store task aborted: {0}")]
    Aborted(String),
}

/// Read/bump access to the per-member brew counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the full current table. Members that have never been
    /// credited are simply absent.
    async fn get(&self) -> Result<CounterTable, StoreError>;

    /// Raises `member`'s count by exactly 1, creating the entry at 1 when
    /// the member has no count yet.
    async fn increment(&self, member: &MemberId) -> Result<(), StoreError>;
}
