use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use tokio::task;

use brewbot_core::{CounterTable, MemberId};

use crate::{CounterStore, StoreError};

const MEMBERS: TableDefinition<&str, &str> = TableDefinition::new("members");

/// Embedded single-file counter store.
///
/// Counts are stored as decimal strings keyed by member id in the `members`
/// table. Every increment (read current, bump, write back) runs inside
/// one write transaction, so concurrent increments serialize on the store's
/// single-writer lock and never lose updates. A stored value that does not
/// parse as a count fails the operation; it is never coerced to 0.
pub struct FileCounterStore {
    db: Arc<Database>,
}

impl FileCounterStore {
    /// Wraps an opened database, creating the `members` table when it does
    /// not exist yet. No read or increment is accepted before that.
    pub fn new(db: Database) -> Result<Self, StoreError> {
        let txn = db.begin_write().map_err(redb::Error::from)?;
        {
            txn.open_table(MEMBERS).map_err(redb::Error::from)?;
        }
        txn.commit().map_err(redb::Error::from)?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn get(&self) -> Result<CounterTable, StoreError> {
        let db = Arc::clone(&self.db);

        // redb is a blocking API; keep it off the async workers.
        task::spawn_blocking(move || -> Result<CounterTable, StoreError> {
            let txn = db.begin_read().map_err(redb::Error::from)?;
            let table = txn.open_table(MEMBERS).map_err(redb::Error::from)?;

            let mut counts = CounterTable::new();
            for entry in table.iter().map_err(redb::Error::from)? {
                let (key, value) = entry.map_err(redb::Error::from)?;
                let member = key.value().to_owned();
                let count = parse_count(&member, value.value())?;
                counts.insert(MemberId::new(member), count);
            }

            Ok(counts)
        })
        .await
        .map_err(|join_error| StoreError::Aborted(join_error.to_string()))?
    }

    async fn increment(&self, member: &MemberId) -> Result<(), StoreError> {
        let db = Arc::clone(&self.db);
        let member = member.clone();

        task::spawn_blocking(move || -> Result<(), StoreError> {
            let txn = db.begin_write().map_err(redb::Error::from)?;
            {
                let mut table = txn.open_table(MEMBERS).map_err(redb::Error::from)?;
                let current = match table.get(member.as_str()).map_err(redb::Error::from)? {
                    Some(value) => parse_count(member.as_str(), value.value())?,
                    None => 0,
                };
                let next = (current + 1).to_string();
                table.insert(member.as_str(), next.as_str()).map_err(redb::Error::from)?;
            }
            txn.commit().map_err(redb::Error::from)?;

            Ok(())
        })
        .await
        .map_err(|join_error| StoreError::Aborted(join_error.to_string()))?
    }
}

fn parse_count(member: &str, raw: &str) -> Result<u64, StoreError> {
    raw.parse::<u64>().map_err(|_| StoreError::MalformedCount {
        member: member.to_owned(),
        raw: raw.to_owned(),
    })
}
