use async_trait::async_trait;
use tokio::sync::RwLock;

use brewbot_core::{CounterTable, MemberId};

use crate::{CounterStore, StoreError};

/// Process-local counters. State dies with the process; useful for local
/// runs and tests. The lock serializes concurrent handler calls.
#[derive(Default)]
pub struct InMemoryCounterStore {
    table: RwLock<CounterTable>,
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn get(&self) -> Result<CounterTable, StoreError> {
        Ok(self.table.read().await.clone())
    }

    async fn increment(&self, member: &MemberId) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        *table.entry(member.clone()).or_insert(0) += 1;
        Ok(())
    }
}
