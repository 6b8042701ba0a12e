use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use brewbot_core::{CounterTable, MemberId};

use crate::{CounterStore, StoreError};

const ID_ATTRIBUTE: &str = "id";
const SCORE_ATTRIBUTE: &str = "score";

/// DynamoDB-backed counters, one item per member.
///
/// `increment` is a single server-side atomic `ADD` expression; no read is
/// performed, so concurrent increments never lose updates on this backend.
pub struct TableCounterStore {
    client: Client,
    table_name: String,
}

impl TableCounterStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self { client, table_name: table_name.into() }
    }
}

#[async_trait]
impl CounterStore for TableCounterStore {
    async fn get(&self) -> Result<CounterTable, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|error| StoreError::Table(error.to_string()))?;

        let mut table = CounterTable::new();
        for item in output.items() {
            let (member, count) = decode_item(item)?;
            table.insert(member, count);
        }

        Ok(table)
    }

    async fn increment(&self, member: &MemberId) -> Result<(), StoreError> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(ID_ATTRIBUTE, AttributeValue::S(member.as_str().to_owned()))
            .update_expression("ADD #score :incr")
            .expression_attribute_names("#score", SCORE_ATTRIBUTE)
            .expression_attribute_values(":incr", AttributeValue::N("1".to_owned()))
            .send()
            .await
            .map_err(|error| StoreError::Table(error.to_string()))?;

        Ok(())
    }
}

fn decode_item(item: &HashMap<String, AttributeValue>) -> Result<(MemberId, u64), StoreError> {
    let member = item
        .get(ID_ATTRIBUTE)
        .and_then(|value| value.as_s().ok())
        .ok_or_else(|| StoreError::Table("scan item is missing a string `id` attribute".to_owned()))?
        .clone();

    let raw = item
        .get(SCORE_ATTRIBUTE)
        .and_then(|value| value.as_n().ok())
        .ok_or_else(|| {
            StoreError::Table(format!("item `{member}` is missing a numeric `score` attribute"))
        })?
        .clone();

    let count = raw
        .parse::<u64>()
        .map_err(|_| StoreError::MalformedCount { member: member.clone(), raw })?;

    Ok((MemberId::new(member), count))
}
