use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use brewbot_core::{CounterTable, MemberId};

use crate::{CounterStore, StoreError};

/// Fetches the whole counter object.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self) -> Result<Vec<u8>, StoreError>;
}

/// Replaces the whole counter object.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, data: Vec<u8>) -> Result<(), StoreError>;
}

pub struct S3Downloader {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Downloader {
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into(), key: key.into() }
    }
}

#[async_trait]
impl Downloader for S3Downloader {
    async fn download(&self) -> Result<Vec<u8>, StoreError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
            .map_err(|error| StoreError::Transfer(error.to_string()))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|error| StoreError::Transfer(error.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }
}

pub struct S3Uploader {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Uploader {
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into(), key: key.into() }
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload(&self, data: Vec<u8>) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|error| StoreError::Transfer(error.to_string()))?;

        Ok(())
    }
}

/// Whole-object counter store: the counter table lives as one JSON object
/// at a fixed location.
///
/// This is the weakest-consistency backend. `increment` downloads the whole
/// table, bumps it in memory, and overwrites the object; nothing serializes
/// concurrent increments, so two of them can read the same snapshot and the
/// later upload wins, losing the other update. That window is part of this
/// backend's contract. Deployments that need lost-update safety should use
/// the table backend instead.
pub struct ObjectCounterStore<D, U> {
    downloader: D,
    uploader: U,
}

impl<D, U> ObjectCounterStore<D, U>
where
    D: Downloader,
    U: Uploader,
{
    pub fn new(downloader: D, uploader: U) -> Self {
        Self { downloader, uploader }
    }
}

#[async_trait]
impl<D, U> CounterStore for ObjectCounterStore<D, U>
where
    D: Downloader,
    U: Uploader,
{
    async fn get(&self) -> Result<CounterTable, StoreError> {
        let data = self.downloader.download().await?;
        if data.is_empty() {
            return Err(StoreError::EmptyObject);
        }

        Ok(serde_json::from_slice(&data)?)
    }

    async fn increment(&self, member: &MemberId) -> Result<(), StoreError> {
        let mut table = self.get().await?;
        *table.entry(member.clone()).or_insert(0) += 1;

        let data = serde_json::to_vec(&table)?;
        self.uploader.upload(data).await
    }
}
