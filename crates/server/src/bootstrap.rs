use std::sync::Arc;
use std::time::Duration;

use redb::Database;
use thiserror::Error;
use tracing::info;

use brewbot_core::config::{AppConfig, ConfigError, LoadOptions, StoreBackend};
use brewbot_core::ChannelId;
use brewbot_slack::client::SlackDirectory;
use brewbot_slack::directory::Directory;
use brewbot_store::{
    CounterStore, FileCounterStore, InMemoryCounterStore, ObjectCounterStore, S3Downloader,
    S3Uploader, StoreError, TableCounterStore,
};

use crate::service::CoffeeService;

pub struct Application {
    pub config: AppConfig,
    pub service: CoffeeService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not open counter file `{path}`: {source}")]
    OpenCounterFile { path: String, source: redb::DatabaseError },
    #[error("counter store initialization failed: {0}")]
    Store(#[from] StoreError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        backend = ?config.store.backend,
        "starting application bootstrap"
    );

    let store = build_store(&config).await?;
    info!(
        event_name = "system.bootstrap.store_ready",
        backend = ?config.store.backend,
        "counter store initialized"
    );

    let directory: Arc<dyn Directory> =
        Arc::new(SlackDirectory::new(config.slack.bot_token.clone()));

    let service = CoffeeService::new(
        directory,
        store,
        ChannelId::new(config.slack.channel.clone()),
        Duration::from_secs(config.directory.lookup_timeout_secs),
    );

    Ok(Application { config, service })
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn CounterStore>, BootstrapError> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryCounterStore::default())),
        StoreBackend::File => {
            let db = Database::create(&config.store.file_path).map_err(|source| {
                BootstrapError::OpenCounterFile { path: config.store.file_path.clone(), source }
            })?;
            Ok(Arc::new(FileCounterStore::new(db)?))
        }
        StoreBackend::Table => {
            let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let client = aws_sdk_dynamodb::Client::new(&aws);
            Ok(Arc::new(TableCounterStore::new(client, config.store.table_name.clone())))
        }
        StoreBackend::Object => {
            let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let client = aws_sdk_s3::Client::new(&aws);
            let downloader = S3Downloader::new(
                client.clone(),
                config.store.bucket.clone(),
                config.store.object_key.clone(),
            );
            let uploader = S3Uploader::new(
                client,
                config.store.bucket.clone(),
                config.store.object_key.clone(),
            );
            Ok(Arc::new(ObjectCounterStore::new(downloader, uploader)))
        }
    }
}
