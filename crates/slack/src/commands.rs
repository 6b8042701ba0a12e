use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use brewbot_core::MemberId;

use crate::messages::{self, SlashResponse};

/// Form fields of an inbound slash-command request that the bot reads.
/// Slack sends more; unknown fields are ignored at the extraction layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoffeeCommand {
    Draw,
    Ready,
    Stats,
    Unknown { argument: String },
}

/// Classifies the raw `text` argument. Matching is exact, with no trimming
/// or case folding, so ` ready` and `READY` are unknown arguments.
pub fn parse_coffee_command(text: &str) -> CoffeeCommand {
    match text {
        "" => CoffeeCommand::Draw,
        "ready" => CoffeeCommand::Ready,
        "stats" => CoffeeCommand::Stats,
        other => CoffeeCommand::Unknown { argument: other.to_owned() },
    }
}

#[derive(Debug, Error)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

/// The operations a command payload can dispatch to. The production
/// implementation wires the directory and counter store together; tests
/// substitute recording stubs.
#[async_trait]
pub trait CoffeeCommandService: Send + Sync {
    /// Draws a random active member and credits them with the brew.
    async fn draw(&self) -> Result<SlashResponse, CommandRouteError>;

    /// Credits the calling member and announces the pot.
    async fn ready(&self, member: &MemberId) -> Result<SlashResponse, CommandRouteError>;

    /// Renders the leaderboard.
    async fn stats(&self) -> Result<SlashResponse, CommandRouteError>;
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: CoffeeCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn route(
        &self,
        payload: SlashCommandPayload,
    ) -> Result<SlashResponse, CommandRouteError> {
        match parse_coffee_command(&payload.text) {
            CoffeeCommand::Draw => self.service.draw().await,
            CoffeeCommand::Ready => self.service.ready(&MemberId::new(payload.user_id)).await,
            CoffeeCommand::Stats => self.service.stats().await,
            CoffeeCommand::Unknown { argument } => {
                info!(argument = %argument, "unknown slash command argument");
                Ok(messages::unknown_argument())
            }
        }
    }
}
