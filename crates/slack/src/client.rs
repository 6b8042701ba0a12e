use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use brewbot_core::{ChannelId, MemberId};

use crate::directory::{Directory, LookupError};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";
const MEMBERS_PAGE_SIZE: &str = "200";

/// The production [`Directory`] over the Slack Web API.
pub struct SlackDirectory {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackDirectory {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL)
    }

    /// Points the client at a different API root.
    pub fn with_base_url(bot_token: SecretString, base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into(), bot_token }
    }

    async fn get_json<T>(&self, method: &str, query: &[(&str, String)]) -> Result<T, LookupError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .get(url)
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|error| LookupError::Directory(error.to_string()))?;

        response.json::<T>().await.map_err(|error| LookupError::Directory(error.to_string()))
    }
}

#[async_trait]
impl Directory for SlackDirectory {
    async fn list_channel_members(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<MemberId>, LookupError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![
                ("channel", channel.as_str().to_owned()),
                ("limit", MEMBERS_PAGE_SIZE.to_owned()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let page: MembersResponse = self.get_json("conversations.members", &query).await?;
            ensure_ok("conversations.members", page.ok, page.error)?;

            members.extend(page.members.into_iter().map(MemberId::new));

            cursor = page
                .response_metadata
                .map(|metadata| metadata.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Ok(members);
            }
        }
    }

    async fn presence(&self, member: &MemberId) -> Result<bool, LookupError> {
        let query = [("user", member.as_str().to_owned())];
        let response: PresenceResponse = self.get_json("users.getPresence", &query).await?;
        ensure_ok("users.getPresence", response.ok, response.error)?;

        Ok(is_active(&response.presence))
    }

    async fn display_name(&self, member: &MemberId) -> Result<String, LookupError> {
        let query = [("user", member.as_str().to_owned())];
        let response: UserResponse = self.get_json("users.info", &query).await?;
        ensure_ok("users.info", response.ok, response.error)?;

        let user = response.user.ok_or_else(|| {
            LookupError::Directory(format!("`users.info` returned no user for {member}"))
        })?;

        Ok(user.real_name)
    }
}

fn ensure_ok(method: &str, ok: bool, error: Option<String>) -> Result<(), LookupError> {
    if ok {
        return Ok(());
    }

    Err(LookupError::Directory(format!(
        "`{method}` failed: {}",
        error.unwrap_or_else(|| "unknown error".to_owned())
    )))
}

fn is_active(presence: &str) -> bool {
    presence == "active"
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct PresenceResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    presence: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<UserObject>,
}

#[derive(Debug, Deserialize)]
struct UserObject {
    #[serde(default)]
    real_name: String,
}
