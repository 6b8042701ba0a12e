use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::timeout;

use brewbot_core::{pick_member, ChannelId, MemberId};

/// Channel membership, presence, and profile lookups.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_channel_members(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<MemberId>, LookupError>;

    /// Whether the member currently shows as active in the workspace.
    async fn presence(&self, member: &MemberId) -> Result<bool, LookupError>;

    async fn display_name(&self, member: &MemberId) -> Result<String, LookupError>;
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("directory call failed: {0}")]
    Directory(String),
    #[error("directory call timed out after {0:?}")]
    Timeout(Duration),
    #[error("lookup task aborted: {0}")]
    Aborted(String),
}

/// Checks presence for every listed member concurrently and returns the
/// active ones, in arrival order.
///
/// One task per member, no batching. The join drains every spawned task
/// before returning, even when an early failure has already decided the
/// outcome, so nothing is left running behind the caller's back. Any single
/// failed or timed-out lookup fails the whole call; results gathered from
/// the other tasks are discarded. Duplicate ids are checked (and returned)
/// once per occurrence.
pub async fn active_members(
    directory: Arc<dyn Directory>,
    members: Vec<MemberId>,
    lookup_timeout: Duration,
) -> Result<Vec<MemberId>, LookupError> {
    let mut checks = JoinSet::new();
    for member in members {
        let directory = Arc::clone(&directory);
        checks.spawn(async move {
            let active = match timeout(lookup_timeout, directory.presence(&member)).await {
                Ok(result) => result?,
                Err(_) => return Err(LookupError::Timeout(lookup_timeout)),
            };
            Ok((member, active))
        });
    }

    let mut active = Vec::new();
    let mut first_error = None;
    while let Some(joined) = checks.join_next().await {
        match joined {
            Ok(Ok((member, true))) => active.push(member),
            Ok(Ok((_, false))) => {}
            Ok(Err(error)) => {
                first_error.get_or_insert(error);
            }
            Err(join_error) => {
                first_error.get_or_insert(LookupError::Aborted(join_error.to_string()));
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(active),
    }
}

/// Resolves display names for every listed member concurrently.
///
/// Same fan-out and failure rules as [`active_members`]: all names resolve
/// or the whole call fails, so a stats report never silently shows blanks
/// for members the directory could not resolve.
pub async fn resolve_display_names(
    directory: Arc<dyn Directory>,
    members: Vec<MemberId>,
    lookup_timeout: Duration,
) -> Result<HashMap<MemberId, String>, LookupError> {
    let mut lookups = JoinSet::new();
    for member in members {
        let directory = Arc::clone(&directory);
        lookups.spawn(async move {
            let name = match timeout(lookup_timeout, directory.display_name(&member)).await {
                Ok(result) => result?,
                Err(_) => return Err(LookupError::Timeout(lookup_timeout)),
            };
            Ok((member, name))
        });
    }

    let mut names = HashMap::new();
    let mut first_error = None;
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok(Ok((member, name))) => {
                names.insert(member, name);
            }
            Ok(Err(error)) => {
                first_error.get_or_insert(error);
            }
            Err(join_error) => {
                first_error.get_or_insert(LookupError::Aborted(join_error.to_string()));
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(names),
    }
}

/// Draws one active member uniformly at random, or `None` when nobody is
/// active. An empty member list short-circuits to `None` without any
/// directory traffic.
pub async fn select_random_active_member<R: Rng>(
    directory: Arc<dyn Directory>,
    members: Vec<MemberId>,
    lookup_timeout: Duration,
    rng: &mut R,
) -> Result<Option<MemberId>, LookupError> {
    let active = active_members(directory, members, lookup_timeout).await?;
    Ok(pick_member(&active, rng).cloned())
}
