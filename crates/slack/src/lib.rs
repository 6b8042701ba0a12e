//! Slack surface for brewbot:
//! - **Directory** (`directory`) - channel membership, presence, and profile
//!   lookups behind a trait, plus the concurrent fan-out that finds who is
//!   around to make coffee
//! - **Web API client** (`client`) - the production `Directory` over
//!   `conversations.members`, `users.getPresence`, and `users.info`
//! - **Slash commands** (`commands`) - `/coffee`, `/coffee ready`,
//!   `/coffee stats` classification and routing
//! - **Messages** (`messages`) - the `in_channel` response envelope and the
//!   bot's fixed announcement texts

pub mod client;
pub mod commands;
pub mod directory;
pub mod messages;
