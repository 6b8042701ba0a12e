//! Domain core for brewbot: typed identifiers, the per-member counter
//! table, random draw selection, and leaderboard ranking. Everything here is
//! pure; directory lookups and counter persistence live behind traits in
//! the `brewbot-slack` and `brewbot-store` crates.

pub mod config;
pub mod domain;
pub mod leaderboard;
pub mod picker;

pub use domain::member::{ChannelId, CounterTable, MemberId, RankedEntry};
pub use leaderboard::{rank_members, render_lines, CELEBRATION_COUNT};
pub use picker::pick_member;
