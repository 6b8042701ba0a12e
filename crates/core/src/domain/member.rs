use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque member identifier as issued by the chat workspace (e.g. `U02AB3C`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-member brew counts. Counts only ever grow; a missing key reads as 0.
/// Ordered so serialized snapshots come out key-ascending.
pub type CounterTable = BTreeMap<MemberId, u64>;

/// One leaderboard row, recomputed on every stats request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedEntry {
    pub member: MemberId,
    pub display_name: String,
    pub count: u64,
    pub rank: usize,
}
