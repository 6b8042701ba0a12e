use std::collections::HashMap;

use crate::domain::member::{CounterTable, MemberId, RankedEntry};

/// Brew count that earns a decorative marker regardless of rank.
pub const CELEBRATION_COUNT: u64 = 69;

const LEADER_MARKER: &str = " :trophy:";
const CELEBRATION_MARKER: &str = " :archer:";

/// Ranks the counter table for display: count descending, member id
/// ascending on ties. A member missing from the names map renders with an
/// empty display name; the name resolver's all-or-nothing contract keeps
/// that from happening in practice.
pub fn rank_members(table: &CounterTable, names: &HashMap<MemberId, String>) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = table
        .iter()
        .map(|(member, count)| RankedEntry {
            member: member.clone(),
            display_name: names.get(member).cloned().unwrap_or_default(),
            count: *count,
            rank: 0,
        })
        .collect();

    entries.sort_by(|left, right| {
        right.count.cmp(&left.count).then_with(|| left.member.cmp(&right.member))
    });

    for (rank, entry) in entries.iter_mut().enumerate() {
        entry.rank = rank;
    }

    entries
}

/// Renders one leaderboard line per entry, lazily. The first-ranked member
/// gets the trophy; any member sitting on the celebration count gets the
/// archer, whatever their rank.
pub fn render_lines(entries: Vec<RankedEntry>) -> impl Iterator<Item = String> {
    entries.into_iter().map(|entry| {
        let mut line = format!("{}: {}", entry.display_name, entry.count);
        if entry.rank == 0 {
            line.push_str(LEADER_MARKER);
        }
        if entry.count == CELEBRATION_COUNT {
            line.push_str(CELEBRATION_MARKER);
        }
        line
    })
}
