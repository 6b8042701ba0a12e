use serde::Serialize;

use brewbot_core::MemberId;

/// Response envelope for a slash command. Everything the bot says is posted
/// back into the channel, never as an ephemeral reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashResponse {
    pub response_type: &'static str,
    pub text: String,
}

const IN_CHANNEL: &str = "in_channel";

impl SlashResponse {
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self { response_type: IN_CHANNEL, text: text.into() }
    }
}

pub fn draw(member: &MemberId) -> SlashResponse {
    SlashResponse::in_channel(format!("You're up <@{member}>! ☕"))
}

pub fn nobody_around() -> SlashResponse {
    SlashResponse::in_channel("No one is around to make coffee ☹️")
}

pub fn ready() -> SlashResponse {
    SlashResponse::in_channel("<!here> Coffee's ready! ☕")
}

pub fn no_stats_yet() -> SlashResponse {
    SlashResponse::in_channel("No one has made coffee yet! ☕")
}

pub fn leaderboard(lines: impl Iterator<Item = String>) -> SlashResponse {
    SlashResponse::in_channel(lines.collect::<Vec<_>>().join("\n"))
}

pub fn unknown_argument() -> SlashResponse {
    SlashResponse::in_channel("Unknown argument ☹️")
}
