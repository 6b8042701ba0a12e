use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use tracing::error;

use brewbot_slack::commands::{CommandRouter, SlashCommandPayload};
use brewbot_slack::messages::SlashResponse;

use crate::service::CoffeeService;

/// Routes the slash-command webhook. Every handled case (including an
/// unknown argument and an empty draw) answers 200 with the `in_channel`
/// envelope; a failed collaborator call answers 500 with an empty body,
/// with the detail kept in the logs.
pub fn router(service: CoffeeService) -> Router {
    Router::new()
        .route("/need-coffee-please", post(handle_command))
        .with_state(Arc::new(CommandRouter::new(service)))
}

pub async fn handle_command(
    State(router): State<Arc<CommandRouter<CoffeeService>>>,
    Form(payload): Form<SlashCommandPayload>,
) -> Result<Json<SlashResponse>, StatusCode> {
    match router.route(payload).await {
        Ok(response) => Ok(Json(response)),
        Err(routing_error) => {
            error!(error = %routing_error, "slash command failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::{Form, Json};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use brewbot_core::{ChannelId, MemberId};
    use brewbot_slack::commands::{CommandRouter, SlashCommandPayload};
    use brewbot_slack::directory::{Directory, LookupError};
    use brewbot_store::InMemoryCounterStore;

    use crate::service::CoffeeService;
    use crate::webhook::handle_command;

    /// A directory that refuses every call; commands that never reach the
    /// directory stay unaffected by it.
    struct UnreachableDirectory;

    #[async_trait]
    impl Directory for UnreachableDirectory {
        async fn list_channel_members(
            &self,
            _channel: &ChannelId,
        ) -> Result<Vec<MemberId>, LookupError> {
            Err(LookupError::Directory("directory offline".to_owned()))
        }

        async fn presence(&self, _member: &MemberId) -> Result<bool, LookupError> {
            Err(LookupError::Directory("directory offline".to_owned()))
        }

        async fn display_name(&self, _member: &MemberId) -> Result<String, LookupError> {
            Err(LookupError::Directory("directory offline".to_owned()))
        }
    }

    fn router_state() -> State<Arc<CommandRouter<CoffeeService>>> {
        let service = CoffeeService::with_rng(
            Arc::new(UnreachableDirectory),
            Arc::new(InMemoryCounterStore::default()),
            ChannelId::new("C0FFEE"),
            Duration::from_secs(1),
            StdRng::seed_from_u64(1),
        );
        State(Arc::new(CommandRouter::new(service)))
    }

    fn payload(text: &str) -> Form<SlashCommandPayload> {
        Form(SlashCommandPayload {
            text: text.to_owned(),
            user_id: "U1".to_owned(),
            channel_id: "C0FFEE".to_owned(),
        })
    }

    #[tokio::test]
    async fn unknown_argument_answers_200_with_the_fixed_text() {
        let Json(response) = handle_command(router_state(), payload("foo"))
            .await
            .expect("unknown argument is a handled case");

        assert_eq!(response.response_type, "in_channel");
        assert_eq!(response.text, "Unknown argument ☹️");
    }

    #[tokio::test]
    async fn empty_stats_answer_200_without_directory_traffic() {
        let Json(response) =
            handle_command(router_state(), payload("stats")).await.expect("stats route");

        assert_eq!(response.text, "No one has made coffee yet! ☕");
    }

    #[tokio::test]
    async fn ready_answers_200_and_credits_the_caller() {
        let Json(response) =
            handle_command(router_state(), payload("ready")).await.expect("ready route");

        assert_eq!(response.text, "<!here> Coffee's ready! ☕");
    }

    #[tokio::test]
    async fn failed_collaborator_calls_answer_500() {
        let status = handle_command(router_state(), payload(""))
            .await
            .err()
            .expect("draw must fail against an offline directory");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
