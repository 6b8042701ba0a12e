use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::info;

use brewbot_core::{leaderboard, ChannelId, MemberId};
use brewbot_slack::commands::{CoffeeCommandService, CommandRouteError};
use brewbot_slack::directory::{self, Directory};
use brewbot_slack::messages::{self, SlashResponse};
use brewbot_store::CounterStore;

/// Production command service: wires the directory and the counter store
/// together with a context-scoped random source for draws.
pub struct CoffeeService {
    directory: Arc<dyn Directory>,
    store: Arc<dyn CounterStore>,
    channel: ChannelId,
    lookup_timeout: Duration,
    rng: Mutex<StdRng>,
}

impl CoffeeService {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn CounterStore>,
        channel: ChannelId,
        lookup_timeout: Duration,
    ) -> Self {
        Self::with_rng(directory, store, channel, lookup_timeout, StdRng::from_entropy())
    }

    /// Takes the draw's random source explicitly; tests pass a fixed seed.
    pub fn with_rng(
        directory: Arc<dyn Directory>,
        store: Arc<dyn CounterStore>,
        channel: ChannelId,
        lookup_timeout: Duration,
        rng: StdRng,
    ) -> Self {
        Self { directory, store, channel, lookup_timeout, rng: Mutex::new(rng) }
    }
}

#[async_trait]
impl CoffeeCommandService for CoffeeService {
    async fn draw(&self) -> Result<SlashResponse, CommandRouteError> {
        info!(channel = %self.channel, "handling coffee draw");

        let members = self
            .directory
            .list_channel_members(&self.channel)
            .await
            .map_err(service_error)?;

        let active = directory::active_members(
            Arc::clone(&self.directory),
            members,
            self.lookup_timeout,
        )
        .await
        .map_err(service_error)?;

        let chosen = {
            let mut rng = self.rng.lock().await;
            brewbot_core::pick_member(&active, &mut *rng).cloned()
        };

        let Some(member) = chosen else {
            info!("no active members to draw from");
            return Ok(messages::nobody_around());
        };

        self.store.increment(&member).await.map_err(service_error)?;
        info!(member = %member, "coffee draw complete");

        Ok(messages::draw(&member))
    }

    async fn ready(&self, member: &MemberId) -> Result<SlashResponse, CommandRouteError> {
        info!(member = %member, "handling coffee ready");

        self.store.increment(member).await.map_err(service_error)?;

        Ok(messages::ready())
    }

    async fn stats(&self) -> Result<SlashResponse, CommandRouteError> {
        info!("handling coffee stats");

        let table = self.store.get().await.map_err(service_error)?;
        if table.is_empty() {
            return Ok(messages::no_stats_yet());
        }

        let members: Vec<MemberId> = table.keys().cloned().collect();
        let names = directory::resolve_display_names(
            Arc::clone(&self.directory),
            members,
            self.lookup_timeout,
        )
        .await
        .map_err(service_error)?;

        let entries = leaderboard::rank_members(&table, &names);
        Ok(messages::leaderboard(leaderboard::render_lines(entries)))
    }
}

fn service_error(error: impl std::fmt::Display) -> CommandRouteError {
    CommandRouteError::Service(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use brewbot_core::{ChannelId, CounterTable, MemberId};
    use brewbot_slack::commands::CoffeeCommandService;
    use brewbot_slack::directory::{Directory, LookupError};
    use brewbot_store::{CounterStore, InMemoryCounterStore, StoreError};

    use crate::service::CoffeeService;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct StaticDirectory {
        members: Vec<MemberId>,
        active: Vec<MemberId>,
        names: HashMap<MemberId, String>,
        fail_presence: bool,
    }

    #[async_trait]
    impl Directory for StaticDirectory {
        async fn list_channel_members(
            &self,
            _channel: &ChannelId,
        ) -> Result<Vec<MemberId>, LookupError> {
            Ok(self.members.clone())
        }

        async fn presence(&self, member: &MemberId) -> Result<bool, LookupError> {
            if self.fail_presence {
                return Err(LookupError::Directory("presence unavailable".to_owned()));
            }
            Ok(self.active.contains(member))
        }

        async fn display_name(&self, member: &MemberId) -> Result<String, LookupError> {
            self.names
                .get(member)
                .cloned()
                .ok_or_else(|| LookupError::Directory(format!("unknown member {member}")))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn get(&self) -> Result<CounterTable, StoreError> {
            Err(StoreError::Transfer("store offline".to_owned()))
        }

        async fn increment(&self, _member: &MemberId) -> Result<(), StoreError> {
            Err(StoreError::Transfer("store offline".to_owned()))
        }
    }

    fn service_with(
        directory: StaticDirectory,
        store: Arc<dyn CounterStore>,
    ) -> CoffeeService {
        CoffeeService::with_rng(
            Arc::new(directory),
            store,
            ChannelId::new("C0FFEE"),
            TIMEOUT,
            StdRng::seed_from_u64(42),
        )
    }

    #[tokio::test]
    async fn draw_announces_and_credits_the_chosen_member() {
        let member = MemberId::new("U1");
        let directory = StaticDirectory {
            members: vec![member.clone()],
            active: vec![member.clone()],
            ..StaticDirectory::default()
        };
        let store = Arc::new(InMemoryCounterStore::default());
        let service = service_with(directory, Arc::clone(&store) as Arc<dyn CounterStore>);

        let response = service.draw().await.expect("draw");

        assert_eq!(response.text, "You're up <@U1>! ☕");
        let table = store.get().await.expect("get");
        assert_eq!(table.get(&member), Some(&1));
    }

    #[tokio::test]
    async fn draw_with_nobody_active_announces_and_credits_no_one() {
        let directory = StaticDirectory {
            members: vec![MemberId::new("U1"), MemberId::new("U2")],
            ..StaticDirectory::default()
        };
        let store = Arc::new(InMemoryCounterStore::default());
        let service = service_with(directory, Arc::clone(&store) as Arc<dyn CounterStore>);

        let response = service.draw().await.expect("draw");

        assert_eq!(response.text, "No one is around to make coffee ☹️");
        assert!(store.get().await.expect("get").is_empty());
    }

    #[tokio::test]
    async fn draw_fails_when_a_presence_lookup_fails() {
        let directory = StaticDirectory {
            members: vec![MemberId::new("U1")],
            fail_presence: true,
            ..StaticDirectory::default()
        };
        let service =
            service_with(directory, Arc::new(InMemoryCounterStore::default()));

        assert!(service.draw().await.is_err());
    }

    #[tokio::test]
    async fn draw_fails_when_the_store_rejects_the_credit() {
        let member = MemberId::new("U1");
        let directory = StaticDirectory {
            members: vec![member.clone()],
            active: vec![member],
            ..StaticDirectory::default()
        };
        let service = service_with(directory, Arc::new(BrokenStore));

        assert!(service.draw().await.is_err());
    }

    #[tokio::test]
    async fn ready_credits_the_caller() {
        let store = Arc::new(InMemoryCounterStore::default());
        let service = service_with(
            StaticDirectory::default(),
            Arc::clone(&store) as Arc<dyn CounterStore>,
        );
        let caller = MemberId::new("U7");

        let response = service.ready(&caller).await.expect("ready");

        assert_eq!(response.text, "<!here> Coffee's ready! ☕");
        let table = store.get().await.expect("get");
        assert_eq!(table.get(&caller), Some(&1));
    }

    #[tokio::test]
    async fn stats_on_an_empty_table_has_a_friendly_answer() {
        let service = service_with(
            StaticDirectory::default(),
            Arc::new(InMemoryCounterStore::default()),
        );

        let response = service.stats().await.expect("stats");
        assert_eq!(response.text, "No one has made coffee yet! ☕");
    }

    #[tokio::test]
    async fn stats_renders_the_ranked_leaderboard() {
        let directory = StaticDirectory {
            names: HashMap::from([
                (MemberId::new("foo"), "Bilbo Baggins".to_owned()),
                (MemberId::new("bar"), "Molland Dasia".to_owned()),
                (MemberId::new("baz"), "Jack Danger".to_owned()),
            ]),
            ..StaticDirectory::default()
        };
        let store = Arc::new(InMemoryCounterStore::default());
        for (member, count) in [("foo", 98u64), ("bar", 69), ("baz", 42)] {
            let member = MemberId::new(member);
            for _ in 0..count {
                store.increment(&member).await.expect("seed store");
            }
        }
        let service = service_with(directory, Arc::clone(&store) as Arc<dyn CounterStore>);

        let response = service.stats().await.expect("stats");

        assert_eq!(
            response.text,
            "Bilbo Baggins: 98 :trophy:\nMolland Dasia: 69 :archer:\nJack Danger: 42"
        );
    }

    #[tokio::test]
    async fn stats_fails_when_a_name_cannot_be_resolved() {
        let store = Arc::new(InMemoryCounterStore::default());
        store.increment(&MemberId::new("U1")).await.expect("seed store");
        let service =
            service_with(StaticDirectory::default(), Arc::clone(&store) as Arc<dyn CounterStore>);

        assert!(service.stats().await.is_err());
    }

    #[tokio::test]
    async fn stats_fails_when_the_store_cannot_be_read() {
        let service = service_with(StaticDirectory::default(), Arc::new(BrokenStore));
        assert!(service.stats().await.is_err());
    }
}
