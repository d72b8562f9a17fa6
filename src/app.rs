use futures::FutureExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vidstream_api::api::{AuthApi, SearchApi, SiteApi, VideoApi};
use vidstream_api::models::auth::{AuthResponse, User};
use vidstream_api::models::search::{HotKeyword, HotKeywordsParams};
use vidstream_api::models::site::SiteConfig;
use vidstream_api::models::video::Category;
use vidstream_api::{ApiResult, Client, RetryOptions, TokenPair, TokenStore, with_retry};

use crate::config::{AppConfig, ConfigManager};
use crate::events::EventBroadcaster;
use crate::session::FileTokenStore;

const CATEGORIES_KEY: &str = "categories";
const SITE_CONFIG_KEY: &str = "site_config";
pub const CACHE_CLEARED_EVENT: &str = "cache_cleared";

/// Configured API client plus the session event channel
pub struct App {
    client: Client,
    config: AppConfig,
    events: EventBroadcaster,
}

impl App {
    pub fn new(config: AppConfig, store: Arc<dyn TokenStore>, events: EventBroadcaster) -> Self {
        let client = Client::with_token_store(config.client_config(), store);

        let hook_events = events.clone();
        client
            .tokens()
            .set_on_tokens_refreshed(Arc::new(move |_pair: TokenPair| {
                let events = hook_events.clone();
                async move { events.tokens_refreshed() }.boxed()
            }));

        Self {
            client,
            config,
            events,
        }
    }

    /// Build from the managed configuration, keeping the session next to it
    pub fn from_config_manager(manager: &ConfigManager, events: EventBroadcaster) -> Self {
        let store = Arc::new(FileTokenStore::new(manager.session_path()));
        tracing::debug!(target: "main", session = %store.path().display(), "Using session file");
        Self::new(manager.get_config(), store, events)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.tokens().get_access_token().is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        let response = self.client.login(username, password).await?;
        self.events
            .logged_in(response.user.id.clone(), response.user.username.clone());
        Ok(response)
    }

    /// Ends the session; cached lookups are dropped even when the server call fails
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.client.logout().await;
        self.invalidate(None)?;
        self.events.logged_out();
        result
    }

    /// Drop cached lookups whose key matches `pattern` (all when `None`)
    /// and announce it as a `cache_cleared` event
    pub fn invalidate(&self, pattern: Option<&str>) -> ApiResult<()> {
        self.client.cache().clear(pattern)?;
        self.events
            .custom_event(CACHE_CLEARED_EVENT.to_string(), json!({ "pattern": pattern }));
        Ok(())
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.client.get_current_user().await
    }

    pub async fn categories(&self) -> ApiResult<Vec<Category>> {
        self.cached(CATEGORIES_KEY, || self.client.get_categories())
            .await
    }

    pub async fn site_config(&self) -> ApiResult<SiteConfig> {
        self.cached(SITE_CONFIG_KEY, || self.client.get_site_config())
            .await
    }

    pub async fn hot_keywords(&self, limit: u32) -> ApiResult<Vec<HotKeyword>> {
        let params = HotKeywordsParams {
            limit: Some(limit),
            ..Default::default()
        };
        let key = format!("hot_keywords:{}", limit);
        self.cached(&key, || self.client.get_hot_keywords(&params))
            .await
    }

    async fn cached<T, F, Fut>(&self, key: &str, operation: F) -> ApiResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let ttl: Duration = self.config.cache_ttl();
        self.client
            .cache()
            .with_cache(key, ttl, || with_retry(operation, RetryOptions::default()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use vidstream_api::MemoryTokenStore;
    use vidstream_api::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    fn unreachable_config() -> AppConfig {
        AppConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn logout_clears_session_and_announces_it() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "r1").unwrap();

        let events = EventBroadcaster::new(8);
        let mut receiver = events.subscribe();
        let app = App::new(unreachable_config(), store, events);
        app.client()
            .cache()
            .insert(CATEGORIES_KEY, Vec::<Category>::new(), Duration::from_secs(60));
        assert!(app.is_logged_in());

        // The server is unreachable, so the call fails but local state is still reset
        assert!(app.logout().await.is_err());
        assert!(!app.is_logged_in());
        assert!(app.client().cache().is_empty());
        match receiver.recv().await.unwrap() {
            Event::Custom { event_name, payload } => {
                assert_eq!(event_name, CACHE_CLEARED_EVENT);
                assert!(payload["pattern"].is_null());
            }
            other => panic!("Expected Custom event, got {:?}", other),
        }
        assert!(matches!(receiver.recv().await.unwrap(), Event::LoggedOut));
    }

    #[tokio::test]
    async fn invalidate_by_pattern_keeps_other_lookups() {
        let events = EventBroadcaster::new(8);
        let mut receiver = events.subscribe();
        let app = App::new(unreachable_config(), Arc::new(MemoryTokenStore::new()), events);
        let ttl = Duration::from_secs(60);
        app.client().cache().insert("hot_keywords:10", Vec::<HotKeyword>::new(), ttl);
        app.client().cache().insert(CATEGORIES_KEY, Vec::<Category>::new(), ttl);

        app.invalidate(Some("^hot_keywords")).unwrap();

        assert!(!app.client().cache().contains_key("hot_keywords:10"));
        assert!(app.client().cache().contains_key(CATEGORIES_KEY));
        match receiver.recv().await.unwrap() {
            Event::Custom { payload, .. } => assert_eq!(payload["pattern"], "^hot_keywords"),
            other => panic!("Expected Custom event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cached_lookup_skips_the_network() {
        let app = App::new(
            unreachable_config(),
            Arc::new(MemoryTokenStore::new()),
            EventBroadcaster::default(),
        );
        app.client()
            .cache()
            .insert(CATEGORIES_KEY, Vec::<Category>::new(), Duration::from_secs(60));

        let categories = app.categories().await.unwrap();
        assert!(categories.is_empty());
    }

    #[test]
    fn from_config_manager_uses_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load(dir.path().join("config.json"));
        std::fs::write(
            manager.session_path(),
            r#"{"accessToken":"a1","refreshToken":"r1"}"#,
        )
        .unwrap();

        let app = App::from_config_manager(&manager, EventBroadcaster::default());
        assert!(app.is_logged_in());
        assert_eq!(app.client().tokens().get_refresh_token().as_deref(), Some("r1"));
    }
}
