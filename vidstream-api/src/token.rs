//! Access/refresh token storage and single-flight refresh.

use crate::error::{ApiError, ApiResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Durable key/value storage for credentials.
///
/// Every token read and write goes straight through the store, so an
/// implementation backed by a file or a keychain always serves the latest
/// persisted value.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> ApiResult<()>;
    fn remove(&self, key: &str) -> ApiResult<()>;
}

/// Process-local token store, used by default and in tests
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// Access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

/// Refresh endpoint response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Callback invoked after every successful refresh
pub type OnTokensRefreshed = Arc<dyn Fn(TokenPair) -> BoxFuture<'static, ()> + Send + Sync>;

type RefreshFuture = Shared<BoxFuture<'static, ApiResult<String>>>;

/// Where and how the refresh call is made
#[derive(Clone)]
pub struct RefreshEndpoint {
    pub http_client: reqwest::Client,
    pub url: String,
    pub timeout: Duration,
}

struct TokenManagerInner {
    store: Arc<dyn TokenStore>,
    endpoint: RefreshEndpoint,
    in_flight: Mutex<Option<RefreshFuture>>,
    on_refreshed: Mutex<Option<OnTokensRefreshed>>,
}

/// Single source of truth for the token pair.
///
/// Cloning is cheap and every clone shares the same store and the same
/// in-flight refresh, so at most one refresh call is outstanding at a time.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<TokenManagerInner>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, endpoint: RefreshEndpoint) -> Self {
        Self {
            inner: Arc::new(TokenManagerInner {
                store,
                endpoint,
                in_flight: Mutex::new(None),
                on_refreshed: Mutex::new(None),
            }),
        }
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.inner.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.inner.store.get(REFRESH_TOKEN_KEY)
    }

    /// Overwrite both stored tokens
    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) -> ApiResult<()> {
        self.inner.store.set(ACCESS_TOKEN_KEY, access_token)?;
        self.inner.store.set(REFRESH_TOKEN_KEY, refresh_token)?;
        tracing::debug!(target: "api::token", "Stored new token pair");
        Ok(())
    }

    /// Remove both stored tokens
    pub fn clear_tokens(&self) -> ApiResult<()> {
        self.inner.store.remove(ACCESS_TOKEN_KEY)?;
        self.inner.store.remove(REFRESH_TOKEN_KEY)?;
        tracing::debug!(target: "api::token", "Cleared stored tokens");
        Ok(())
    }

    /// Register a hook that receives every freshly refreshed token pair
    pub fn set_on_tokens_refreshed(&self, hook: OnTokensRefreshed) {
        *self
            .inner
            .on_refreshed
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Concurrent callers share one refresh call and observe the same outcome.
    /// Any failure clears both stored tokens; the refresh itself is never retried.
    pub async fn refresh_access_token(&self) -> ApiResult<String> {
        let refresh = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            match slot.clone() {
                Some(pending) => {
                    tracing::debug!(target: "api::token", "Joining in-flight token refresh");
                    pending
                }
                None => {
                    let inner = self.inner.clone();
                    let pending = async move {
                        let result = perform_refresh(&inner).await;
                        inner
                            .in_flight
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .take();
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        refresh.await
    }
}

async fn perform_refresh(inner: &TokenManagerInner) -> ApiResult<String> {
    let result = request_new_tokens(inner).await;

    match result {
        Ok(pair) => {
            inner
                .store
                .set(ACCESS_TOKEN_KEY, &pair.access_token)
                .and_then(|_| inner.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token))?;
            tracing::info!(target: "api::token", "Access token refreshed");

            let hook = inner
                .on_refreshed
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            if let Some(hook) = hook {
                hook(pair.clone()).await;
            }

            Ok(pair.access_token)
        }
        Err(err) => {
            tracing::warn!(target: "api::token", error = %err, "Token refresh failed, clearing session");
            for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
                if let Err(clear_err) = inner.store.remove(key) {
                    tracing::error!(target: "api::token", key, error = %clear_err, "Failed to clear token");
                }
            }
            Err(err)
        }
    }
}

async fn request_new_tokens(inner: &TokenManagerInner) -> ApiResult<TokenPair> {
    let refresh_token = inner
        .store
        .get(REFRESH_TOKEN_KEY)
        .ok_or_else(|| ApiError::Auth("No refresh token available".to_string()))?;

    let endpoint = &inner.endpoint;
    tracing::debug!(target: "api::token", url = %endpoint.url, "Requesting new access token");

    let send = endpoint
        .http_client
        .post(&endpoint.url)
        .header(CONTENT_TYPE, "application/json")
        .json(&RefreshTokenRequest {
            refresh_token: &refresh_token,
        })
        .send();

    let response = tokio::time::timeout(endpoint.timeout, send)
        .await
        .map_err(|_| ApiError::Timeout)??;

    if !response.status().is_success() {
        tracing::debug!(target: "api::token", status = response.status().as_u16(), "Refresh endpoint rejected the refresh token");
        return Err(ApiError::Auth("Token refresh failed".to_string()));
    }

    let data: RefreshTokenResponse = response.json().await?;
    Ok(TokenPair {
        access_token: data.access_token,
        refresh_token: data.refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_store(store: Arc<MemoryTokenStore>) -> TokenManager {
        TokenManager::new(
            store,
            RefreshEndpoint {
                http_client: reqwest::Client::new(),
                // Never contacted by these tests
                url: "http://127.0.0.1:9/api/auth/refresh".to_string(),
                timeout: Duration::from_millis(200),
            },
        )
    }

    #[test]
    fn set_and_clear_go_through_the_store() {
        let store = Arc::new(MemoryTokenStore::new());
        let tokens = manager_with_store(store.clone());

        tokens.set_tokens("access-1", "refresh-1").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("access-1"));
        assert_eq!(tokens.get_refresh_token().as_deref(), Some("refresh-1"));

        store.set(ACCESS_TOKEN_KEY, "changed-elsewhere").unwrap();
        assert_eq!(tokens.get_access_token().as_deref(), Some("changed-elsewhere"));

        tokens.clear_tokens().unwrap();
        assert!(tokens.get_access_token().is_none());
        assert!(tokens.get_refresh_token().is_none());
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails_fast_and_clears() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(ACCESS_TOKEN_KEY, "stale").unwrap();
        let tokens = manager_with_store(store.clone());

        let err = tokens.refresh_access_token().await.unwrap_err();

        assert!(matches!(err, ApiError::Auth(ref msg) if msg == "No refresh token available"));
        assert!(tokens.get_access_token().is_none());
        assert!(tokens.inner.in_flight.lock().unwrap().is_none());
    }
}
