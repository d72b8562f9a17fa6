use crate::cache::ResponseCache;
use crate::error::{ApiError, ApiResult};
use crate::query::QueryParams;
use crate::token::{MemoryTokenStore, RefreshEndpoint, TokenManager, TokenStore};
use crate::upload::UploadFile;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{multipart, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Default API path appended to the instance URL
pub const DEFAULT_API_PATH: &str = "/api";
/// Default refresh endpoint, relative to the API path
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Default request timeout, covering both the response headers and the body
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Default timeout for standalone uploads
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_millis(60_000);
/// Environment variable holding the full API base URL
pub const BASE_URL_ENV: &str = "VIDSTREAM_API_BASE_URL";

/// Development server used when no base URL is configured
pub const DEFAULT_INSTANCE_URL: &str = "http://localhost:3000";

/// Client configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Instance origin, e.g. `https://video.example.com`
    pub base_url: String,
    /// Path prefix of every endpoint
    pub api_path: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Timeout of [`Client::upload_file`]
    pub upload_timeout: Duration,
    /// Refresh endpoint, relative to `api_path`
    pub refresh_path: String,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            user_agent: format!("vidstream-api/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Read the API base URL from `VIDSTREAM_API_BASE_URL`.
    ///
    /// The variable holds the complete base including the API path, so no
    /// extra prefix is appended. Without it the local development server is used.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url).with_api_path(""),
            _ => Self::new(DEFAULT_INSTANCE_URL),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        let api_path: String = api_path.into();
        self.api_path = api_path.trim_end_matches('/').to_string();
        self
    }

    pub fn with_refresh_path(mut self, refresh_path: impl Into<String>) -> Self {
        self.refresh_path = refresh_path.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL of an endpoint
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_path, endpoint)
    }
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) no_credential: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not attach the bearer token. A 401 from such a call is returned as is.
    pub fn no_credential(mut self) -> Self {
        self.no_credential = true;
        self
    }

    /// Add a header; overrides the default JSON content type when named `Content-Type`
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Request payload, kept in a form that can be sent more than once
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Bytes),
    Multipart(MultipartBody),
}

impl RequestBody {
    pub fn json<B: Serialize + ?Sized>(body: &B) -> ApiResult<Self> {
        Ok(RequestBody::Json(Bytes::from(serde_json::to_vec(body)?)))
    }
}

/// A file plus flat form fields
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub file: UploadFile,
    pub fields: QueryParams,
}

impl MultipartBody {
    fn to_form(&self) -> ApiResult<multipart::Form> {
        let mut form = multipart::Form::new().part("file", self.file.to_part()?);
        for (key, value) in self.fields.iter() {
            form = form.text(key.to_string(), value.to_string());
        }
        Ok(form)
    }
}

/// HTTP client for the video site API.
///
/// Attaches the bearer token, enforces the request timeout and transparently
/// refreshes the session once when the server rejects the access token.
pub struct Client {
    pub(crate) http_client: reqwest::Client,
    config: ClientConfig,
    tokens: TokenManager,
    cache: ResponseCache,
}

impl Client {
    /// Create a client that keeps tokens in memory
    pub fn new(config: ClientConfig) -> Self {
        Self::with_token_store(config, Arc::new(MemoryTokenStore::new()))
    }

    /// Create a client backed by the given durable token store
    pub fn with_token_store(config: ClientConfig, store: Arc<dyn TokenStore>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(target: "api::client", error = %err, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        let tokens = TokenManager::new(
            store,
            RefreshEndpoint {
                http_client: http_client.clone(),
                url: config.endpoint_url(&config.refresh_path),
                timeout: config.timeout,
            },
        );

        Self {
            http_client,
            config,
            tokens,
            cache: ResponseCache::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token manager shared by every request of this client
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// In-memory response cache owned by this client
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn build_url(&self, endpoint: &str) -> String {
        self.config.endpoint_url(endpoint)
    }

    /// Absolute URL of an endpoint including its query string
    pub fn api_url(&self, endpoint: &str, params: &QueryParams) -> String {
        self.build_url(&params.apply_to(endpoint))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::GET, &params.apply_to(endpoint), RequestBody::Empty, options)
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::POST, endpoint, RequestBody::json(body)?, options)
            .await
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::POST, endpoint, RequestBody::Empty, options)
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::PUT, endpoint, RequestBody::json(body)?, options)
            .await
    }

    /// PUT without a body
    pub async fn put_empty<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::PUT, endpoint, RequestBody::Empty, options)
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::PATCH, endpoint, RequestBody::json(body)?, options)
            .await
    }

    /// PATCH without a body
    pub async fn patch_empty<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::PATCH, endpoint, RequestBody::Empty, options)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::DELETE, endpoint, RequestBody::Empty, options)
            .await
    }

    /// DELETE carrying a JSON body, used by batch removals
    pub async fn delete_with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::DELETE, endpoint, RequestBody::json(body)?, options)
            .await
    }

    /// POST a multipart form with the file and flat extra fields
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: UploadFile,
        additional_data: QueryParams,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let body = RequestBody::Multipart(MultipartBody {
            file,
            fields: additional_data,
        });
        self.request(Method::POST, endpoint, body, options).await
    }

    /// Perform one logical request.
    ///
    /// A 401 on a request that carried a token triggers one shared refresh and
    /// exactly one retry; the retry's outcome is final, so at most two requests
    /// are sent per call.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let url = self.build_url(endpoint);
        let access_token = if options.no_credential {
            None
        } else {
            self.tokens.get_access_token()
        };

        tracing::debug!(
            target: "api::client",
            method = %method,
            url = %url,
            authenticated = access_token.is_some(),
            "Sending request"
        );

        let deadline = Instant::now() + self.config.timeout;
        let response = self
            .send(&method, &url, &body, &options, access_token.as_deref(), deadline)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && access_token.is_some() {
            tracing::info!(target: "api::client", url = %url, "Access token rejected, refreshing session");
            let new_token = self.tokens.refresh_access_token().await?;
            let deadline = Instant::now() + self.config.timeout;
            let retry = self
                .send(&method, &url, &body, &options, Some(&new_token), deadline)
                .await?;
            return read_response(retry, deadline).await;
        }

        read_response(response, deadline).await
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: &RequestBody,
        options: &RequestOptions,
        access_token: Option<&str>,
        deadline: Instant,
    ) -> ApiResult<Response> {
        let mut headers = HeaderMap::new();
        if !matches!(body, RequestBody::Multipart(_)) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::validation("header", e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::validation("header", e.to_string()))?;
            headers.insert(name, value);
        }
        if let Some(token) = access_token {
            headers.insert(AUTHORIZATION, bearer(token)?);
        }

        let mut builder = self
            .http_client
            .request(method.clone(), url)
            .headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(multipart) => builder.multipart(multipart.to_form()?),
        };

        match timeout_at(deadline, builder.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                tracing::warn!(target: "api::client", url = %url, error = %err, "Request failed");
                Err(ApiError::from(err))
            }
            Err(_) => {
                tracing::warn!(
                    target: "api::client",
                    url = %url,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Request timed out"
                );
                Err(ApiError::Timeout)
            }
        }
    }
}

pub(crate) fn bearer(token: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ApiError::validation("access token", e.to_string()))
}

pub(crate) fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false)
}

/// Read the whole body before `deadline`, the same one the request was sent under
async fn read_body(response: Response, deadline: Instant) -> ApiResult<Bytes> {
    match timeout_at(deadline, response.bytes()).await {
        Ok(body) => Ok(body?),
        Err(_) => {
            tracing::warn!(target: "api::client", "Response body timed out");
            Err(ApiError::Timeout)
        }
    }
}

/// Turn a response into a value or a normalized error.
///
/// Successful responses without a JSON body decode as an empty object, which
/// covers `()`-like and all-optional targets.
async fn read_response<T: DeserializeOwned>(response: Response, deadline: Instant) -> ApiResult<T> {
    let status = response.status();

    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("");
        let body = match read_body(response, deadline).await {
            Ok(body) => body,
            Err(ApiError::Timeout) => return Err(ApiError::Timeout),
            Err(_) => Bytes::new(),
        };
        let err = ApiError::from_status(status.as_u16(), reason, &body);
        tracing::debug!(target: "api::client", status = status.as_u16(), error = %err, "Server returned an error");
        return Err(err);
    }

    let is_json = is_json_response(&response);
    let body = read_body(response, deadline).await?;
    if is_json && !body.is_empty() {
        Ok(serde_json::from_slice(&body)?)
    } else {
        empty_response()
    }
}

pub(crate) fn empty_response<T: DeserializeOwned>() -> ApiResult<T> {
    serde_json::from_value(Value::Object(Map::new()))
        .or_else(|_| serde_json::from_value(Value::Null))
        .map_err(|e| ApiError::Decode(format!("empty response body: {}", e)))
}
