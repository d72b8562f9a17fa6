//! # Vidstream API Client
//!
//! An async Rust client for the Vidstream video site API with automatic
//! access token refresh.
//!
//! ## Features
//!
//! - Single-flight token refresh on `401 Unauthorized`, retrying the request once
//! - Request timeouts and normalized errors
//! - Retry with exponential backoff, TTL response cache and bounded batch requests
//! - Multipart uploads with progress reporting
//! - Typed methods for every site endpoint
//!
//! ## Example
//!
//! ```no_run
//! use vidstream_api::api::{AuthApi, VideoApi};
//! use vidstream_api::models::video::VideoListParams;
//! use vidstream_api::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new("https://vidstream.example.com"));
//!
//!     // Tokens are stored on the client and refreshed when they expire
//!     let auth = client.login("viewer", "secret123").await?;
//!     println!("Hello, {}!", auth.user.username);
//!
//!     let page = client
//!         .get_videos(&VideoListParams {
//!             tags: Some(vec!["travel".into(), "food".into()]),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} videos", page.total);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod batch;
pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod retry;
pub mod token;
pub mod upload;

pub use batch::{batch_request, BatchOptions};
pub use cache::{ResponseCache, DEFAULT_CACHE_TTL};
pub use client::{Client, ClientConfig, RequestBody, RequestOptions};
pub use error::{ApiError, ApiResult};
pub use query::{QueryParams, QueryValue};
pub use retry::{with_retry, RetryOptions};
pub use token::{MemoryTokenStore, TokenManager, TokenPair, TokenStore};
pub use upload::{UploadFile, UploadOptions};
