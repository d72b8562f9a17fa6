use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::site::*;
use crate::query::QueryParams;
use async_trait::async_trait;
use serde_json::Value;

/// Site configuration API methods
#[async_trait]
pub trait SiteApi {
    /// Site-wide configuration, normally fetched once at startup
    async fn get_site_config(&self) -> ApiResult<SiteConfig>;

    /// Apply a partial update to the site configuration; admin only
    async fn update_site_config(&self, patch: &Value) -> ApiResult<SiteConfig>;

    /// Media decryption keys; requires elevated permissions
    async fn get_encryption_keys(&self) -> ApiResult<EncryptionKeys>;

    async fn get_cdn_config(&self) -> ApiResult<CdnConfig>;
}

#[async_trait]
impl SiteApi for Client {
    async fn get_site_config(&self) -> ApiResult<SiteConfig> {
        self.get("/config/site", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn update_site_config(&self, patch: &Value) -> ApiResult<SiteConfig> {
        self.put("/config/site", patch, RequestOptions::new())
            .await
    }

    async fn get_encryption_keys(&self) -> ApiResult<EncryptionKeys> {
        self.get("/config/encryption", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn get_cdn_config(&self) -> ApiResult<CdnConfig> {
        self.get("/config/cdn", &QueryParams::new(), RequestOptions::new())
            .await
    }
}
