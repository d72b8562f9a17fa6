use crate::api::require;
use crate::client::{Client, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::models::common::Envelope;
use crate::models::share::*;
use crate::query::QueryParams;
use async_trait::async_trait;
use serde_json::Value;

/// Referral program API methods.
///
/// These endpoints wrap their payload in a `{ success, message, data }`
/// envelope, which is unwrapped before returning.
#[async_trait]
pub trait ShareApi {
    /// Referral settings, the user's referral stats and invite link
    async fn get_share_data(&self) -> ApiResult<ShareDataResponse>;

    async fn record_invite_click(&self, invite_code: &str) -> ApiResult<()>;

    async fn get_invite_earnings(&self, params: &EarningsParams) -> ApiResult<Value>;
}

#[async_trait]
impl ShareApi for Client {
    async fn get_share_data(&self) -> ApiResult<ShareDataResponse> {
        self.get::<Envelope<ShareDataResponse>>(
            "/share/data",
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await?
        .into_data()
    }

    async fn record_invite_click(&self, invite_code: &str) -> ApiResult<()> {
        require("invite code", invite_code)?;
        let envelope: Envelope<Value> = self
            .post(
                "/share/click",
                &InviteClickRequest { invite_code },
                RequestOptions::new(),
            )
            .await?;
        if envelope.success {
            Ok(())
        } else {
            Err(ApiError::Other(
                envelope
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            ))
        }
    }

    async fn get_invite_earnings(&self, params: &EarningsParams) -> ApiResult<Value> {
        self.get::<Envelope<Value>>(
            "/share/earnings",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await?
        .into_data()
    }
}
