use serde::{Deserialize, Serialize};

/// Referral program settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareConfig {
    /// Free views granted on a referred registration
    pub register_reward: u32,
    pub first_purchase_reward_percent: f64,
    pub renewal_reward_percent: f64,
    pub min_withdraw_amount: f64,
    /// Value of one coin in RMB
    pub coin_to_rmb_rate: f64,
    pub free_views_per_invite: u32,
    pub views_per_video: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareStats {
    pub total_coins: f64,
    pub total_invites: u64,
    pub monthly_earnings: f64,
    pub free_views: u64,
    pub pending_rewards: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDataResponse {
    pub config: ShareConfig,
    pub stats: ShareStats,
    pub invite_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InviteClickRequest<'a> {
    pub invite_code: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EarningsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
