use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipPlan {
    pub id: String,
    pub name: String,
    /// Price in cents
    pub price: u64,
    pub original_price: Option<u64>,
    /// Display label, e.g. "1 month"
    pub duration: String,
    pub duration_days: u32,
    /// Accent color configured server-side
    pub color: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
    pub badge: Option<String>,
    pub order: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipPlansResponse {
    pub plans: Vec<VipPlan>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipFeature {
    pub id: String,
    /// Icon name
    pub icon: String,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipFeaturesResponse {
    pub features: Vec<VipFeature>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Alipay,
    Wechat,
    BankCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VipOrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipOrder {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub plan: VipPlan,
    /// Cents
    pub amount: u64,
    pub payment_method: PaymentMethod,
    pub status: VipOrderStatus,
    pub paid_at: Option<String>,
    pub expired_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVipOrderRequest {
    pub plan_id: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub payment_url: Option<String>,
    pub qr_code: Option<String>,
    pub order_no: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVipOrderResponse {
    pub order: VipOrder,
    pub payment_info: PaymentInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVipStatus {
    pub is_vip: bool,
    pub current_plan: Option<VipPlan>,
    pub expired_at: Option<String>,
    pub remaining_days: Option<u32>,
    #[serde(default)]
    pub auto_renew: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub today: u64,
    pub this_month: u64,
    pub this_year: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipStats {
    pub total_users: u64,
    pub vip_users: u64,
    pub vip_rate: f64,
    pub popular_plan: VipPlan,
    pub revenue: Revenue,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VipOrdersParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VipOrderStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipOrderList {
    pub orders: Vec<VipOrder>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefundRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub status: VipOrderStatus,
    pub paid_at: Option<String>,
}
