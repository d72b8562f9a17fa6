use crate::api::{require, segment};
use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::vip::*;
use crate::query::QueryParams;
use async_trait::async_trait;
use serde::de::IgnoredAny;

/// Membership plans and orders
#[async_trait]
pub trait VipApi {
    async fn get_vip_plans(&self) -> ApiResult<VipPlansResponse>;

    async fn get_vip_features(&self) -> ApiResult<VipFeaturesResponse>;

    /// Membership state of the current user
    async fn get_user_vip_status(&self) -> ApiResult<UserVipStatus>;

    /// Create an order and get the payment instructions for it
    async fn create_vip_order(
        &self,
        request: &CreateVipOrderRequest,
    ) -> ApiResult<CreateVipOrderResponse>;

    async fn get_user_vip_orders(&self, params: &VipOrdersParams) -> ApiResult<VipOrderList>;

    async fn get_vip_order_detail(&self, order_id: &str) -> ApiResult<VipOrder>;

    async fn cancel_vip_order(&self, order_id: &str) -> ApiResult<()>;

    async fn refund_vip_order(&self, order_id: &str, reason: Option<&str>) -> ApiResult<()>;

    /// Site-wide membership statistics; admin only
    async fn get_vip_stats(&self) -> ApiResult<VipStats>;

    async fn check_payment_status(&self, order_id: &str) -> ApiResult<PaymentStatus>;
}

#[async_trait]
impl VipApi for Client {
    async fn get_vip_plans(&self) -> ApiResult<VipPlansResponse> {
        self.get("/vip/plans", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn get_vip_features(&self) -> ApiResult<VipFeaturesResponse> {
        self.get("/vip/features", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn get_user_vip_status(&self) -> ApiResult<UserVipStatus> {
        self.get("/vip/status", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn create_vip_order(
        &self,
        request: &CreateVipOrderRequest,
    ) -> ApiResult<CreateVipOrderResponse> {
        require("plan id", &request.plan_id)?;
        let response: CreateVipOrderResponse = self
            .post("/vip/orders", request, RequestOptions::new())
            .await?;
        tracing::info!(
            target: "api::vip",
            order_id = %response.order.id,
            plan_id = %request.plan_id,
            "Created membership order"
        );
        Ok(response)
    }

    async fn get_user_vip_orders(&self, params: &VipOrdersParams) -> ApiResult<VipOrderList> {
        self.get(
            "/vip/orders",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_vip_order_detail(&self, order_id: &str) -> ApiResult<VipOrder> {
        require("order id", order_id)?;
        self.get(
            &format!("/vip/orders/{}", segment(order_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn cancel_vip_order(&self, order_id: &str) -> ApiResult<()> {
        require("order id", order_id)?;
        self.post_empty::<IgnoredAny>(
            &format!("/vip/orders/{}/cancel", segment(order_id)),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn refund_vip_order(&self, order_id: &str, reason: Option<&str>) -> ApiResult<()> {
        require("order id", order_id)?;
        self.post::<IgnoredAny, _>(
            &format!("/vip/orders/{}/refund", segment(order_id)),
            &RefundRequest { reason },
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn get_vip_stats(&self) -> ApiResult<VipStats> {
        self.get("/admin/vip/stats", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn check_payment_status(&self, order_id: &str) -> ApiResult<PaymentStatus> {
        require("order id", order_id)?;
        self.get(
            &format!("/vip/orders/{}/payment-status", segment(order_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }
}
