use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

/// `{ success, message, data }` wrapper used by some endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into an error
    pub fn into_data(self) -> ApiResult<T> {
        if !self.success {
            return Err(ApiError::Other(
                self.message.unwrap_or_else(|| "Request failed".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Decode("missing data in response envelope".to_string()))
    }
}

/// Page/limit pair accepted by most listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Time window of popularity rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    All,
}

/// Inclusive `YYYY-MM-DD` date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Toggle result for likes of videos and comments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub is_liked: bool,
    pub like_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_payload() {
        let ok: Envelope<u32> = serde_json::from_str(r#"{"success":true,"data":7}"#).unwrap();
        assert_eq!(ok.into_data().unwrap(), 7);

        let failed: Envelope<u32> =
            serde_json::from_str(r#"{"success":false,"message":"Share disabled","data":null}"#)
                .unwrap();
        assert_eq!(failed.into_data().unwrap_err().to_string(), "Share disabled");
    }

    #[test]
    fn page_params_skip_missing_fields() {
        let json = serde_json::to_value(PageParams {
            page: None,
            limit: Some(20),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "limit": 20 }));
    }
}
