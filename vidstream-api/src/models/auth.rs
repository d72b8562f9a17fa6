use serde::{Deserialize, Serialize};

/// Account summary counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryStats {
    /// Minutes watched
    pub total_watch_time: u64,
    pub favorite_count: u64,
    pub history_count: u64,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_vip: bool,
    pub vip_level: Option<u8>,
    pub vip_expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
    pub stats: Option<UserSummaryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login and registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

/// Password change; the confirmation never leaves the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Password reset with the emailed token; the confirmation never leaves the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_url: String,
}

/// Logged-in device session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub device_type: String,
    pub device_name: String,
    pub ip_address: String,
    pub location: String,
    pub is_current: bool,
    pub last_active_at: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_is_not_sent() {
        let body = serde_json::to_value(ChangePasswordRequest {
            current_password: "old".into(),
            new_password: "new-secret".into(),
            confirm_password: "new-secret".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "currentPassword": "old", "newPassword": "new-secret" })
        );
    }

    #[test]
    fn auth_response_decodes() {
        let json = r#"{
            "user": {"id":"u1","username":"alice","email":"a@example.com","isVip":false,
                     "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"},
            "accessToken":"at","refreshToken":"rt","expiresIn":3600
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.username, "alice");
        assert!(response.user.avatar.is_none());
        assert_eq!(response.expires_in, 3600);
    }
}
