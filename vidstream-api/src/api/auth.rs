use crate::api::{require, require_confirmation, segment};
use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::auth::*;
use crate::query::QueryParams;
use crate::upload::{UploadFile, UploadOptions};
use async_trait::async_trait;
use serde::de::IgnoredAny;

const AVATAR_MAX_SIZE: u64 = 5 * 1024 * 1024;
const AVATAR_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Account and session API methods
#[async_trait]
pub trait AuthApi {
    /// Log in and store the returned token pair
    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse>;

    /// Create an account and store the returned token pair
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse>;

    /// Exchange the stored refresh token for a new access token
    async fn refresh_token(&self) -> ApiResult<String>;

    async fn get_current_user(&self) -> ApiResult<User>;

    /// End the session on the server and always drop the local tokens
    async fn logout(&self) -> ApiResult<()>;

    async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResult<User>;

    async fn change_password(&self, request: &ChangePasswordRequest) -> ApiResult<()>;

    async fn send_email_verification(&self, email: &str) -> ApiResult<()>;

    async fn verify_email(&self, request: &VerifyEmailRequest) -> ApiResult<()>;

    /// Send a password reset email
    async fn send_password_reset(&self, email: &str) -> ApiResult<()>;

    async fn reset_password(&self, request: &ResetPasswordRequest) -> ApiResult<()>;

    async fn check_username_availability(&self, username: &str) -> ApiResult<Availability>;

    async fn check_email_availability(&self, email: &str) -> ApiResult<Availability>;

    /// Upload a JPEG, PNG or WebP avatar of at most 5 MiB
    async fn upload_avatar(&self, file: UploadFile) -> ApiResult<AvatarResponse>;

    async fn get_user_sessions(&self) -> ApiResult<Vec<UserSession>>;

    async fn terminate_session(&self, session_id: &str) -> ApiResult<()>;

    async fn terminate_all_other_sessions(&self) -> ApiResult<()>;
}

#[async_trait]
impl AuthApi for Client {
    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        require("username", username)?;
        require("password", password)?;

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .post("/auth/login", &request, RequestOptions::new().no_credential())
            .await?;

        self.tokens()
            .set_tokens(&response.access_token, &response.refresh_token)?;
        tracing::info!(target: "api::auth", user_id = %response.user.id, "Logged in");
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        require("username", &request.username)?;
        require("email", &request.email)?;
        require_confirmation(&request.password, &request.confirm_password)?;

        let response: AuthResponse = self
            .post("/auth/register", request, RequestOptions::new().no_credential())
            .await?;

        self.tokens()
            .set_tokens(&response.access_token, &response.refresh_token)?;
        tracing::info!(target: "api::auth", user_id = %response.user.id, "Registered new account");
        Ok(response)
    }

    async fn refresh_token(&self) -> ApiResult<String> {
        self.tokens().refresh_access_token().await
    }

    async fn get_current_user(&self) -> ApiResult<User> {
        self.get("/auth/me", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn logout(&self) -> ApiResult<()> {
        let result = self
            .post_empty::<IgnoredAny>("/auth/logout", RequestOptions::new())
            .await;
        if let Err(err) = &result {
            tracing::warn!(target: "api::auth", error = %err, "Server logout failed, clearing local session anyway");
        }

        self.tokens().clear_tokens()?;
        tracing::info!(target: "api::auth", "Logged out");
        result.map(|_| ())
    }

    async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResult<User> {
        self.put("/auth/profile", request, RequestOptions::new())
            .await
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> ApiResult<()> {
        require_confirmation(&request.new_password, &request.confirm_password)?;
        self.put::<IgnoredAny, _>("/auth/password", request, RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn send_email_verification(&self, email: &str) -> ApiResult<()> {
        require("email", email)?;
        self.post::<IgnoredAny, _>(
            "/auth/send-verification",
            &EmailRequest { email },
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> ApiResult<()> {
        self.post::<IgnoredAny, _>("/auth/verify-email", request, RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn send_password_reset(&self, email: &str) -> ApiResult<()> {
        require("email", email)?;
        self.post::<IgnoredAny, _>(
            "/auth/forgot-password",
            &EmailRequest { email },
            RequestOptions::new().no_credential(),
        )
        .await
        .map(|_| ())
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> ApiResult<()> {
        require("reset token", &request.token)?;
        require_confirmation(&request.new_password, &request.confirm_password)?;
        self.post::<IgnoredAny, _>(
            "/auth/reset-password",
            request,
            RequestOptions::new().no_credential(),
        )
        .await
        .map(|_| ())
    }

    async fn check_username_availability(&self, username: &str) -> ApiResult<Availability> {
        self.get(
            "/auth/check-username",
            &QueryParams::new().insert("username", username),
            RequestOptions::new().no_credential(),
        )
        .await
    }

    async fn check_email_availability(&self, email: &str) -> ApiResult<Availability> {
        self.get(
            "/auth/check-email",
            &QueryParams::new().insert("email", email),
            RequestOptions::new().no_credential(),
        )
        .await
    }

    async fn upload_avatar(&self, file: UploadFile) -> ApiResult<AvatarResponse> {
        UploadOptions::new()
            .with_max_size(AVATAR_MAX_SIZE)
            .with_allowed_types(AVATAR_TYPES)
            .validate(&file)?;

        self.upload("/auth/avatar", file, QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn get_user_sessions(&self) -> ApiResult<Vec<UserSession>> {
        self.get("/auth/sessions", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn terminate_session(&self, session_id: &str) -> ApiResult<()> {
        require("session id", session_id)?;
        self.delete::<IgnoredAny>(
            &format!("/auth/sessions/{}", segment(session_id)),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn terminate_all_other_sessions(&self) -> ApiResult<()> {
        self.delete::<IgnoredAny>("/auth/sessions/others", RequestOptions::new())
            .await
            .map(|_| ())
    }
}
