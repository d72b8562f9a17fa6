pub mod actors;
pub mod auth;
pub mod search;
pub mod share;
pub mod site;
pub mod user;
pub mod videos;
pub mod vip;

pub use actors::ActorApi;
pub use auth::AuthApi;
pub use search::SearchApi;
pub use share::ShareApi;
pub use site::SiteApi;
pub use user::UserApi;
pub use videos::VideoApi;
pub use vip::VipApi;

use crate::error::{ApiError, ApiResult};
use std::borrow::Cow;

/// Reject empty identifiers before anything is sent
pub(crate) fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.is_empty() {
        return Err(ApiError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Reject mismatched password confirmations
pub(crate) fn require_confirmation(password: &str, confirmation: &str) -> ApiResult<()> {
    if password != confirmation {
        return Err(ApiError::validation(
            "confirm password",
            "does not match the password",
        ));
    }
    Ok(())
}

/// Percent-encode a value used as a path segment
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_is_rejected() {
        let err = require("video id", "").unwrap_err();
        assert_eq!(err.to_string(), "Invalid video id: must not be empty");
        assert!(require("video id", "v1").is_ok());
    }

    #[test]
    fn confirmation_must_match() {
        assert!(require_confirmation("secret1", "secret1").is_ok());
        assert!(matches!(
            require_confirmation("secret1", "secret2"),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}
