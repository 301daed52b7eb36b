use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;

pub const ADMIN_HEADER: &str = "x-admin-token";

/// Whether the caller presented the configured admin token.
///
/// Never rejects; protected operations decide what a `false` means.
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub bool);

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(ADMIN_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(Admin(state.config.is_admin(presented)))
    }
}
