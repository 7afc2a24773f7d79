//! Bearer-token authentication extractor.
//!
//! Extracts the access token from `Authorization: Bearer <token>` and resolves
//! it through the auth service, which rejects expired, forged and revoked
//! tokens alike.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use parley_types::auth::AuthenticatedUser;
use parley_types::identity::Identity;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller. Extracting this validates the bearer token.
pub struct CurrentUser(pub AuthenticatedUser);

impl CurrentUser {
    pub fn identity(&self) -> &Identity {
        &self.0.identity
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let user = state.auth_service.authenticate(&token).await?;
        Ok(CurrentUser(user))
    }
}

/// Extract the bearer token from request headers.
fn extract_bearer(parts: &Parts) -> Result<String, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Missing access token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
            )
        })?;

    let value = header.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}
