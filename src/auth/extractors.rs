use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::TokenError;
use crate::{error::AppError, state::AppState, users::User};

/// Pulls the token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    match header.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized("Not authenticated".into())),
    }
}

/// Authenticated, active user loaded from the store.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state.jwt.verify(token).map_err(|e| {
            match &e {
                TokenError::Expired => warn!("expired token"),
                TokenError::Invalid(reason) => warn!(%reason, "invalid token"),
            }
            AppError::Unauthorized("Could not validate credentials".into())
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject not found");
                AppError::NotFound("User not found".into())
            })?;

        if !user.is_active {
            warn!(user_id = %user.id, "inactive user");
            return Err(AppError::BadRequest("Inactive user".into()));
        }

        Ok(CurrentUser(user))
    }
}

/// [`CurrentUser`] that also carries the superuser flag.
pub struct SuperUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for SuperUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_superuser(&user)?;
        Ok(SuperUser(user))
    }
}

pub fn require_superuser(user: &User) -> Result<(), AppError> {
    if user.is_superuser {
        Ok(())
    } else {
        warn!(user_id = %user.id, "superuser required");
        Err(AppError::Forbidden(
            "The user doesn't have enough privileges".into(),
        ))
    }
}
