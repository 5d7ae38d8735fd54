use axum::{
    extract::{rejection::FormRejection, State},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::extractors::CurrentUser;
use crate::{
    error::AppError,
    state::AppState,
    users::{dto::UserPublic, services::authenticate},
};

/// OAuth2 password-flow form body. Extra fields such as `grant_type` are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

pub fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/login/access-token", post(login_access_token))
        .route("/login/test-token", post(test_token))
}

#[instrument(skip(state, form))]
pub async fn login_access_token(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<Token>, AppError> {
    let Form(form) = form.map_err(|e| AppError::validation("form", e.body_text()))?;

    let authenticated = authenticate(state.users.as_ref(), &form.username, &form.password).await?;
    let Some(user) = authenticated else {
        warn!(username = %form.username, "login failed");
        return Err(AppError::BadRequest("Incorrect username or password".into()));
    };
    if !user.is_active {
        warn!(user_id = %user.id, "login by inactive user");
        return Err(AppError::BadRequest("Inactive user".into()));
    }

    let access_token = state.jwt.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(Token {
        access_token,
        token_type: "bearer".into(),
    }))
}

/// Echoes the user behind the presented token.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn test_token(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}
