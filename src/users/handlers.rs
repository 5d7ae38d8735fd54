use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{
        Message, UpdatePassword, UserCreate, UserPublic, UserRegister, UserUpdate, UserUpdateMe,
        UsersPublic,
    },
    services::{self, NAME_MAX_LEN},
};
use crate::{
    auth::extractors::{require_superuser, CurrentUser, SuperUser},
    error::{AppError, ValidJson},
    pagination::Pagination,
    state::AppState,
};

const NO_SUCH_NAME: &str = "The user with this name does not exist in the system";

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route("/users/signup", post(register_user))
        .route("/users/me", get(read_user_me).patch(update_user_me).delete(delete_user_me))
        .route("/users/me/password", patch(update_password_me))
        .route("/users/:name", get(read_user).patch(update_user).delete(delete_user))
}

/// Path name, capped at the column width.
fn user_name(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    let Path(name) = path.map_err(|e| AppError::validation("name", e.body_text()))?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(AppError::validation(
            "name",
            format!("name must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    Ok(name)
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    SuperUser(_admin): SuperUser,
    page: Pagination,
) -> Result<Json<UsersPublic>, AppError> {
    let total = state.users.count().await?;
    let data: Vec<UserPublic> = state
        .users
        .list(page.skip, page.limit)
        .await?
        .into_iter()
        .map(UserPublic::from)
        .collect();
    Ok(Json(UsersPublic {
        count: data.len(),
        data,
        total,
    }))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn create_user(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    ValidJson(payload): ValidJson<UserCreate>,
) -> Result<Json<UserPublic>, AppError> {
    let user = services::create_user(state.users.as_ref(), payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<UserRegister>,
) -> Result<Json<UserPublic>, AppError> {
    let user = services::create_user(state.users.as_ref(), payload.into()).await?;
    info!(user_id = %user.id, "user signed up");
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn read_user_me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_user_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(payload): ValidJson<UserUpdateMe>,
) -> Result<Json<UserPublic>, AppError> {
    let updated = services::update_user(state.users.as_ref(), &user, payload.into()).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_password_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(payload): ValidJson<UpdatePassword>,
) -> Result<Json<Message>, AppError> {
    services::change_password(
        state.users.as_ref(),
        &user,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    Ok(Json(Message::new("Password updated successfully")))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_user_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Message>, AppError> {
    services::delete_user(state.users.as_ref(), &user, &user).await?;
    Ok(Json(Message::new("User deleted successfully")))
}

/// Any user may read themselves; reading others needs superuser.
#[instrument(skip(state, current, path), fields(user_id = %current.id))]
pub async fn read_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<UserPublic>, AppError> {
    let name = user_name(path)?;
    if name == current.name {
        return Ok(Json(current.into()));
    }
    require_superuser(&current)?;
    let user = state
        .users
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_SUCH_NAME.into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, admin, path, payload), fields(admin_id = %admin.id))]
pub async fn update_user(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    path: Result<Path<String>, PathRejection>,
    ValidJson(payload): ValidJson<UserUpdate>,
) -> Result<Json<UserPublic>, AppError> {
    let name = user_name(path)?;
    let user = state
        .users
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_SUCH_NAME.into()))?;
    let updated = services::update_user(state.users.as_ref(), &user, payload).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state, admin, path), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Message>, AppError> {
    let name = user_name(path)?;
    let user = state
        .users
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    services::delete_user(state.users.as_ref(), &admin, &user).await?;
    Ok(Json(Message::new("User deleted successfully")))
}
