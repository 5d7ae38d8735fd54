use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{ItemPublic, ItemsPublic};
use crate::{error::AppError, pagination::Pagination, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/", get(list_items))
        .route("/items/:ingame_id", get(get_item))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    page: Pagination,
) -> Result<Json<ItemsPublic>, AppError> {
    let total = state.items.count().await?;
    let data: Vec<ItemPublic> = state
        .items
        .list(page.skip, page.limit)
        .await?
        .into_iter()
        .map(ItemPublic::from)
        .collect();
    Ok(Json(ItemsPublic {
        count: data.len(),
        data,
        total,
    }))
}

#[instrument(skip(state, path))]
pub async fn get_item(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ItemPublic>, AppError> {
    let Path(ingame_id) = path.map_err(|e| AppError::validation("ingame_id", e.body_text()))?;
    if ingame_id < 1 {
        return Err(AppError::validation(
            "ingame_id",
            "ingame_id must be greater than or equal to 1",
        ));
    }
    match state.items.get_by_ingame_id(ingame_id).await? {
        Some(record) => Ok(Json(record.into())),
        None => {
            warn!(%ingame_id, "item not found");
            Err(AppError::NotFound("Item not found".into()))
        }
    }
}
