use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
#[cfg(test)]
pub(crate) mod memory;
pub mod repo;
pub mod repo_types;

pub use repo::{ItemRepository, PgItemRepository};

pub fn router() -> Router<AppState> {
    handlers::read_routes()
}
