use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leave", post(handlers::apply_leave).get(handlers::list_leaves))
        .route("/leave/:id", get(handlers::get_leave))
}
