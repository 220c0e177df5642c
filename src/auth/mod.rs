use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod credentials;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod repo;
pub mod reset;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/forget-password", post(handlers::forget_password))
        .route("/send-otp", post(handlers::send_otp))
        .route("/verify-otp", post(handlers::verify_otp))
        .route(
            "/profile",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
}
