use axum::Router;

use crate::state::AppState;

pub mod demo;
pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::router()
}
