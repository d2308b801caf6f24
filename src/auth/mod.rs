use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::session_routes())
}
