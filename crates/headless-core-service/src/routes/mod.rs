use crate::AppState;
use axum::Router;

pub mod api;
pub mod web;

pub fn create_router<S: AppState>() -> Router<S> {
    Router::new()
        .nest("/api", api::create_api_router())
        .fallback(web::not_rendered)
}
