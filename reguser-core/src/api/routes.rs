//! API routes definition

use super::handlers;
use super::middleware::{require_basic_auth, track_requests};
use super::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // User routes
        .route("/user/create", post(handlers::create_user))
        .route("/user/read", get(handlers::read_user))
        .route("/user/delete", delete(handlers::delete_user))
        .route("/user/search", get(handlers::search_users))
        .route("/user/get_groups", get(handlers::groups_of_user))
        .route("/user/add_group", get(handlers::add_user_to_group))
        .route("/user/delete_group", get(handlers::remove_user_from_group))
        // Group routes
        .route("/group/create", post(handlers::create_group))
        .route("/group/read", get(handlers::read_group))
        .route("/group/delete", delete(handlers::delete_group))
        .route("/group/search", get(handlers::search_groups))
        .route("/group/get_users", get(handlers::users_of_group))
        .route("/group/add_user", get(handlers::add_user_to_group))
        .route("/group/delete_user", get(handlers::remove_user_from_group))
        // Auth runs inside accounting so rejected requests are counted too
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .route_layer(middleware::from_fn(track_requests))
        .with_state(state)
}
