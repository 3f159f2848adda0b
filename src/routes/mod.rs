pub mod admin;
pub mod auth;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::auth::guard::require_admin;
use crate::state::SharedState;

pub fn api_routes(state: SharedState) -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(admin_routes(state))
}

/// Every route here sits behind `require_admin`.
fn admin_routes(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/create-user", post(admin::create_user))
        .route("/admin/promote/{id}", put(admin::promote))
        .route("/admin/demote/{id}", put(admin::demote))
        .route("/admin/delete/{id}", delete(admin::delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
