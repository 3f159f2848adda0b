use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::accounts;
use crate::auth::guard::AdminUser;
use crate::db::Change;
use crate::error::AppError;
use crate::extract::Json;
use crate::models::{Role, User};
use crate::routes::auth::MessageResponse;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Anything that does not parse as an id cannot name a user.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| user_not_found())
}

async fn find_target(state: &SharedState, raw_id: &str) -> Result<User, AppError> {
    let id = parse_id(raw_id)?;
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(user_not_found)
}

/// Map a store write onto the response contract.
fn applied(change: Change) -> Result<(), AppError> {
    match change {
        Change::Applied => Ok(()),
        Change::Missing => Err(user_not_found()),
        Change::LastAdmin => Err(AppError::BadRequest(
            "Cannot remove the last remaining admin".to_string(),
        )),
    }
}

pub async fn list_users(State(state): State<SharedState>) -> Result<Json<UsersResponse>, AppError> {
    let users = state.store.list().await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let role = match req.role {
        Some(raw) => Role::try_from(raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => Role::default(),
    };

    let user =
        accounts::create_account(state.store.as_ref(), &req.email, &req.password, role).await?;

    info!(admin_id = %admin.id, user_id = %user.id, role = %user.role, "user created by admin");

    Ok((
        StatusCode::CREATED,
        MessageResponse::ok("User created successfully"),
    ))
}

pub async fn promote(
    AdminUser(admin): AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = find_target(&state, &id).await?;
    applied(state.store.set_role(target.id, Role::Admin).await?)?;

    info!(admin_id = %admin.id, user_id = %target.id, "user promoted to admin");
    Ok(MessageResponse::ok("User promoted to admin"))
}

pub async fn demote(
    AdminUser(admin): AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = find_target(&state, &id).await?;
    applied(state.store.set_role(target.id, Role::User).await?)?;

    info!(admin_id = %admin.id, user_id = %target.id, "admin demoted to user");
    Ok(MessageResponse::ok("Admin demoted to user"))
}

pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = find_target(&state, &id).await?;
    applied(state.store.delete(target.id).await?)?;

    info!(admin_id = %admin.id, user_id = %target.id, "user deleted");
    Ok(MessageResponse::ok("User deleted successfully"))
}
