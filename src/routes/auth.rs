use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts;
use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::error::AppError;
use crate::extract::Json;
use crate::models::user::normalize_email;
use crate::models::Role;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let user =
        accounts::create_account(state.store.as_ref(), &req.email, &req.password, Role::User)
            .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        MessageResponse::ok("User created successfully"),
    ))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

pub async fn login(
    State(state): State<SharedState>,
    body: Result<Json<LoginRequest>, AppError>,
) -> Result<Json<TokenResponse>, AppError> {
    // An unreadable login body is a failed login.
    let Json(req) = body.map_err(|e| {
        warn!("unreadable login body: {e}");
        invalid_credentials()
    })?;
    let email = normalize_email(&req.email);

    let Some(user) = state.store.find_by_email(&email).await? else {
        password::verify_dummy(&req.password);
        warn!(email = %email, "login for unknown email");
        return Err(invalid_credentials());
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(invalid_credentials());
    }

    let token = encode_token(&Claims::new(user.id), &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
