use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::jwt;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

/// The admin that passed `require_admin`, available to handlers behind it.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("No token provided".to_string()))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Resolve the caller behind `token` and require the admin role.
///
/// The user is re-read from the store on every call, so role changes and
/// deletions take effect on the next request.
pub async fn authorize_admin(
    store: &dyn UserStore,
    secret: &str,
    token: Option<&str>,
) -> Result<User, AppError> {
    let token = token.ok_or_else(|| AppError::Unauthenticated("No token provided".to_string()))?;

    let claims = jwt::decode_token(token, secret).map_err(|e| {
        tracing::debug!("rejected token: {e}");
        AppError::Forbidden("Invalid or expired token".to_string())
    })?;

    let user = store.find_by_id(claims.sub).await?.ok_or_else(|| {
        tracing::warn!(user_id = %claims.sub, "token subject no longer exists");
        AppError::Unauthenticated("User no longer exists".to_string())
    })?;

    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, "non-admin denied admin access");
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(user)
}

/// Route layer guarding every admin route.
pub async fn require_admin(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // The body is not Sync; no borrow of `req` may cross the await.
    let token = bearer_token(req.headers()).map(str::to_owned);
    let user = authorize_admin(
        state.store.as_ref(),
        &state.config.jwt_secret,
        token.as_deref(),
    )
    .await?;

    req.extensions_mut().insert(AdminUser(user));
    Ok(next.run(req).await)
}
