use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    accounts::{
        global_id::{self, USER_TYPE},
        model::UserRecord,
    },
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest},
        jwt::JwtKeys,
        password::verify_password,
    },
    error::AccountError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn invalid_credentials() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
}

fn issue_tokens(keys: &JwtKeys, user: UserRecord) -> Result<AuthResponse, (StatusCode, String)> {
    let access_token = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: global_id::encode(USER_TYPE, user.id),
            username: user.username,
        },
    })
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let user = match state.store.find_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("login unknown username");
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(internal(e));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = user.id, "verify_password failed");
        internal(e)
    })?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }
    if !user.is_active {
        warn!(user_id = user.id, "login inactive account");
        return Err(invalid_credentials());
    }

    if let Err(e) = state
        .store
        .touch_last_login(user.id, OffsetDateTime::now_utc())
        .await
    {
        error!(error = %e, user_id = user.id, "update last_login failed");
        return Err(internal(e));
    }

    let keys = JwtKeys::from_ref(&state);
    info!(user_id = user.id, "user logged in");
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = match state.store.get(claims.sub).await {
        Ok(u) if u.is_active => u,
        Ok(_) | Err(AccountError::NotFound) => {
            return Err((StatusCode::UNAUTHORIZED, "User not found".into()));
        }
        Err(e) => {
            error!(error = %e, user_id = claims.sub, "load user failed");
            return Err(internal(e));
        }
    };

    Ok(Json(issue_tokens(&keys, user)?))
}
