//! Dashboard login and password change

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use argos_common::config::SessionConfig;
use argos_common::credentials::generate_session_token;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// `Set-Cookie` value for a fresh session token
pub fn session_cookie(session: &SessionConfig, token: &str, remember_me: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        session.cookie_name, token
    );
    if remember_me {
        let max_age = u64::from(session.remember_me_days) * 24 * 60 * 60;
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    cookie
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .credentials
        .authenticate(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            argos_common::Error::Authentication => {
                warn!("Rejected login for '{}'", request.username);
                ApiError::Unauthorized
            }
            other => ApiError::Common(other),
        })?;

    if outcome.upgraded {
        info!("Upgraded legacy password hash for '{}'", request.username);
    }

    let token = generate_session_token();
    let cookie = session_cookie(&state.session, &token, request.remember_me);

    let body = LoginResponse {
        token,
        user: LoginUser {
            username: request.username,
        },
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

/// POST /api/profile/password
pub async fn update_password(
    State(state): State<AppState>,
    Json(request): Json<PasswordUpdateRequest>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .credentials
        .change_password(&request.old_password, &request.new_password)
        .await
        .map_err(|e| match e {
            argos_common::Error::Authentication => {
                ApiError::BadRequest("Current password is incorrect.".to_string())
            }
            other => ApiError::Common(other),
        })?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/profile/password", post(update_password))
}
