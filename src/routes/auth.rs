use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest},
    error::AppResult,
    middleware::{
        auth::{AuthUser, expired_session_cookie, session_cookie},
        json::AppJson,
    },
    models::User,
    response::ApiResponse,
    services::auth_service::{
        current_user, login_user, logout_user, register_user, update_profile,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_me))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register user and start a session", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid data"),
        (status = 409, description = "Username is already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<AuthResponse>>)> {
    let signed_in = register_user(&state, payload).await?;
    let jar = jar.add(session_cookie(&state.config, signed_in.token));
    Ok((jar, Json(signed_in.response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<AuthResponse>>)> {
    let signed_in = login_user(&state, payload).await?;
    let jar = jar.add(session_cookie(&state.config, signed_in.token));
    Ok((jar, Json(signed_in.response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session ended"),
        (status = 401, description = "Not authenticated")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<serde_json::Value>>)> {
    let resp = logout_user(&state, &user).await?;
    Ok((jar.remove(expired_session_cookie()), Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = current_user(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
