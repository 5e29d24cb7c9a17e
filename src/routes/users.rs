use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::User,
    response::ApiResponse,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", put(update_user).delete(delete_user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Create user", body = ApiResponse<User>),
        (status = 409, description = "Username is already taken")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = user_service::create_user(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = ApiResponse<User>),
        (status = 404, description = "User not found")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_user(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted user"),
        (status = 400, description = "Cannot delete your own account")
    ),
    security(("session_cookie" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_user(&state, &user, id).await?;
    Ok(Json(resp))
}
