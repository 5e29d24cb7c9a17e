use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::areas::{AreaList, CreateAreaRequest, UpdateAreaRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Area,
    response::ApiResponse,
    services::area_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_areas).post(create_area))
        .route("/{id}", get(get_area).put(update_area).delete(delete_area))
}

#[utoipa::path(
    get,
    path = "/api/areas",
    responses(
        (status = 200, description = "List delivery areas", body = ApiResponse<AreaList>)
    ),
    tag = "Areas"
)]
pub async fn list_areas(State(state): State<AppState>) -> AppResult<Json<ApiResponse<AreaList>>> {
    let resp = area_service::list_areas(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/areas/{id}",
    params(("id" = Uuid, Path, description = "Area ID")),
    responses(
        (status = 200, description = "Get area", body = ApiResponse<Area>),
        (status = 404, description = "Area not found")
    ),
    tag = "Areas"
)]
pub async fn get_area(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Area>>> {
    let resp = area_service::get_area(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/areas",
    request_body = CreateAreaRequest,
    responses(
        (status = 201, description = "Create area", body = ApiResponse<Area>),
        (status = 409, description = "Area slug must be unique")
    ),
    security(("session_cookie" = [])),
    tag = "Areas"
)]
pub async fn create_area(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateAreaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Area>>)> {
    let resp = area_service::create_area(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/areas/{id}",
    params(("id" = Uuid, Path, description = "Area ID")),
    request_body = UpdateAreaRequest,
    responses(
        (status = 200, description = "Updated area", body = ApiResponse<Area>)
    ),
    security(("session_cookie" = [])),
    tag = "Areas"
)]
pub async fn update_area(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateAreaRequest>,
) -> AppResult<Json<ApiResponse<Area>>> {
    let resp = area_service::update_area(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/areas/{id}",
    params(("id" = Uuid, Path, description = "Area ID")),
    responses(
        (status = 200, description = "Deleted area"),
        (status = 404, description = "Area not found")
    ),
    security(("session_cookie" = [])),
    tag = "Areas"
)]
pub async fn delete_area(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = area_service::delete_area(&state, &user, id).await?;
    Ok(Json(resp))
}
