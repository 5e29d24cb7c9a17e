use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Category,
    response::ApiResponse,
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Get category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Create category", body = ApiResponse<Category>),
        (status = 409, description = "Category slug must be unique")
    ),
    security(("session_cookie" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let resp = category_service::create_category(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated category", body = ApiResponse<Category>),
        (status = 409, description = "Category slug must be unique")
    ),
    security(("session_cookie" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::update_category(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted category"),
        (status = 404, description = "Category not found")
    ),
    security(("session_cookie" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_category(&state, &user, id).await?;
    Ok(Json(resp))
}
