use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::promos::{CreatePromoRequest, PromoList, UpdatePromoRequest, ValidatePromoRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Promo,
    response::ApiResponse,
    services::promo_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promos).post(create_promo))
        .route("/validate", post(validate_promo))
        .route("/{id}", put(update_promo).delete(delete_promo))
}

#[utoipa::path(
    get,
    path = "/api/promos",
    responses(
        (status = 200, description = "List promos", body = ApiResponse<PromoList>)
    ),
    tag = "Promos"
)]
pub async fn list_promos(State(state): State<AppState>) -> AppResult<Json<ApiResponse<PromoList>>> {
    let resp = promo_service::list_promos(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promos/validate",
    request_body = ValidatePromoRequest,
    responses(
        (status = 200, description = "Promo applies today", body = ApiResponse<Promo>),
        (status = 400, description = "Promo code is invalid or no longer valid")
    ),
    tag = "Promos"
)]
pub async fn validate_promo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ValidatePromoRequest>,
) -> AppResult<Json<ApiResponse<Promo>>> {
    let resp = promo_service::validate_code(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promos",
    request_body = CreatePromoRequest,
    responses(
        (status = 201, description = "Create promo", body = ApiResponse<Promo>),
        (status = 409, description = "Promo code must be unique")
    ),
    security(("session_cookie" = [])),
    tag = "Promos"
)]
pub async fn create_promo(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreatePromoRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Promo>>)> {
    let resp = promo_service::create_promo(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/promos/{id}",
    params(("id" = Uuid, Path, description = "Promo ID")),
    request_body = UpdatePromoRequest,
    responses(
        (status = 200, description = "Updated promo", body = ApiResponse<Promo>),
        (status = 404, description = "Promo not found")
    ),
    security(("session_cookie" = [])),
    tag = "Promos"
)]
pub async fn update_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdatePromoRequest>,
) -> AppResult<Json<ApiResponse<Promo>>> {
    let resp = promo_service::update_promo(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/promos/{id}",
    params(("id" = Uuid, Path, description = "Promo ID")),
    responses(
        (status = 200, description = "Deleted promo"),
        (status = 404, description = "Promo not found")
    ),
    security(("session_cookie" = [])),
    tag = "Promos"
)]
pub async fn delete_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = promo_service::delete_promo(&state, &user, id).await?;
    Ok(Json(resp))
}
