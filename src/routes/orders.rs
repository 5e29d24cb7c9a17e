use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        BatchOrderRequest, BatchOrderResponse, OrderInput, OrderItemList, OrderList,
        OrderWithItems, UpdateOrderStatusRequest,
    },
    error::AppResult,
    middleware::{
        auth::{AuthUser, MaybeUser},
        json::AppJson,
    },
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/batch", post(create_batch))
        .route("/my-orders", get(my_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/items", get(get_order_items))
        .route("/{id}/status", put(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by creation time"),
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 403, description = "Admin only")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    responses(
        (status = 200, description = "Orders of the signed-in user", body = ApiResponse<OrderList>),
        (status = 401, description = "Not authenticated")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order items", body = ApiResponse<OrderItemList>),
        (status = 404, description = "Order not found")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn get_order_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderItemList>>> {
    let resp = order_service::get_order_items(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderInput,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid order or pricing mismatch")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    AppJson(payload): AppJson<OrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::create_order(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/orders/batch",
    request_body = BatchOrderRequest,
    responses(
        (status = 201, description = "One order per delivery date", body = ApiResponse<BatchOrderResponse>),
        (status = 400, description = "Invalid batch; nothing was saved")
    ),
    tag = "Orders"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    AppJson(payload): AppJson<BatchOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BatchOrderResponse>>)> {
    let resp = order_service::create_batch(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 403, description = "Admin only")
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
