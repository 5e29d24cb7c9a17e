use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};

use crate::{
    dto::settings::UpdateSettingsRequest,
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::SiteSettings,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pengaturan", get(get_settings))
        .route("/site-settings", put(update_settings))
}

#[utoipa::path(
    get,
    path = "/api/pengaturan",
    responses(
        (status = 200, description = "Public site settings", body = ApiResponse<SiteSettings>)
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SiteSettings>>> {
    let resp = settings_service::get_settings(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/site-settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = ApiResponse<SiteSettings>),
        (status = 403, description = "Admin only")
    ),
    security(("session_cookie" = [])),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<SiteSettings>>> {
    let resp = settings_service::update_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}
