use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};

use crate::{
    audit,
    dto::settings::UpdateSettingsRequest,
    entity::site_settings::{ActiveModel, Entity as SiteSettingsEntity, Model, SETTINGS_ID},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::SiteSettings,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn defaults() -> Model {
    Model {
        id: SETTINGS_ID,
        site_name: "Catering Aja".into(),
        title: "Catering Aja - Solusi Katering Anda".into(),
        logo_url: None,
        favicon_url: None,
        promo_banner_enabled: false,
        promo_banner_text: None,
        promo_banner_bg_color: "#dc2626".into(),
        promo_banner_text_color: "#ffffff".into(),
        company_name: None,
        company_phone: None,
        company_address: None,
    }
}

/// Public read. Before an admin has saved anything the defaults are served.
pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<SiteSettings>> {
    let settings = SiteSettingsEntity::find_by_id(SETTINGS_ID)
        .one(&state.orm)
        .await?
        .unwrap_or_else(defaults);
    Ok(ApiResponse::success("Settings", settings.into(), None))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<SiteSettings>> {
    ensure_admin(user)?;
    if payload.site_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(AppError::invalid("siteName", "Site name must not be empty"));
    }

    let existing = SiteSettingsEntity::find_by_id(SETTINGS_ID)
        .one(&state.orm)
        .await?;
    let is_new = existing.is_none();
    let base = existing.unwrap_or_else(defaults);

    let mut active: ActiveModel = base.into_active_model();
    if let Some(v) = payload.site_name {
        active.site_name = Set(v);
    }
    if let Some(v) = payload.title {
        active.title = Set(v);
    }
    if let Some(v) = payload.logo_url {
        active.logo_url = Set(Some(v));
    }
    if let Some(v) = payload.favicon_url {
        active.favicon_url = Set(Some(v));
    }
    if let Some(v) = payload.promo_banner_enabled {
        active.promo_banner_enabled = Set(v);
    }
    if let Some(v) = payload.promo_banner_text {
        active.promo_banner_text = Set(Some(v));
    }
    if let Some(v) = payload.promo_banner_background_color {
        active.promo_banner_bg_color = Set(v);
    }
    if let Some(v) = payload.promo_banner_text_color {
        active.promo_banner_text_color = Set(v);
    }
    if let Some(v) = payload.company_name {
        active.company_name = Set(Some(v));
    }
    if let Some(v) = payload.company_phone {
        active.company_phone = Set(Some(v));
    }
    if let Some(v) = payload.company_address {
        active.company_address = Set(Some(v));
    }

    let saved = if is_new {
        // into_active_model marks every field unchanged; insert needs them set.
        active.id = Set(SETTINGS_ID);
        active.reset_all().insert(&state.orm).await?
    } else {
        active.update(&state.orm).await?
    };

    audit::record(
        &state.pool,
        Some(user.user_id),
        "settings_update",
        "site_settings",
        serde_json::json!({ "created": is_new }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings saved",
        saved.into(),
        Some(Meta::empty()),
    ))
}
