use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::areas::{AreaList, CreateAreaRequest, UpdateAreaRequest},
    entity::areas::{ActiveModel, Column, Entity as Areas},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Area,
    response::{ApiResponse, Meta},
    slug::{slug_or_name, slugify},
    state::AppState,
};

const DUPLICATE_SLUG: &str = "Area slug must be unique";

pub async fn list_areas(state: &AppState) -> AppResult<ApiResponse<AreaList>> {
    let items: Vec<Area> = Areas::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Area::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Areas",
        AreaList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_area(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Area>> {
    let area = Areas::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Area", area.into(), None))
}

pub async fn create_area(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAreaRequest,
) -> AppResult<ApiResponse<Area>> {
    ensure_admin(user)?;
    payload.validate()?;

    let slug = slug_or_name(payload.slug.as_deref(), &payload.name);
    if slug.is_empty() {
        return Err(AppError::invalid("slug", "Slug must contain letters or digits"));
    }

    let area = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        is_active: Set(payload.is_active.unwrap_or(true)),
        delivery_fee: Set(payload.delivery_fee),
        service_fee: Set(payload.service_fee),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::unique(e, DUPLICATE_SLUG))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "area_create",
        "areas",
        serde_json::json!({ "area_id": area.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Area created",
        area.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_area(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAreaRequest,
) -> AppResult<ApiResponse<Area>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Areas::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::invalid("name", "Name must not be empty"));
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(slug) = payload.slug {
        let slug = slugify(&slug);
        if slug.is_empty() {
            return Err(AppError::invalid("slug", "Slug must contain letters or digits"));
        }
        active.slug = Set(slug);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(fee) = payload.delivery_fee {
        active.delivery_fee = Set(fee);
    }
    if let Some(fee) = payload.service_fee {
        active.service_fee = Set(fee);
    }

    let area = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::unique(e, DUPLICATE_SLUG))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "area_update",
        "areas",
        serde_json::json!({ "area_id": area.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", area.into(), Some(Meta::empty())))
}

pub async fn delete_area(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Areas::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "area_delete",
        "areas",
        serde_json::json!({ "area_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
