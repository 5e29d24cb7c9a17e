use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::sea_query::{Expr, Func};
use uuid::Uuid;

use crate::{
    audit,
    dto::promos::{CreatePromoRequest, PromoList, UpdatePromoRequest, ValidatePromoRequest},
    entity::promos::{ActiveModel, Column, Entity as Promos},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Promo,
    pricing::{self, PromoError},
    response::{ApiResponse, Meta},
    state::AppState,
};

const DUPLICATE_CODE: &str = "Promo code must be unique";

pub async fn list_promos(state: &AppState) -> AppResult<ApiResponse<PromoList>> {
    let items: Vec<Promo> = Promos::find()
        .order_by_asc(Column::Code)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Promo::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Promos",
        PromoList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Look up a code the way checkout does: trimmed, case-insensitive, and only
/// while the promo is active and inside its window.
pub async fn validate_code(
    state: &AppState,
    payload: ValidatePromoRequest,
) -> AppResult<ApiResponse<Promo>> {
    let code = payload.code.trim();
    if code.is_empty() {
        return Err(PromoError::EmptyCode.into());
    }
    let promo = find_valid(&state.orm, code, state.config.store_now()).await?;
    Ok(ApiResponse::success("Promo applied", promo, Some(Meta::empty())))
}

/// Resolve a code for server-side pricing.
pub async fn find_valid<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    now: NaiveDateTime,
) -> AppResult<Promo> {
    let candidates: Vec<Promo> = Promos::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::Code))).eq(code.trim().to_lowercase()))
        .all(conn)
        .await?
        .into_iter()
        .map(Promo::from)
        .collect();
    Ok(pricing::find_promo(&candidates, code, now)?.clone())
}

pub async fn create_promo(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromoRequest,
) -> AppResult<ApiResponse<Promo>> {
    ensure_admin(user)?;
    payload.validate()?;

    let promo = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        code: Set(payload.code.trim().to_string()),
        discount_type: Set(payload.discount_type),
        discount_value: Set(payload.discount_value),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        is_active: Set(payload.is_active.unwrap_or(true)),
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::unique(e, DUPLICATE_CODE))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "promo_create",
        "promos",
        serde_json::json!({ "promo_id": promo.id, "code": promo.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Promo created",
        promo.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_promo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePromoRequest,
) -> AppResult<ApiResponse<Promo>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Promos::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    payload.validate_against(&existing)?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(code) = payload.code {
        active.code = Set(code.trim().to_string());
    }
    if let Some(kind) = payload.discount_type {
        active.discount_type = Set(kind);
    }
    if let Some(value) = payload.discount_value {
        active.discount_value = Set(value);
    }
    if let Some(start) = payload.start_date {
        active.start_date = Set(Some(start));
    }
    if let Some(end) = payload.end_date {
        active.end_date = Set(Some(end));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let promo = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::unique(e, DUPLICATE_CODE))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "promo_update",
        "promos",
        serde_json::json!({ "promo_id": promo.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", promo.into(), Some(Meta::empty())))
}

pub async fn delete_promo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Promos::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "promo_delete",
        "promos",
        serde_json::json!({ "promo_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
