use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, SqlErr};
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
    slug::{slug_or_name, slugify},
    state::AppState,
};

const DUPLICATE_SLUG: &str = "Category slug must be unique";

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Category", category.into(), None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let slug = slug_or_name(payload.slug.as_deref(), &payload.name);
    if slug.is_empty() {
        return Err(AppError::invalid("slug", "Slug must contain letters or digits"));
    }
    if let Some(parent_id) = payload.parent_id {
        ensure_exists(state, parent_id).await?;
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        is_active: Set(payload.is_active.unwrap_or(true)),
        parent_id: Set(payload.parent_id),
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::unique(e, DUPLICATE_SLUG))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
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
    if let Some(parent_id) = payload.parent_id {
        if parent_id == id {
            return Err(AppError::invalid("parentId", "A category cannot be its own parent"));
        }
        ensure_exists(state, parent_id).await?;
        active.parent_id = Set(Some(parent_id));
    }

    let category = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::unique(e, DUPLICATE_SLUG))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        category.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::Conflict("Category still has products".into())
            }
            _ => AppError::from(e),
        })?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

async fn ensure_exists(state: &AppState, id: Uuid) -> AppResult<()> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::invalid("parentId", "Parent category does not exist"))
}
