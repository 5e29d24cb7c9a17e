use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    customization::{CustomizationGroup, validate_groups},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        areas::Entity as Areas,
        categories::Entity as Categories,
        products::{ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{Paged, ProductQuery},
    slug::{slug_or_name, slugify, with_unique_suffix},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category_id) = query.category {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(area_id) = query.area_id {
        condition = condition.add(Column::AreaId.eq(area_id));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    validate_groups(&payload.customization_options)?;
    ensure_category(state, payload.category_id).await?;
    if let Some(area_id) = payload.area_id {
        ensure_area(state, area_id).await?;
    }

    let slug = slug_or_name(payload.slug.as_deref(), &payload.name);
    if slug.is_empty() {
        return Err(AppError::invalid("slug", "Slug must contain letters or digits"));
    }
    let slug = available_slug(&state.orm, slug, None).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        original_price: Set(payload.original_price),
        image: Set(payload.image),
        category_id: Set(payload.category_id),
        area_id: Set(payload.area_id),
        rating: Set(Decimal::ZERO),
        rating_count: Set(0),
        is_active: Set(payload.is_active.unwrap_or(true)),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        badge: Set(payload.badge),
        customization_options: Set(groups_json(&payload.customization_options)?),
        min_order_qty: Set(payload.min_order_qty.unwrap_or(1)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "slug": product.slug }),
    )
    .await;
    tracing::info!(product_id = %product.id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let current_slug = existing.slug.clone();
    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(slug) = payload.slug {
        let slug = slugify(&slug);
        if slug.is_empty() {
            return Err(AppError::invalid("slug", "Slug must contain letters or digits"));
        }
        if slug != current_slug {
            active.slug = Set(available_slug(&state.orm, slug, Some(id)).await?);
        }
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(original_price) = payload.original_price {
        active.original_price = Set(Some(original_price));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(area_id) = payload.area_id {
        ensure_area(state, area_id).await?;
        active.area_id = Set(Some(area_id));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(badge) = payload.badge {
        active.badge = Set(Some(badge).filter(|b| !b.trim().is_empty()));
    }
    if let Some(groups) = payload.customization_options {
        validate_groups(&groups)?;
        active.customization_options = Set(groups_json(&groups)?);
    }
    if let Some(min_order_qty) = payload.min_order_qty {
        active.min_order_qty = Set(min_order_qty);
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

/// Product slugs never conflict: a taken slug gets a time-and-random suffix.
async fn available_slug<C: ConnectionTrait>(
    conn: &C,
    slug: String,
    exclude: Option<Uuid>,
) -> AppResult<String> {
    let mut condition = Condition::all().add(Column::Slug.eq(slug.as_str()));
    if let Some(id) = exclude {
        condition = condition.add(Column::Id.ne(id));
    }
    let taken = Products::find().filter(condition).count(conn).await? > 0;
    if taken {
        let suffixed = with_unique_suffix(&slug);
        tracing::debug!(%slug, %suffixed, "product slug taken, using suffix");
        Ok(suffixed)
    } else {
        Ok(slug)
    }
}

fn groups_json(groups: &[CustomizationGroup]) -> AppResult<serde_json::Value> {
    serde_json::to_value(groups).map_err(|e| AppError::Internal(e.into()))
}

async fn ensure_category(state: &AppState, id: Uuid) -> AppResult<()> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::invalid("categoryId", "Category does not exist"))
}

async fn ensure_area(state: &AppState, id: Uuid) -> AppResult<()> {
    Areas::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::invalid("areaId", "Area does not exist"))
}
