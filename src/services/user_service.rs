use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    entity::users::{ActiveModel, Column, Entity as Users, Role},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::hash_password,
    state::AppState,
};

const DUPLICATE_USERNAME: &str = "Username is already taken";

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let items: Vec<User> = Users::find()
        .order_by_asc(Column::Username)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    payload.validate()?;

    let created = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(payload.username.trim().to_string()),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role.unwrap_or(Role::Customer)),
        name: Set(payload.name),
        email: Set(payload.email),
        phone: Set(payload.phone),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::unique(e, DUPLICATE_USERNAME))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        created.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(username) = payload.username {
        if username.trim().is_empty() {
            return Err(AppError::invalid("username", "Username must not be empty"));
        }
        active.username = Set(username.trim().to_string());
    }
    if let Some(password) = payload.password {
        if password.len() < 6 {
            return Err(AppError::invalid(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(role) = payload.role {
        if id == user.user_id && role != Role::Admin {
            return Err(AppError::BadRequest("You cannot demote yourself".into()));
        }
        active.role = Set(role);
    }
    if let Some(name) = payload.name {
        active.name = Set(Some(name));
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::unique(e, DUPLICATE_USERNAME))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", updated.into(), Some(Meta::empty())))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
