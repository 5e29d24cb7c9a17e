use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest},
    entity::{
        sessions::{ActiveModel as SessionActive, Column as SessionCol, Entity as Sessions},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel, Role},
    },
    error::{AppError, AppResult, FieldError},
    middleware::auth::{AuthUser, encode_session},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A freshly opened session: the signed cookie value plus the response body.
pub struct SignedIn {
    pub token: String,
    pub response: ApiResponse<AuthResponse>,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

// Verified against when the username is unknown, so both login failures cost one argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("catering-unknown-user").ok());

/// Constant-time check of a password against a stored PHC hash.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn register_user(state: &AppState, payload: RegisterRequest) -> AppResult<SignedIn> {
    let RegisterRequest {
        username,
        password,
        name,
        email,
        phone,
    } = payload;

    let username = username.trim().to_string();
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    }
    if password.len() < 6 {
        errors.push(FieldError::new("password", "Password must be at least 6 characters"));
    }
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        password_hash: Set(hash_password(&password)?),
        role: Set(Role::Customer),
        name: Set(Some(name)),
        email: Set(email),
        phone: Set(phone),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::unique(e, "Username is already taken"))?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "user registered");

    let token = start_session(state, &user).await?;
    Ok(SignedIn {
        token,
        response: ApiResponse::success(
            "User created",
            AuthResponse { user: user.into() },
            Some(Meta::empty()),
        ),
    })
}

pub async fn login_user(state: &AppState, payload: LoginRequest) -> AppResult<SignedIn> {
    let LoginRequest { username, password } = payload;
    let user = Users::find()
        .filter(UserCol::Username.eq(username.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(&password, hash)?;
            }
            return Err(AppError::Unauthorized);
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = start_session(state, &user).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(SignedIn {
        token,
        response: ApiResponse::success(
            "Logged in",
            AuthResponse { user: user.into() },
            Some(Meta::empty()),
        ),
    })
}

/// Store a session row and sign a cookie value that points at it.
async fn start_session(state: &AppState, user: &UserModel) -> AppResult<String> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(Duration::hours(state.config.session_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let session = SessionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        expires_at: Set(expires_at.into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    // Opportunistic cleanup of this user's dead sessions.
    Sessions::delete_many()
        .filter(SessionCol::UserId.eq(user.id))
        .filter(SessionCol::ExpiresAt.lte(now))
        .exec(&state.orm)
        .await?;

    encode_session(&state.config, user.id, session.id, user.role, expires_at)
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(ApiResponse::success("Me", model.into(), Some(Meta::empty())))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::invalid("name", "Name must not be empty"));
        }
        active.name = Set(Some(name));
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email).filter(|e| !e.trim().is_empty()));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone).filter(|p| !p.trim().is_empty()));
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

    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    Sessions::delete_by_id(user.session_id)
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_logout",
        "sessions",
        serde_json::json!({ "session_id": user.session_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_are_salted() {
        let first = hash_password("rahasia123").unwrap();
        let second = hash_password("rahasia123").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("rahasia123", &first).unwrap());
        assert!(!verify_password("salah", &first).unwrap());
    }

    #[test]
    fn unknown_user_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().expect("dummy hash");
        assert!(hash.starts_with("$argon2"));
        assert!(!verify_password("rahasia123", hash).unwrap());
    }
}
