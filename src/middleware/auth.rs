use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{ActiveEnum, ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::Claims,
    entity::{
        sessions::{Column as SessionCol, Entity as Sessions},
        users::{Entity as Users, Role},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "catering_session";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub session_id: Uuid,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Sign the cookie value for a stored session.
pub fn encode_session(
    config: &AppConfig,
    user_id: Uuid,
    session_id: Uuid,
    role: Role,
    expires_at: chrono::DateTime<Utc>,
) -> AppResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        role: role.to_value(),
        exp: expires_at.timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_session(config: &AppConfig, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Resolve a cookie value to the signed-in user. The session row must still
/// exist and be unexpired, and the role is read fresh from the user row.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = decode_session(&state.config, token)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let session_id = Uuid::parse_str(&claims.sid).map_err(|_| AppError::Unauthorized)?;

    let session = Sessions::find_by_id(session_id)
        .filter(SessionCol::UserId.eq(user_id))
        .filter(SessionCol::ExpiresAt.gt(Utc::now()))
        .one(&state.orm)
        .await?;
    if session.is_none() {
        return Err(AppError::Unauthorized);
    }

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
        session_id,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthorized)?;
        authenticate(state, &token).await
    }
}

/// The signed-in user when there is one. Guests get `None` instead of a 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn config() -> AppConfig {
        AppConfig::for_database("postgres://unused")
    }

    #[test]
    fn session_token_round_trips() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let token = encode_session(
            &config(),
            user_id,
            session_id,
            Role::Admin,
            Utc::now() + Duration::hours(24),
        )
        .unwrap();

        let claims = decode_session(&config(), &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.sid, session_id.to_string());
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn tampered_or_expired_tokens_are_unauthorized() {
        let token = encode_session(
            &config(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Role::Customer,
            Utc::now() - Duration::hours(2),
        )
        .unwrap();
        assert!(matches!(
            decode_session(&config(), &token),
            Err(AppError::Unauthorized)
        ));

        let mut other = config();
        other.session_secret = "another-secret".into();
        let token = encode_session(
            &other,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Role::Customer,
            Utc::now() + Duration::hours(1),
        )
        .unwrap();
        assert!(matches!(
            decode_session(&config(), &token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn admin_check() {
        let mut user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
            session_id: Uuid::new_v4(),
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
        user.role = Role::Admin;
        assert!(ensure_admin(&user).is_ok());
    }

    #[test]
    fn cookie_is_http_only() {
        let cookie = session_cookie(&config(), "abc".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
