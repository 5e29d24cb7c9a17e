use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::users::Role,
    error::{AppError, AppResult, FieldError},
    models::User,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if self.password.len() < 6 {
            errors.push(FieldError::new("password", "Password must be at least 6 characters"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
