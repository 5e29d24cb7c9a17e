use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, FieldError},
    models::Area,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAreaRequest {
    pub name: String,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub service_fee: Decimal,
}

impl CreateAreaRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        check_fees(&mut errors, Some(self.delivery_fee), Some(self.service_fee));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAreaRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    pub delivery_fee: Option<Decimal>,
    pub service_fee: Option<Decimal>,
}

impl UpdateAreaRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        check_fees(&mut errors, self.delivery_fee, self.service_fee);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

fn check_fees(errors: &mut Vec<FieldError>, delivery: Option<Decimal>, service: Option<Decimal>) {
    if delivery.is_some_and(|f| f.is_sign_negative()) {
        errors.push(FieldError::new("deliveryFee", "Fee must not be negative"));
    }
    if service.is_some_and(|f| f.is_sign_negative()) {
        errors.push(FieldError::new("serviceFee", "Fee must not be negative"));
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct AreaList {
    #[schema(value_type = Vec<Area>)]
    pub items: Vec<Area>,
}
