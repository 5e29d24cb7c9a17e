use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, FieldError},
    entity::promos,
    models::Promo,
    pricing::DiscountType,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoRequest {
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl CreatePromoRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.code.trim().is_empty() {
            errors.push(FieldError::new("code", "Code is required"));
        }
        check_terms(
            &mut errors,
            Some(self.discount_type),
            Some(self.discount_value),
            self.start_date,
            self.end_date,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl UpdatePromoRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.code.as_deref().is_some_and(|c| c.trim().is_empty()) {
            errors.push(FieldError::new("code", "Code must not be empty"));
        }
        check_terms(
            &mut errors,
            self.discount_type,
            self.discount_value,
            self.start_date,
            self.end_date,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Check the terms the stored promo ends up with once this update is applied.
    pub fn validate_against(&self, current: &promos::Model) -> AppResult<()> {
        let mut errors = Vec::new();
        check_terms(
            &mut errors,
            Some(self.discount_type.unwrap_or(current.discount_type)),
            Some(self.discount_value.unwrap_or(current.discount_value)),
            self.start_date.or(current.start_date),
            self.end_date.or(current.end_date),
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

fn check_terms(
    errors: &mut Vec<FieldError>,
    kind: Option<DiscountType>,
    value: Option<Decimal>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) {
    if let Some(value) = value {
        if value.is_sign_negative() {
            errors.push(FieldError::new("discountValue", "Discount must not be negative"));
        } else if kind == Some(DiscountType::Percent) && value > Decimal::ONE_HUNDRED {
            errors.push(FieldError::new("discountValue", "Percent discount must be at most 100"));
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.push(FieldError::new("endDate", "End date must not be before start date"));
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePromoRequest {
    pub code: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromoList {
    #[schema(value_type = Vec<Promo>)]
    pub items: Vec<Promo>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn stored(kind: DiscountType, value: i64) -> promos::Model {
        promos::Model {
            id: Uuid::new_v4(),
            title: "Hemat".into(),
            description: None,
            code: "HEMAT".into(),
            discount_type: kind,
            discount_value: Decimal::from(value),
            start_date: None,
            end_date: None,
            is_active: true,
        }
    }

    fn rejected_field(result: AppResult<()>) -> String {
        match result {
            Err(AppError::Validation(errors)) => errors[0].field.clone(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn value_change_is_checked_against_stored_percent_type() {
        let update = UpdatePromoRequest {
            discount_value: Some(Decimal::from(500)),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        let field = rejected_field(update.validate_against(&stored(DiscountType::Percent, 10)));
        assert_eq!(field, "discountValue");
        assert!(update.validate_against(&stored(DiscountType::Amount, 10)).is_ok());
    }

    #[test]
    fn type_change_is_checked_against_stored_value() {
        let update = UpdatePromoRequest {
            discount_type: Some(DiscountType::Percent),
            ..Default::default()
        };
        let field = rejected_field(update.validate_against(&stored(DiscountType::Amount, 50000)));
        assert_eq!(field, "discountValue");
        assert!(update.validate_against(&stored(DiscountType::Amount, 20)).is_ok());
    }

    #[test]
    fn merged_dates_must_be_ordered() {
        let mut current = stored(DiscountType::Amount, 5000);
        current.start_date = NaiveDate::from_ymd_opt(2026, 5, 10);
        let update = UpdatePromoRequest {
            end_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            ..Default::default()
        };
        assert_eq!(rejected_field(update.validate_against(&current)), "endDate");
    }

    #[test]
    fn create_rejects_percent_above_hundred() {
        let create = CreatePromoRequest {
            title: "Hemat".into(),
            description: None,
            code: "HEMAT".into(),
            discount_type: DiscountType::Percent,
            discount_value: Decimal::from(150),
            start_date: None,
            end_date: None,
            is_active: None,
        };
        assert_eq!(rejected_field(create.validate()), "discountValue");
    }
}
