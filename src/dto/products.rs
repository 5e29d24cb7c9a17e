use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    customization::CustomizationGroup,
    error::{AppError, AppResult, FieldError},
    models::Product,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub area_id: Option<Uuid>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    pub badge: Option<String>,
    #[serde(default)]
    pub customization_options: Vec<CustomizationGroup>,
    pub min_order_qty: Option<i32>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        check_numbers(&mut errors, Some(self.price), self.min_order_qty);
        finish(errors)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub badge: Option<String>,
    pub customization_options: Option<Vec<CustomizationGroup>>,
    pub min_order_qty: Option<i32>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.push(FieldError::new("name", "Name must not be empty"));
        }
        check_numbers(&mut errors, self.price, self.min_order_qty);
        finish(errors)
    }
}

fn check_numbers(errors: &mut Vec<FieldError>, price: Option<Decimal>, min_order_qty: Option<i32>) {
    if price.is_some_and(|p| p.is_sign_negative()) {
        errors.push(FieldError::new("price", "Price must not be negative"));
    }
    if min_order_qty.is_some_and(|q| q < 1) {
        errors.push(FieldError::new("minOrderQty", "Minimum order must be at least 1"));
    }
}

fn finish(errors: Vec<FieldError>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_and_zero_minimum_are_rejected() {
        let req = UpdateProductRequest {
            price: Some(Decimal::from(-1)),
            min_order_qty: Some(0),
            ..Default::default()
        };
        match req.validate() {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["price", "minOrderQty"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_accepts_camel_case_payload() {
        let req: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Nasi Box Ayam",
            "price": "28000",
            "categoryId": "00000000-0000-0000-0000-000000000001",
            "minOrderQty": 10,
            "customizationOptions": [
                { "type": "Nasi", "options": [{ "name": "Nasi Putih", "harga": 0 }] }
            ]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.customization_options.len(), 1);
    }
}
