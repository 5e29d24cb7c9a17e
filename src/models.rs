use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    customization::{CustomizationGroup, Selection, groups_from_json},
    entity::{
        areas, categories, order_items,
        orders::{self, PaymentMethod},
        products, promos, site_settings,
        users::{self, Role},
    },
    pricing::{DiscountRule, DiscountType, FeeSchedule, PromoTerms},
};

/// A user as returned by the API. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub parent_id: Option<Uuid>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            is_active: model.is_active,
            parent_id: model.parent_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Area {
    pub fn fees(&self) -> FeeSchedule {
        FeeSchedule {
            delivery_fee: self.delivery_fee,
            service_fee: self.service_fee,
        }
    }
}

impl From<areas::Model> for Area {
    fn from(model: areas::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            is_active: model.is_active,
            delivery_fee: model.delivery_fee,
            service_fee: model.service_fee,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub area_id: Option<Uuid>,
    pub rating: Decimal,
    pub rating_count: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub badge: Option<String>,
    pub customization_options: Vec<CustomizationGroup>,
    pub min_order_qty: i32,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            original_price: model.original_price,
            image: model.image,
            category_id: model.category_id,
            area_id: model.area_id,
            rating: model.rating,
            rating_count: model.rating_count,
            is_active: model.is_active,
            is_featured: model.is_featured,
            badge: model.badge,
            customization_options: groups_from_json(&model.customization_options),
            min_order_qty: model.min_order_qty,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Promo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl PromoTerms for Promo {
    fn code(&self) -> &str {
        &self.code
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    fn rule(&self) -> DiscountRule {
        DiscountRule {
            kind: self.discount_type,
            value: self.discount_value,
        }
    }
}

impl From<promos::Model> for Promo {
    fn from(model: promos::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            code: model.code,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub code: String,
    pub user_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub status: String,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            user_id: model.user_id,
            area_id: model.area_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            customer_address: model.customer_address,
            subtotal: model.subtotal,
            delivery_fee: model.delivery_fee,
            service_fee: model.service_fee,
            discount: model.discount,
            total: model.total,
            payment_method: model.payment_method,
            status: model.status,
            promo_code: model.promo_code,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub delivery_date: NaiveDate,
    pub delivery_time: String,
    pub quantity: i32,
    pub price: Decimal,
    pub customization: Selection,
    pub total: Decimal,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_image: model.product_image,
            delivery_date: model.delivery_date,
            delivery_time: model.delivery_time,
            quantity: model.quantity,
            price: model.price,
            customization: serde_json::from_value(model.customization).unwrap_or_default(),
            total: model.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub site_name: String,
    pub title: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub promo_banner_enabled: bool,
    pub promo_banner_text: Option<String>,
    pub promo_banner_background_color: String,
    pub promo_banner_text_color: String,
    pub company_name: Option<String>,
    pub company_phone: Option<String>,
    pub company_address: Option<String>,
}

impl From<site_settings::Model> for SiteSettings {
    fn from(model: site_settings::Model) -> Self {
        Self {
            site_name: model.site_name,
            title: model.title,
            logo_url: model.logo_url,
            favicon_url: model.favicon_url,
            promo_banner_enabled: model.promo_banner_enabled,
            promo_banner_text: model.promo_banner_text,
            promo_banner_background_color: model.promo_banner_bg_color,
            promo_banner_text_color: model.promo_banner_text_color,
            company_name: model.company_name,
            company_phone: model.company_phone,
            company_address: model.company_address,
        }
    }
}
