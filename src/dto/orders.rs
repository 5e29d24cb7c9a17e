use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    batch::Scheduled,
    customization::Selection,
    entity::orders::PaymentMethod,
    models::{Order, OrderItem},
    pricing::{PricedLine, PricingBreakdown, line_total},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub quantity: u32,
    /// Unit price including customization surcharges.
    pub price: Decimal,
    #[serde(default)]
    pub customization: Selection,
    pub total: Decimal,
}

impl PricedLine for OrderItemInput {
    fn line_total(&self) -> Decimal {
        line_total(self.price, self.quantity)
    }
}

impl Scheduled for OrderItemInput {
    fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    fn delivery_time(&self) -> Option<&str> {
        self.delivery_time.as_deref()
    }
}

/// One order of a checkout: every item shares the same delivery date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    #[serde(default)]
    pub area_id: Option<Uuid>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Decimal,
    pub items: Vec<OrderItemInput>,
}

impl OrderInput {
    pub fn pricing(&self) -> PricingBreakdown {
        PricingBreakdown {
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            service_fee: self.service_fee,
            discount: self.discount,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchOrderRequest {
    pub orders: Vec<OrderInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchOrderResponse {
    pub orders: Vec<OrderWithItems>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderItemList {
    #[schema(value_type = Vec<OrderItem>)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}
