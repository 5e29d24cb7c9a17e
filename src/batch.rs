//! Splitting a checkout into one order per delivery date.

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dto::orders::{BatchOrderRequest, CustomerDetails, OrderInput, OrderItemInput},
    models::{Area, Promo},
    pricing::{self, PromoTerms},
    storefront::cart::CartLine,
};

/// A line that must be delivered on a date and in a time slot.
pub trait Scheduled {
    fn delivery_date(&self) -> Option<NaiveDate>;
    fn delivery_time(&self) -> Option<&str>;
}

impl<T: Scheduled + ?Sized> Scheduled for &T {
    fn delivery_date(&self) -> Option<NaiveDate> {
        (**self).delivery_date()
    }

    fn delivery_time(&self) -> Option<&str> {
        (**self).delivery_time()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Item {0} has no delivery date")]
    MissingDeliveryDate(usize),
    #[error("Item {0} has no delivery time")]
    MissingDeliveryTime(usize),
    #[error("All items of one order must share a delivery date")]
    MixedDeliveryDates,
}

/// Reject the whole set when it is empty or any line lacks a date or time slot.
pub fn validate_schedule<L: Scheduled>(lines: &[L]) -> Result<(), BatchError> {
    if lines.is_empty() {
        return Err(BatchError::EmptyCart);
    }
    for (index, line) in lines.iter().enumerate() {
        if line.delivery_date().is_none() {
            return Err(BatchError::MissingDeliveryDate(index));
        }
        if line.delivery_time().is_none_or(|t| t.trim().is_empty()) {
            return Err(BatchError::MissingDeliveryTime(index));
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct DateBucket<'a, L> {
    pub date: NaiveDate,
    pub lines: Vec<&'a L>,
}

/// Group lines by calendar date. Buckets keep the order in which each date
/// first appears in the input.
pub fn group_by_delivery_date<L: Scheduled>(
    lines: &[L],
) -> Result<Vec<DateBucket<'_, L>>, BatchError> {
    validate_schedule(lines)?;

    let mut buckets: Vec<DateBucket<'_, L>> = Vec::new();
    for line in lines {
        let Some(date) = line.delivery_date() else {
            continue;
        };
        match buckets.iter_mut().find(|b| b.date == date) {
            Some(bucket) => bucket.lines.push(line),
            None => buckets.push(DateBucket {
                date,
                lines: vec![line],
            }),
        }
    }
    Ok(buckets)
}

/// Build the batch request for a cart: one priced order per delivery date,
/// all using the checkout-wide area and promo.
pub fn compose(
    lines: &[CartLine],
    area: Option<&Area>,
    promo: Option<&Promo>,
    customer: &CustomerDetails,
) -> Result<BatchOrderRequest, BatchError> {
    let fees = area.map(Area::fees);
    let rule = promo.map(PromoTerms::rule);

    let orders = group_by_delivery_date(lines)?
        .into_iter()
        .map(|bucket| {
            let breakdown = pricing::compute(&bucket.lines, fees.as_ref(), rule.as_ref());
            OrderInput {
                customer: customer.clone(),
                area_id: area.map(|a| a.id),
                promo_code: promo.map(|p| p.code.clone()),
                delivery_date: Some(bucket.date),
                subtotal: breakdown.subtotal,
                delivery_fee: breakdown.delivery_fee,
                service_fee: breakdown.service_fee,
                discount: breakdown.discount,
                total: breakdown.total,
                items: bucket.lines.iter().map(|line| item_input(line)).collect(),
            }
        })
        .collect();

    Ok(BatchOrderRequest { orders })
}

fn item_input(line: &CartLine) -> OrderItemInput {
    OrderItemInput {
        product_id: line.product_id,
        product_name: Some(line.name.clone()),
        product_image: line.image.clone(),
        delivery_date: line.delivery_date,
        delivery_time: line.delivery_time.clone(),
        quantity: line.quantity,
        price: line.price,
        customization: line.customization.clone(),
        total: line.total,
    }
}

/// Human-readable order code: `ORD-<unix-millis>-<9 uppercase chars>`.
pub fn generate_order_code() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD-{millis}-{}", &suffix[..9])
}
