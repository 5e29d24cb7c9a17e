use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    batch::{self, BatchError},
    customization::{groups_from_json, unit_price},
    dto::orders::{
        BatchOrderRequest, BatchOrderResponse, OrderInput, OrderItemList, OrderList,
        OrderWithItems, UpdateOrderStatusRequest,
    },
    entity::{
        areas::Entity as Areas,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Area, Order, OrderItem},
    pricing::{self, PricingBreakdown, PromoTerms},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Paged, SortOrder},
    services::promo_service,
    state::AppState,
    storefront::checkout::OrderSubmitter,
};

pub const ORDER_STATUSES: &[&str] = &[
    "pending",
    "processing",
    "confirmed",
    "preparing",
    "shipped",
    "delivering",
    "completed",
    "cancelled",
];

pub fn is_known_status(status: &str) -> bool {
    ORDER_STATUSES.contains(&status)
}

/// Largest quantity accepted on one order line.
pub const MAX_ITEM_QUANTITY: u32 = 10_000;

fn check_quantity(index: usize, quantity: u32, min_order_qty: i32) -> AppResult<()> {
    let field = format!("items[{index}].quantity");
    if quantity == 0 || i64::from(quantity) < i64::from(min_order_qty) {
        return Err(AppError::invalid(
            &field,
            format!("Minimum order is {min_order_qty}"),
        ));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(AppError::invalid(
            &field,
            format!("Maximum order is {MAX_ITEM_QUANTITY}"),
        ));
    }
    Ok(())
}

// Money columns are NUMERIC(12, 2).
fn check_amounts(pricing: &PricingBreakdown) -> AppResult<()> {
    let limit = Decimal::from(10_000_000_000_i64);
    let fits = [pricing.subtotal, pricing.discount, pricing.total]
        .iter()
        .all(|value| value.abs() < limit);
    if fits {
        Ok(())
    } else {
        Err(AppError::invalid("total", "Order total is too large"))
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_items(&state.orm, orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = with_items(&state.orm, orders).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible(state, user, id).await?;
    let mut items = with_items(&state.orm, vec![order]).await?;
    let data = items.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn get_order_items(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderItemList>> {
    let order = find_visible(state, user, id).await?;
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::DeliveryDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(ApiResponse::success("OK", OrderItemList { items }, Some(Meta::empty())))
}

/// Owners see their own orders; admins see everything. Anyone else gets a 404
/// so order ids are not confirmed to exist.
async fn find_visible(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if user.is_admin() || order.user_id == Some(user.user_id) {
        Ok(order)
    } else {
        Err(AppError::NotFound)
    }
}

pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: OrderInput,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let user_id = user.map(|u| u.user_id);
    let now = state.config.store_now();

    let txn = state.orm.begin().await?;
    let created = insert_order(&txn, user_id, payload, now).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": created.order.id, "code": created.order.code }),
    )
    .await;
    tracing::info!(order_id = %created.order.id, "order created");

    Ok(ApiResponse::success("Order created", created, Some(Meta::empty())))
}

/// Create every order of a checkout in one transaction. Any invalid order
/// rolls back the ones inserted before it.
pub async fn create_batch(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: BatchOrderRequest,
) -> AppResult<ApiResponse<BatchOrderResponse>> {
    if payload.orders.is_empty() {
        return Err(AppError::BadRequest("Invalid batch order data".into()));
    }
    // Reject the whole batch before touching the database.
    for order in &payload.orders {
        batch::validate_schedule(&order.items)?;
    }

    let user_id = user.map(|u| u.user_id);
    let now = state.config.store_now();

    let txn = state.orm.begin().await?;
    let mut orders = Vec::with_capacity(payload.orders.len());
    for input in payload.orders {
        orders.push(insert_order(&txn, user_id, input, now).await?);
    }
    txn.commit().await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.order.id).collect();
    audit::record(
        &state.pool,
        user_id,
        "order_batch_create",
        "orders",
        serde_json::json!({ "order_ids": ids }),
    )
    .await;
    tracing::info!(orders = orders.len(), "batch orders created");

    Ok(ApiResponse::success(
        "Orders created",
        BatchOrderResponse { orders },
        Some(Meta::empty()),
    ))
}

/// Validate one order against the catalogue, recompute its pricing and
/// insert it with its items.
async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    input: OrderInput,
    now: NaiveDateTime,
) -> AppResult<OrderWithItems> {
    batch::validate_schedule(&input.items)?;
    let dates = batch::group_by_delivery_date(&input.items)?;
    if dates.len() > 1 || input.delivery_date.is_some_and(|d| d != dates[0].date) {
        return Err(BatchError::MixedDeliveryDates.into());
    }

    let customer = &input.customer;
    if customer.customer_name.trim().is_empty()
        || customer.customer_phone.trim().is_empty()
        || customer.customer_address.trim().is_empty()
    {
        return Err(AppError::invalid("customer", "Name, phone and address are required"));
    }

    let area = match input.area_id {
        Some(area_id) => {
            let area = Areas::find_by_id(area_id)
                .one(conn)
                .await?
                .map(Area::from)
                .filter(|a| a.is_active)
                .ok_or_else(|| AppError::invalid("areaId", "Area is not available"))?;
            Some(area)
        }
        None => None,
    };

    let promo = match input.promo_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(promo_service::find_valid(conn, code, now).await?),
        None => None,
    };

    let product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    for (index, item) in input.items.iter().enumerate() {
        let product = products
            .get(&item.product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::invalid(&format!("items[{index}].productId"), "Product is not available")
            })?;
        check_quantity(index, item.quantity, product.min_order_qty)?;
        let groups = groups_from_json(&product.customization_options);
        let expected_price = unit_price(product.price, &groups, &item.customization)?;
        if expected_price != item.price
            || pricing::line_total(expected_price, item.quantity) != item.total
        {
            tracing::debug!(
                product_id = %product.id,
                expected = %expected_price,
                submitted = %item.price,
                "item price mismatch"
            );
            return Err(AppError::BadRequest("Pricing mismatch".into()));
        }
    }

    let fees = area.as_ref().map(Area::fees);
    let rule = promo.as_ref().map(PromoTerms::rule);
    let expected: PricingBreakdown = pricing::compute(&input.items, fees.as_ref(), rule.as_ref());
    check_amounts(&expected)?;
    if expected != input.pricing() {
        tracing::debug!(?expected, submitted = ?input.pricing(), "order total mismatch");
        return Err(AppError::BadRequest("Pricing mismatch".into()));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        code: Set(batch::generate_order_code()),
        user_id: Set(user_id),
        area_id: Set(area.as_ref().map(|a| a.id)),
        customer_name: Set(customer.customer_name.trim().to_string()),
        customer_phone: Set(customer.customer_phone.trim().to_string()),
        customer_address: Set(customer.customer_address.trim().to_string()),
        subtotal: Set(expected.subtotal),
        delivery_fee: Set(expected.delivery_fee),
        service_fee: Set(expected.service_fee),
        discount: Set(expected.discount),
        total: Set(expected.total),
        payment_method: Set(customer.payment_method),
        status: Set("pending".into()),
        promo_code: Set(promo.as_ref().map(|p| p.code.clone())),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(input.items.len());
    for item in input.items {
        let Some(product) = products.get(&item.product_id) else {
            continue;
        };
        let (Some(delivery_date), Some(delivery_time)) = (item.delivery_date, item.delivery_time)
        else {
            continue;
        };
        let quantity = i32::try_from(item.quantity)
            .map_err(|_| AppError::invalid("quantity", "Quantity is too large"))?;
        let customization = serde_json::to_value(&item.customization)
            .map_err(|e| AppError::Internal(e.into()))?;

        let saved = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            product_name: Set(product.name.clone()),
            product_image: Set(product.image.clone()),
            delivery_date: Set(delivery_date),
            delivery_time: Set(delivery_time.trim().to_string()),
            quantity: Set(quantity),
            price: Set(item.price),
            customization: Set(customization),
            total: Set(item.total),
        }
        .insert(conn)
        .await?;
        items.push(OrderItem::from(saved));
    }

    Ok(OrderWithItems {
        order: order.into(),
        items,
    })
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = payload.status.trim().to_lowercase();
    if !is_known_status(&status) {
        return Err(AppError::invalid(
            "status",
            format!("Status must be one of: {}", ORDER_STATUSES.join(", ")),
        ));
    }

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.status.clone();

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

async fn with_items<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if !ids.is_empty() {
        let rows = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::DeliveryDate)
            .all(conn)
            .await?;
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: grouped.remove(&order.id).unwrap_or_default(),
            order: order.into(),
        })
        .collect())
}

/// Submits checkout batches in-process, as the signed-in user or as a guest.
#[derive(Clone)]
pub struct LocalSubmitter {
    pub state: AppState,
    pub user: Option<AuthUser>,
}

impl OrderSubmitter for LocalSubmitter {
    async fn submit(&self, batch: BatchOrderRequest) -> anyhow::Result<usize> {
        let resp = create_batch(&self.state, self.user.as_ref(), batch).await?;
        Ok(resp.data.map(|d| d.orders.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert!(is_known_status("pending"));
        assert!(is_known_status("delivering"));
        assert!(!is_known_status("paid"));
        assert!(!is_known_status("PENDING"));
    }

    #[test]
    fn quantity_must_sit_between_minimum_and_cap() {
        assert!(check_quantity(0, 10, 10).is_ok());
        assert!(check_quantity(0, MAX_ITEM_QUANTITY, 1).is_ok());
        assert!(matches!(check_quantity(0, 9, 10), Err(AppError::Validation(_))));
        assert!(matches!(check_quantity(0, 0, 0), Err(AppError::Validation(_))));
        match check_quantity(2, MAX_ITEM_QUANTITY + 1, 1) {
            Err(AppError::Validation(errors)) => assert_eq!(errors[0].field, "items[2].quantity"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn totals_beyond_the_money_column_are_rejected() {
        let breakdown = |subtotal: i64| PricingBreakdown {
            subtotal: Decimal::from(subtotal),
            delivery_fee: Decimal::ZERO,
            service_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::from(subtotal),
        };
        assert!(check_amounts(&breakdown(9_999_999_999)).is_ok());
        assert!(matches!(
            check_amounts(&breakdown(10_000_000_000)),
            Err(AppError::Validation(_))
        ));
    }
}
