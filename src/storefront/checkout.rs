use std::future::Future;

use chrono::NaiveDateTime;
use thiserror::Error;

use super::{
    cart::{Cart, CartLine},
    preferences::Preferences,
    storage::KeyValueStore,
};
use crate::{
    batch::{self, BatchError},
    dto::orders::{BatchOrderRequest, CustomerDetails},
    models::{Area, Promo},
    pricing::{self, PricingBreakdown, PromoError, PromoTerms},
};

/// Where a composed batch is sent. Returns how many orders were created.
pub trait OrderSubmitter {
    fn submit(
        &self,
        batch: BatchOrderRequest,
    ) -> impl Future<Output = anyhow::Result<usize>> + Send;
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Schedule(#[from] BatchError),
    #[error(transparent)]
    Promo(#[from] PromoError),
    #[error("{0} is required")]
    MissingDetail(&'static str),
    #[error("Failed to submit orders")]
    Submit(#[source] anyhow::Error),
}

/// The checkout-wide choices: one area and at most one promo for every
/// order in the batch.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    area: Option<Area>,
    promo: Option<Promo>,
}

impl Checkout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preselect the area remembered in preferences, if it is still offered.
    pub fn for_preferences<S: KeyValueStore>(prefs: &Preferences<S>, areas: &[Area]) -> Self {
        let area = prefs
            .selected_area()
            .and_then(|slug| areas.iter().find(|a| a.slug == slug && a.is_active))
            .cloned();
        Self { area, promo: None }
    }

    pub fn area(&self) -> Option<&Area> {
        self.area.as_ref()
    }

    pub fn promo(&self) -> Option<&Promo> {
        self.promo.as_ref()
    }

    pub fn select_area(&mut self, area: Option<Area>) {
        self.area = area;
    }

    /// Apply a code from the published promos. A code that does not apply
    /// leaves the current promo untouched.
    pub fn apply_promo(
        &mut self,
        code: &str,
        promos: &[Promo],
        now: NaiveDateTime,
    ) -> Result<&Promo, CheckoutError> {
        let promo = pricing::find_promo(promos, code, now)?.clone();
        Ok(self.promo.insert(promo))
    }

    pub fn clear_promo(&mut self) {
        self.promo = None;
    }

    /// Totals across the whole cart, as shown before submitting.
    pub fn summary(&self, lines: &[CartLine]) -> PricingBreakdown {
        let fees = self.area.as_ref().map(Area::fees);
        let rule = self.promo.as_ref().map(PromoTerms::rule);
        pricing::compute(lines, fees.as_ref(), rule.as_ref())
    }

    pub fn compose(
        &self,
        lines: &[CartLine],
        customer: &CustomerDetails,
    ) -> Result<BatchOrderRequest, CheckoutError> {
        validate_customer(customer)?;
        let batch = batch::compose(lines, self.area.as_ref(), self.promo.as_ref(), customer)?;
        Ok(batch)
    }

    /// Compose and send one order per delivery date. The cart is emptied
    /// only after the submitter reports success.
    pub async fn submit<S, T>(
        &self,
        cart: &mut Cart<S>,
        customer: &CustomerDetails,
        submitter: &T,
    ) -> Result<usize, CheckoutError>
    where
        S: KeyValueStore,
        T: OrderSubmitter,
    {
        let batch = self.compose(cart.lines(), customer)?;
        let count = submitter.submit(batch).await.map_err(CheckoutError::Submit)?;
        cart.clear();
        tracing::info!(orders = count, "checkout submitted");
        Ok(count)
    }
}

fn validate_customer(customer: &CustomerDetails) -> Result<(), CheckoutError> {
    if customer.customer_name.trim().is_empty() {
        return Err(CheckoutError::MissingDetail("Customer name"));
    }
    if customer.customer_phone.trim().is_empty() {
        return Err(CheckoutError::MissingDetail("Customer phone"));
    }
    if customer.customer_address.trim().is_empty() {
        return Err(CheckoutError::MissingDetail("Customer address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::{
        customization::Selection,
        entity::orders::PaymentMethod,
        pricing::DiscountType,
        storefront::{cart::NewCartLine, storage::MemoryStore},
    };

    #[derive(Default)]
    struct RecordingSubmitter {
        fail: bool,
        received: Mutex<Vec<BatchOrderRequest>>,
    }

    impl OrderSubmitter for RecordingSubmitter {
        async fn submit(&self, batch: BatchOrderRequest) -> anyhow::Result<usize> {
            let count = batch.orders.len();
            self.received.lock().unwrap().push(batch);
            if self.fail {
                anyhow::bail!("server unavailable");
            }
            Ok(count)
        }
    }

    fn area() -> Area {
        Area {
            id: Uuid::new_v4(),
            name: "Jakarta Selatan".into(),
            slug: "jakarta-selatan".into(),
            is_active: true,
            delivery_fee: Decimal::from(5000),
            service_fee: Decimal::from(2000),
            created_at: Utc::now(),
        }
    }

    fn promo(code: &str, kind: DiscountType, value: i64) -> Promo {
        Promo {
            id: Uuid::new_v4(),
            title: code.into(),
            description: None,
            code: code.into(),
            discount_type: kind,
            discount_value: Decimal::from(value),
            start_date: None,
            end_date: None,
            is_active: true,
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            customer_name: "Budi".into(),
            customer_phone: "081234".into(),
            customer_address: "Jl. Kenanga 5".into(),
            payment_method: PaymentMethod::Transfer,
        }
    }

    fn item(price: i64, quantity: u32, day: u32, time: Option<&str>) -> NewCartLine {
        NewCartLine {
            product_id: Uuid::new_v4(),
            name: "Tumpeng".into(),
            image: None,
            price: Decimal::from(price),
            quantity,
            customization: Selection::new(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 6, day),
            delivery_time: time.map(str::to_string),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn summary_matches_worked_examples() {
        let mut cart = Cart::hydrate(MemoryStore::new());
        cart.add_item(item(25000, 2, 10, Some("08:00-10:00")));
        cart.add_item(item(15000, 1, 10, Some("08:00-10:00")));

        let promos = vec![
            promo("HEMAT15", DiscountType::Percent, 15),
            promo("POTONG25", DiscountType::Amount, 25000),
        ];
        let mut checkout = Checkout::new();
        checkout.select_area(Some(area()));

        checkout.apply_promo("hemat15", &promos, now()).unwrap();
        assert_eq!(checkout.summary(cart.lines()).total, Decimal::from(62250));

        checkout.apply_promo("POTONG25", &promos, now()).unwrap();
        assert_eq!(checkout.summary(cart.lines()).total, Decimal::from(47000));

        assert!(checkout.apply_promo("NOPE", &promos, now()).is_err());
        assert_eq!(checkout.promo().map(|p| p.code.as_str()), Some("POTONG25"));

        checkout.clear_promo();
        assert_eq!(checkout.summary(cart.lines()).discount, Decimal::ZERO);
    }

    #[test]
    fn preselects_remembered_area() {
        let store = MemoryStore::new();
        let mut prefs = Preferences::hydrate(store);
        prefs.set_area(Some("jakarta-selatan".into()));

        let checkout = Checkout::for_preferences(&prefs, &[area()]);
        assert_eq!(checkout.area().map(|a| a.slug.as_str()), Some("jakarta-selatan"));

        prefs.set_area(Some("bandung".into()));
        assert!(Checkout::for_preferences(&prefs, &[area()]).area().is_none());
    }

    #[tokio::test]
    async fn successful_submit_clears_cart() {
        let mut cart = Cart::hydrate(MemoryStore::new());
        cart.add_item(item(25000, 1, 10, Some("08:00-10:00")));
        cart.add_item(item(30000, 1, 11, Some("12:00-14:00")));

        let submitter = RecordingSubmitter::default();
        let count = Checkout::new()
            .submit(&mut cart, &customer(), &submitter)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert!(cart.is_empty());
        let received = submitter.received.lock().unwrap();
        assert_eq!(received[0].orders.len(), 2);
        assert_eq!(received[0].orders[0].items.len(), 1);
    }

    #[tokio::test]
    async fn failed_submit_keeps_cart() {
        let mut cart = Cart::hydrate(MemoryStore::new());
        cart.add_item(item(25000, 1, 10, Some("08:00-10:00")));

        let submitter = RecordingSubmitter {
            fail: true,
            ..Default::default()
        };
        let err = Checkout::new()
            .submit(&mut cart, &customer(), &submitter)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Submit(_)));
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn invalid_schedule_never_reaches_submitter() {
        let mut cart = Cart::hydrate(MemoryStore::new());
        cart.add_item(item(25000, 1, 10, Some("08:00-10:00")));
        cart.add_item(item(25000, 1, 11, None));

        let submitter = RecordingSubmitter::default();
        let err = Checkout::new()
            .submit(&mut cart, &customer(), &submitter)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Schedule(BatchError::MissingDeliveryTime(1))
        ));
        assert!(submitter.received.lock().unwrap().is_empty());
        assert_eq!(cart.lines().len(), 2);
    }

    #[tokio::test]
    async fn customer_details_are_required() {
        let mut cart = Cart::hydrate(MemoryStore::new());
        cart.add_item(item(25000, 1, 10, Some("08:00-10:00")));
        let mut details = customer();
        details.customer_address = "  ".into();

        let err = Checkout::new()
            .submit(&mut cart, &details, &RecordingSubmitter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingDetail(_)));
    }
}
