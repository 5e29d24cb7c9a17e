use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage::KeyValueStore;
use crate::{
    batch::Scheduled,
    customization::Selection,
    pricing::{self, PricedLine},
};

pub const CART_KEY: &str = "cart";

/// One buyable configuration waiting for checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    /// Unit price including customization surcharges.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub customization: Selection,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub total: Decimal,
}

impl CartLine {
    fn same_configuration(&self, other: &NewCartLine) -> bool {
        self.product_id == other.product_id
            && self.customization == other.customization
            && self.delivery_date == other.delivery_date
            && self.delivery_time == other.delivery_time
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total = pricing::line_total(self.price, quantity);
    }
}

impl PricedLine for CartLine {
    fn line_total(&self) -> Decimal {
        self.total
    }
}

impl Scheduled for CartLine {
    fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    fn delivery_time(&self) -> Option<&str> {
        self.delivery_time.as_deref()
    }
}

/// What the product page hands to the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartLine {
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub customization: Selection,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
}

/// Cart lines persisted in a key-value store under [`CART_KEY`].
#[derive(Debug)]
pub struct Cart<S> {
    store: S,
    lines: Vec<CartLine>,
}

impl<S: KeyValueStore> Cart<S> {
    /// Load the persisted cart. Unreadable or corrupt state is dropped and
    /// the cart starts empty.
    pub fn hydrate(store: S) -> Self {
        let lines = match store.get(CART_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => lines,
                Err(err) => {
                    tracing::warn!(error = %err, "discarding corrupt cart state");
                    if let Err(err) = store.remove(CART_KEY) {
                        tracing::warn!(error = %err, "failed to remove corrupt cart state");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "cart state unreadable, starting empty");
                Vec::new()
            }
        };
        Self { store, lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging into an existing one with the same product,
    /// customization and delivery slot. Returns the id of the affected line.
    pub fn add_item(&mut self, item: NewCartLine) -> Uuid {
        let id = match self.lines.iter_mut().find(|l| l.same_configuration(&item)) {
            Some(line) => {
                let quantity = line.quantity.saturating_add(item.quantity);
                line.set_quantity(quantity);
                line.id
            }
            None => {
                let line = CartLine {
                    id: Uuid::new_v4(),
                    total: pricing::line_total(item.price, item.quantity),
                    product_id: item.product_id,
                    name: item.name,
                    image: item.image,
                    price: item.price,
                    quantity: item.quantity,
                    customization: item.customization,
                    delivery_date: item.delivery_date,
                    delivery_time: item.delivery_time,
                };
                let id = line.id;
                self.lines.push(line);
                id
            }
        };
        self.persist();
        id
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update_quantity(&mut self, id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
            line.set_quantity(quantity);
            self.persist();
        }
    }

    pub fn remove_item(&mut self, id: Uuid) {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        if self.lines.len() != before {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(|l| l.total).sum()
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.lines)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.store.set(CART_KEY, &raw));
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist cart");
        }
    }
}
