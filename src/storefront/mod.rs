//! Shopper-side state: cart, remembered choices and the signed-in user,
//! persisted in a key-value store and hydrated on start.

pub mod cart;
pub mod checkout;
pub mod preferences;
pub mod storage;

use cart::Cart;
use preferences::Preferences;
use storage::KeyValueStore;

use crate::models::User;

pub const USER_KEY: &str = "user";

#[derive(Debug)]
pub struct Storefront<S> {
    store: S,
    pub cart: Cart<S>,
    pub preferences: Preferences<S>,
    user: Option<User>,
}

impl<S: KeyValueStore + Clone> Storefront<S> {
    pub fn hydrate(store: S) -> Self {
        let user = match store.get(USER_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .inspect_err(|err| tracing::warn!(error = %err, "discarding corrupt user state"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "user state unreadable");
                None
            }
        };
        Self {
            cart: Cart::hydrate(store.clone()),
            preferences: Preferences::hydrate(store.clone()),
            store,
            user,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn sign_in(&mut self, user: User) {
        let result = serde_json::to_string(&user)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.store.set(USER_KEY, &raw));
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist user");
        }
        self.user = Some(user);
    }

    /// Forget the user and empty the cart. Area and date choices stay.
    pub fn sign_out(&mut self) {
        if let Err(err) = self.store.remove(USER_KEY) {
            tracing::warn!(error = %err, "failed to remove user state");
        }
        self.user = None;
        self.cart.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::{
        customization::Selection, entity::users::Role, storefront::cart::NewCartLine,
        storefront::storage::MemoryStore,
    };

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "sari".into(),
            role: Role::Customer,
            name: Some("Sari".into()),
            email: None,
            phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sign_out_clears_user_and_cart_but_keeps_preferences() {
        let store = MemoryStore::new();
        let mut front = Storefront::hydrate(store.clone());
        front.sign_in(user());
        front.preferences.set_area(Some("depok".into()));
        front.cart.add_item(NewCartLine {
            product_id: Uuid::new_v4(),
            name: "Snack Box".into(),
            image: None,
            price: Decimal::from(15000),
            quantity: 2,
            customization: Selection::new(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            delivery_time: Some("10:00-12:00".into()),
        });

        let restored = Storefront::hydrate(store.clone());
        assert_eq!(restored.user().map(|u| u.username.as_str()), Some("sari"));
        assert_eq!(restored.cart.item_count(), 2);

        front.sign_out();
        let restored = Storefront::hydrate(store);
        assert!(restored.user().is_none());
        assert!(restored.cart.is_empty());
        assert_eq!(restored.preferences.selected_area(), Some("depok"));
    }
}
