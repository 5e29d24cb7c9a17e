use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};

use super::storage::KeyValueStore;

pub const SELECTED_AREA_KEY: &str = "selected_area";
pub const SELECTED_DATE_KEY: &str = "selected_date";

/// The shopper's chosen delivery area (by slug) and delivery date.
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
    area: Option<String>,
    date: Option<NaiveDate>,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn hydrate(store: S) -> Self {
        let area = load(&store, SELECTED_AREA_KEY);
        let date = load(&store, SELECTED_DATE_KEY);
        Self { store, area, date }
    }

    pub fn selected_area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn set_area(&mut self, slug: Option<String>) {
        save(&self.store, SELECTED_AREA_KEY, slug.as_ref());
        self.area = slug;
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        save(&self.store, SELECTED_DATE_KEY, date.as_ref());
        self.date = date;
    }
}

fn load<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(err) => {
            tracing::warn!(error = %err, key, "preference unreadable");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, key, "discarding corrupt preference");
            None
        }
    }
}

fn save<T: Serialize>(store: &impl KeyValueStore, key: &str, value: Option<&T>) {
    let result = match value {
        Some(value) => serde_json::to_string(value)
            .map_err(anyhow::Error::from)
            .and_then(|raw| store.set(key, &raw)),
        None => store.remove(key),
    };
    if let Err(err) = result {
        tracing::warn!(error = %err, key, "failed to persist preference");
    }
}
