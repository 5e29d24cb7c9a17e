//! Product customization option groups and unit-price calculation.
//!
//! A product carries an ordered list of option groups. Each group is either
//! single-select (exactly one option must be chosen) or multi-select (any
//! number of add-ons, surcharges summed).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomizationOption {
    pub name: String,
    #[serde(rename = "harga", default)]
    #[schema(value_type = String)]
    pub surcharge: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationGroup {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default)]
    pub options: Vec<CustomizationOption>,
}

/// A chosen value for one option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SelectionValue {
    One(String),
    Many(Vec<String>),
}

impl SelectionValue {
    fn names(&self) -> Vec<&str> {
        match self {
            SelectionValue::One(name) => vec![name.as_str()],
            SelectionValue::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Option-group name to selected value(s). Ordered so that two selections
/// with the same content always compare (and serialise) identically.
pub type Selection = BTreeMap<String, SelectionValue>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomizationError {
    #[error("Please choose {0}")]
    MissingChoice(String),
    #[error("Only one option can be chosen for {0}")]
    TooManyChoices(String),
    #[error("Unknown option group {0}")]
    UnknownGroup(String),
    #[error("Unknown option {option} for {group}")]
    UnknownOption { group: String, option: String },
    #[error("Surcharge for {0} must not be negative")]
    NegativeSurcharge(String),
}

/// Check the option groups a product is saved with.
pub fn validate_groups(groups: &[CustomizationGroup]) -> Result<(), CustomizationError> {
    for group in groups {
        if let Some(option) = group.options.iter().find(|o| o.surcharge.is_sign_negative()) {
            return Err(CustomizationError::NegativeSurcharge(option.name.clone()));
        }
    }
    Ok(())
}

/// Parse the JSON stored on a product. Invalid or missing data yields no groups.
pub fn groups_from_json(value: &serde_json::Value) -> Vec<CustomizationGroup> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Base price plus the surcharges of every selected option.
pub fn unit_price(
    base: Decimal,
    groups: &[CustomizationGroup],
    selection: &Selection,
) -> Result<Decimal, CustomizationError> {
    if let Some(name) = selection
        .keys()
        .find(|name| !groups.iter().any(|g| &g.kind == *name))
    {
        return Err(CustomizationError::UnknownGroup(name.clone()));
    }

    let mut price = base;
    for group in groups {
        let chosen = selection.get(&group.kind).map(SelectionValue::names).unwrap_or_default();

        if group.selection_mode == SelectionMode::Single {
            match chosen.len() {
                0 => return Err(CustomizationError::MissingChoice(group.kind.clone())),
                1 => {}
                _ => return Err(CustomizationError::TooManyChoices(group.kind.clone())),
            }
        }

        for name in chosen {
            let option = group.options.iter().find(|o| o.name == name).ok_or_else(|| {
                CustomizationError::UnknownOption {
                    group: group.kind.clone(),
                    option: name.to_string(),
                }
            })?;
            price += option.surcharge;
        }
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lunch_box() -> Vec<CustomizationGroup> {
        groups_from_json(&json!([
            {
                "type": "Nasi",
                "options": [
                    { "name": "Nasi Putih", "harga": 0 },
                    { "name": "Nasi Uduk", "harga": 3000 }
                ]
            },
            {
                "type": "Ekstra",
                "selectionMode": "multi",
                "options": [
                    { "name": "Kerupuk", "harga": 2000 },
                    { "name": "Telur", "harga": 4000 }
                ]
            }
        ]))
    }

    #[test]
    fn parses_stored_groups_with_default_mode() {
        let groups = lunch_box();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].selection_mode, SelectionMode::Single);
        assert_eq!(groups[1].selection_mode, SelectionMode::Multi);
        assert_eq!(groups[0].options[1].surcharge, Decimal::from(3000));
    }

    #[test]
    fn sums_single_and_multi_surcharges() {
        let mut selection = Selection::new();
        selection.insert("Nasi".into(), SelectionValue::One("Nasi Uduk".into()));
        selection.insert(
            "Ekstra".into(),
            SelectionValue::Many(vec!["Kerupuk".into(), "Telur".into()]),
        );
        let price = unit_price(Decimal::from(25000), &lunch_box(), &selection).unwrap();
        assert_eq!(price, Decimal::from(34000));
    }

    #[test]
    fn multi_group_may_be_left_empty() {
        let mut selection = Selection::new();
        selection.insert("Nasi".into(), SelectionValue::One("Nasi Putih".into()));
        let price = unit_price(Decimal::from(25000), &lunch_box(), &selection).unwrap();
        assert_eq!(price, Decimal::from(25000));
    }

    #[test]
    fn single_group_is_required() {
        let err = unit_price(Decimal::from(25000), &lunch_box(), &Selection::new()).unwrap_err();
        assert_eq!(err, CustomizationError::MissingChoice("Nasi".into()));
    }

    #[test]
    fn rejects_unknown_names() {
        let mut selection = Selection::new();
        selection.insert("Nasi".into(), SelectionValue::One("Nasi Goreng".into()));
        assert!(matches!(
            unit_price(Decimal::ZERO, &lunch_box(), &selection),
            Err(CustomizationError::UnknownOption { .. })
        ));

        let mut selection = Selection::new();
        selection.insert("Sambal".into(), SelectionValue::One("Pedas".into()));
        assert!(matches!(
            unit_price(Decimal::ZERO, &lunch_box(), &selection),
            Err(CustomizationError::UnknownGroup(_))
        ));
    }

    #[test]
    fn selection_equality_ignores_insertion_order() {
        let mut a = Selection::new();
        a.insert("Nasi".into(), SelectionValue::One("Nasi Putih".into()));
        a.insert("Ekstra".into(), SelectionValue::Many(vec!["Telur".into()]));
        let mut b = Selection::new();
        b.insert("Ekstra".into(), SelectionValue::Many(vec!["Telur".into()]));
        b.insert("Nasi".into(), SelectionValue::One("Nasi Putih".into()));
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn negative_surcharge_is_invalid() {
        let groups = groups_from_json(&json!([
            { "type": "Nasi", "options": [{ "name": "Diskon", "harga": -1000 }] }
        ]));
        assert!(validate_groups(&groups).is_err());
    }
}
