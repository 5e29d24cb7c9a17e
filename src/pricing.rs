//! Order pricing: subtotal, area fees, promo discount and total.
//!
//! Everything here is a pure function of its inputs so the storefront and
//! the server can derive the same breakdown independently.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percent")]
    Percent,
    #[sea_orm(string_value = "amount")]
    Amount,
}

/// Fees charged by a delivery area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountRule {
    pub kind: DiscountType,
    pub value: Decimal,
}

impl DiscountRule {
    /// Percent discounts round half away from zero to whole currency units.
    /// Amount discounts apply verbatim and are not capped by the subtotal.
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        match self.kind {
            DiscountType::Percent => (subtotal * self.value / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            DiscountType::Amount => self.value,
        }
    }
}

/// Anything that contributes a line total to an order.
pub trait PricedLine {
    fn line_total(&self) -> Decimal;
}

impl<T: PricedLine + ?Sized> PricedLine for &T {
    fn line_total(&self) -> Decimal {
        (**self).line_total()
    }
}

pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    (price * Decimal::from(quantity)).round_dp(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub delivery_fee: Decimal,
    #[schema(value_type = String)]
    pub service_fee: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

/// Price a set of lines that share one delivery date.
///
/// Without an area both fees are zero. The total is not floored, so a large
/// amount promo can make it negative.
pub fn compute<L: PricedLine>(
    lines: &[L],
    fees: Option<&FeeSchedule>,
    rule: Option<&DiscountRule>,
) -> PricingBreakdown {
    let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
    let (delivery_fee, service_fee) = fees
        .map(|f| (f.delivery_fee, f.service_fee))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));
    let discount = rule.map(|r| r.discount_for(subtotal)).unwrap_or(Decimal::ZERO);
    let total = subtotal + delivery_fee + service_fee - discount;

    PricingBreakdown {
        subtotal,
        delivery_fee,
        service_fee,
        discount,
        total,
    }
}

/// The parts of a promo needed to decide whether it applies.
pub trait PromoTerms {
    fn code(&self) -> &str;
    fn is_active(&self) -> bool;
    fn start_date(&self) -> Option<NaiveDate>;
    fn end_date(&self) -> Option<NaiveDate>;
    fn rule(&self) -> DiscountRule;

    /// Active, started (from local midnight) and not past the end date,
    /// which counts through 23:59:59.999.
    fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        if !self.is_active() {
            return false;
        }
        if let Some(start) = self.start_date() {
            if start.and_time(NaiveTime::MIN) > now {
                return false;
            }
        }
        if let Some(end) = self.end_date() {
            let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
                .map(|t| end.and_time(t))
                .unwrap_or_else(|| end.and_time(NaiveTime::MIN));
            if now > end_of_day {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoError {
    #[error("Promo code is required")]
    EmptyCode,
    #[error("Promo code is invalid or no longer valid")]
    NotApplicable,
}

/// Look up a promo by code (trimmed, case-insensitive) and check it is valid now.
pub fn find_promo<'a, P: PromoTerms>(
    promos: &'a [P],
    code: &str,
    now: NaiveDateTime,
) -> Result<&'a P, PromoError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(PromoError::EmptyCode);
    }
    promos
        .iter()
        .find(|p| p.code().eq_ignore_ascii_case(code) && p.is_valid_at(now))
        .ok_or(PromoError::NotApplicable)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        price: Decimal,
        quantity: u32,
    }

    impl PricedLine for Line {
        fn line_total(&self) -> Decimal {
            line_total(self.price, self.quantity)
        }
    }

    #[derive(Debug)]
    struct TestPromo {
        code: &'static str,
        active: bool,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    }

    impl PromoTerms for TestPromo {
        fn code(&self) -> &str {
            self.code
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn start_date(&self) -> Option<NaiveDate> {
            self.start
        }
        fn end_date(&self) -> Option<NaiveDate> {
            self.end
        }
        fn rule(&self) -> DiscountRule {
            DiscountRule {
                kind: DiscountType::Percent,
                value: Decimal::from(10),
            }
        }
    }

    fn lines() -> Vec<Line> {
        vec![
            Line {
                price: Decimal::from(25000),
                quantity: 2,
            },
            Line {
                price: Decimal::from(15000),
                quantity: 1,
            },
        ]
    }

    fn fees() -> FeeSchedule {
        FeeSchedule {
            delivery_fee: Decimal::from(5000),
            service_fee: Decimal::from(2000),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        d.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn percent_promo_example() {
        let rule = DiscountRule {
            kind: DiscountType::Percent,
            value: Decimal::from(15),
        };
        let b = compute(&lines(), Some(&fees()), Some(&rule));
        assert_eq!(b.subtotal, Decimal::from(65000));
        assert_eq!(b.discount, Decimal::from(9750));
        assert_eq!(b.total, Decimal::from(62250));
    }

    #[test]
    fn amount_promo_example() {
        let rule = DiscountRule {
            kind: DiscountType::Amount,
            value: Decimal::from(25000),
        };
        let b = compute(&lines(), Some(&fees()), Some(&rule));
        assert_eq!(b.discount, Decimal::from(25000));
        assert_eq!(b.total, Decimal::from(47000));
    }

    #[test]
    fn amount_promo_is_not_capped() {
        let rule = DiscountRule {
            kind: DiscountType::Amount,
            value: Decimal::from(100000),
        };
        let b = compute(&lines(), Some(&fees()), Some(&rule));
        assert_eq!(b.discount, Decimal::from(100000));
        assert_eq!(b.total, Decimal::from(-28000));
    }

    #[test]
    fn no_area_means_no_fees() {
        let b = compute(&lines(), None, None);
        assert_eq!(b.delivery_fee, Decimal::ZERO);
        assert_eq!(b.service_fee, Decimal::ZERO);
        assert_eq!(b.discount, Decimal::ZERO);
        assert_eq!(b.total, b.subtotal);
    }

    #[test]
    fn percent_discount_rounds_half_up() {
        let rule = DiscountRule {
            kind: DiscountType::Percent,
            value: Decimal::from(5),
        };
        // 5% of 1010 = 50.5
        assert_eq!(rule.discount_for(Decimal::from(1010)), Decimal::from(51));
        // 5% of 1009 = 50.45
        assert_eq!(rule.discount_for(Decimal::from(1009)), Decimal::from(50));
    }

    #[test]
    fn total_identity_holds() {
        let rule = DiscountRule {
            kind: DiscountType::Percent,
            value: Decimal::from(12),
        };
        let b = compute(&lines(), Some(&fees()), Some(&rule));
        assert_eq!(b.total, b.subtotal + b.delivery_fee + b.service_fee - b.discount);
    }

    #[test]
    fn promo_window_rules() {
        let today = date(2025, 3, 10);
        let now = at(today, 21, 30);

        let future = TestPromo {
            code: "HEMAT",
            active: true,
            start: Some(date(2025, 3, 11)),
            end: None,
        };
        assert!(!future.is_valid_at(now));

        let ended_yesterday = TestPromo {
            code: "HEMAT",
            active: true,
            start: None,
            end: Some(date(2025, 3, 9)),
        };
        assert!(!ended_yesterday.is_valid_at(now));

        let ends_today = TestPromo {
            code: "HEMAT",
            active: true,
            start: Some(today),
            end: Some(today),
        };
        assert!(ends_today.is_valid_at(now));
        assert!(ends_today.is_valid_at(today.and_hms_milli_opt(23, 59, 59, 999).unwrap()));

        let inactive = TestPromo {
            code: "HEMAT",
            active: false,
            start: None,
            end: None,
        };
        assert!(!inactive.is_valid_at(now));
    }

    #[test]
    fn finds_promo_case_insensitively() {
        let now = at(date(2025, 3, 10), 9, 0);
        let promos = vec![
            TestPromo {
                code: "OLD",
                active: true,
                start: None,
                end: Some(date(2025, 1, 1)),
            },
            TestPromo {
                code: "Hemat10",
                active: true,
                start: None,
                end: None,
            },
        ];
        assert_eq!(find_promo(&promos, "  hemat10 ", now).unwrap().code, "Hemat10");
        assert_eq!(find_promo(&promos, "old", now).unwrap_err(), PromoError::NotApplicable);
        assert_eq!(find_promo(&promos, "HEMAT", now).unwrap_err(), PromoError::NotApplicable);
        assert_eq!(find_promo(&promos, " ", now).unwrap_err(), PromoError::EmptyCode);
    }
}
