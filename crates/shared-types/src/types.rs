use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Round a monetary value to two decimals, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Item '{name}': quantity must not be negative (got {quantity})")]
    NegativeQuantity { name: String, quantity: Decimal },

    #[error("Item '{name}': unit price must not be negative (got {price})")]
    NegativePrice { name: String, price: Decimal },

    #[error("Item '{name}': amount {price} x {quantity} is out of range")]
    AmountOverflow {
        name: String,
        quantity: Decimal,
        price: Decimal,
    },
}

/// One priced goods line. Values are fixed at construction; pricing produces new items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    name: String,
    quantity: Decimal,
    unit: String,
    unit_price: Decimal,
    amount: Decimal,
}

impl LineItem {
    /// Build an item whose amount is `unit_price * quantity`.
    pub fn new(
        name: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let unit_price = round_money(unit_price);
        let Some(amount) = unit_price.checked_mul(quantity) else {
            return Err(ModelError::AmountOverflow {
                name,
                quantity,
                price: unit_price,
            });
        };
        Self::with_amount(name, quantity, unit, unit_price, round_money(amount))
    }

    /// Build an item with an amount taken from the source as-is.
    pub fn with_amount(
        name: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
        amount: Decimal,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return Err(ModelError::NegativeQuantity { name, quantity });
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(ModelError::NegativePrice {
                name,
                price: unit_price,
            });
        }
        Ok(Self {
            name: name.trim().to_string(),
            quantity,
            unit: unit.into().trim().to_string(),
            unit_price: round_money(unit_price),
            amount: round_money(amount),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Identity details of a supplier company printed on an offer.
///
/// The on-disk keys follow the profile store format (`inn`, `ceo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyProfile {
    pub id: String,
    pub name: String,
    #[serde(rename = "inn")]
    pub tax_id: String,
    pub address: String,
    pub phone: String,
    #[serde(rename = "ceo")]
    pub responsible_person: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_computes_amount() {
        let item = LineItem::new("Бумага А4", dec!(3), "пачка", dec!(250.50)).unwrap();
        assert_eq!(item.amount(), dec!(751.50));
        assert_eq!(item.unit_price(), dec!(250.50));
    }

    #[test]
    fn test_amount_rounds_half_up() {
        let item = LineItem::new("Болт", dec!(0.5), "шт", dec!(0.05)).unwrap();
        assert_eq!(item.amount(), dec!(0.03));
    }

    #[test]
    fn test_with_amount_keeps_source_amount() {
        let item = LineItem::with_amount("Кабель", dec!(2), "м", dec!(10), dec!(19.99)).unwrap();
        assert_eq!(item.amount(), dec!(19.99));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = LineItem::new("X", dec!(-1), "шт", dec!(1)).unwrap_err();
        assert!(matches!(err, ModelError::NegativeQuantity { .. }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = LineItem::new("X", dec!(1), "шт", dec!(-0.01)).unwrap_err();
        assert!(matches!(err, ModelError::NegativePrice { .. }));
    }

    #[test]
    fn test_amount_out_of_range_rejected() {
        let err = LineItem::new("Слиток", Decimal::MAX, "шт", dec!(2)).unwrap_err();
        assert!(matches!(err, ModelError::AmountOverflow { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_name_and_unit_trimmed() {
        let item = LineItem::new("  Стол \n", dec!(1), " шт ", dec!(1)).unwrap();
        assert_eq!(item.name(), "Стол");
        assert_eq!(item.unit(), "шт");
    }

    #[test]
    fn test_profile_uses_store_keys() {
        let json = r#"{"id":"c1","name":"ООО Ромашка","inn":"7701234567",
            "address":"Москва","phone":"+7 495 000-00-00","ceo":"Иванов И.И."}"#;
        let profile: PartyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.tax_id, "7701234567");
        assert_eq!(profile.responsible_person, "Иванов И.И.");
        assert_eq!(profile.logo_path, None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn amount_has_at_most_two_decimals(qty in 0u32..10_000, cents in 0u64..10_000_000) {
            let price = Decimal::new(cents as i64, 2);
            let item = LineItem::new("item", Decimal::from(qty), "pcs", price).unwrap();
            prop_assert!(item.amount().scale() <= 2);
            prop_assert_eq!(item.amount(), price * Decimal::from(qty));
        }
    }
}
