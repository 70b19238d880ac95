//! Per-variant price transform
//!
//! Each offer variant marks the source prices up by a percentage and a fixed surcharge,
//! optionally jitters them by a random amount, and rounds to a coarse step. The input
//! items are never modified; every call returns fresh [`LineItem`]s.

pub mod error;

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use shared_types::{round_money, LineItem, VariantSettings};
use tracing::debug;

pub use error::PricingError;

/// Steps accepted for `rounding_step`, in rubles.
pub const ROUNDING_STEPS: [u32; 4] = [1, 10, 50, 100];

/// Largest accepted random spread, in rubles.
pub const MAX_SPREAD: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub fn validate_settings(settings: &VariantSettings) -> Result<(), PricingError> {
    if settings.percent_up.is_sign_negative() && !settings.percent_up.is_zero() {
        return Err(PricingError::NegativePercent(settings.percent_up));
    }
    if settings.fixed_add.is_sign_negative() && !settings.fixed_add.is_zero() {
        return Err(PricingError::NegativeFixedAdd(settings.fixed_add));
    }
    let spread = settings.random_spread;
    if (spread.is_sign_negative() && !spread.is_zero()) || spread > MAX_SPREAD {
        return Err(PricingError::InvalidSpread {
            spread,
            max: MAX_SPREAD,
        });
    }
    if !ROUNDING_STEPS
        .iter()
        .any(|&step| Decimal::from(step) == settings.rounding_step)
    {
        return Err(PricingError::InvalidRoundingStep(settings.rounding_step));
    }
    Ok(())
}

/// Round `value` to the nearest multiple of `step` (half away from zero), then to kopecks.
///
/// A non-positive step leaves the value unchanged. Values whose rounded multiple would
/// leave the decimal range are only rounded to kopecks.
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    let steps = (value / step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    steps.checked_mul(step).map_or(round_money(value), round_money)
}

/// Uniform delta in `[-spread, +spread]`, drawn in whole kopecks.
fn random_delta<R: Rng + ?Sized>(spread: Decimal, rng: &mut R) -> Decimal {
    let kopecks = (spread * Decimal::ONE_HUNDRED).trunc().to_i64().unwrap_or(0);
    if kopecks <= 0 {
        return Decimal::ZERO;
    }
    Decimal::new(rng.gen_range(-kopecks..=kopecks), 2)
}

/// Price one item.
pub fn price_item<R: Rng + ?Sized>(
    item: &LineItem,
    settings: &VariantSettings,
    rng: &mut R,
) -> Result<LineItem, PricingError> {
    let overflow = || PricingError::PriceOverflow {
        name: item.name().to_string(),
    };
    let factor = (settings.percent_up / Decimal::ONE_HUNDRED)
        .checked_add(Decimal::ONE)
        .ok_or_else(overflow)?;
    let mut base = item
        .unit_price()
        .checked_mul(factor)
        .and_then(|marked| marked.checked_add(settings.fixed_add))
        .ok_or_else(overflow)?;
    if settings.random_spread > Decimal::ZERO {
        base = base
            .checked_add(random_delta(settings.random_spread, rng))
            .ok_or_else(overflow)?;
    }
    let base = base.max(MIN_PRICE);
    let price = round_to_step(base, settings.rounding_step);
    Ok(LineItem::new(item.name(), item.quantity(), item.unit(), price)?)
}

/// Price every item for one variant. Settings are validated first.
pub fn apply_pricing<R: Rng + ?Sized>(
    items: &[LineItem],
    settings: &VariantSettings,
    rng: &mut R,
) -> Result<Vec<LineItem>, PricingError> {
    validate_settings(settings)?;
    let priced = items
        .iter()
        .map(|item| price_item(item, settings, rng))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        company = settings.company_id.as_str(),
        items = priced.len(),
        "variant priced"
    );
    Ok(priced)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn step() -> impl Strategy<Value = Decimal> {
        prop::sample::select(ROUNDING_STEPS.to_vec()).prop_map(Decimal::from)
    }

    proptest! {
        #[test]
        fn priced_values_are_multiples_of_step(
            price_kopecks in 0i64..10_000_000,
            quantity in 1i64..1000,
            percent in 0u32..200,
            spread in 0i64..10_000,
            step in step(),
            seed in any::<u64>(),
        ) {
            let item = LineItem::new("x", Decimal::from(quantity), "шт", Decimal::new(price_kopecks, 2)).unwrap();
            let settings = VariantSettings {
                percent_up: Decimal::from(percent),
                random_spread: Decimal::new(spread, 2),
                rounding_step: step,
                ..VariantSettings::for_company("c")
            };
            let priced = apply_pricing(&[item], &settings, &mut StdRng::seed_from_u64(seed)).unwrap();
            let price = priced[0].unit_price();
            prop_assert!(price >= Decimal::ZERO);
            prop_assert!((price % step).is_zero());
            prop_assert_eq!(priced[0].amount(), round_money(price * Decimal::from(quantity)));
        }

        #[test]
        fn delta_stays_within_spread(spread in 0i64..100_000, seed in any::<u64>()) {
            let spread = Decimal::new(spread, 2);
            let delta = random_delta(spread, &mut StdRng::seed_from_u64(seed));
            prop_assert!(delta.abs() <= spread);
        }
    }
}
