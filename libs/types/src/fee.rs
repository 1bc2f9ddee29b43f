//! Fee calculation types
//!
//! The protocol fee is a proportional rate with a per-currency flat minimum.
//! Fees round up to the currency precision and are always clamped to the
//! amount they are taken from.

use crate::numeric::{Asset, Currency};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Amount left after a fee has been taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductedAmount {
    pub value: Asset,
    pub fee: Asset,
}

/// Take `fee_fn(amount)` out of `amount`.
///
/// If the computed fee exceeds the amount, the whole amount becomes the fee
/// and the payout is zero. A negative fee is treated as zero.
pub fn deduct_fee<F>(amount: Asset, fee_fn: F) -> DeductedAmount
where
    F: FnOnce(&Asset) -> Asset,
{
    let fee = fee_fn(&amount);
    let fee_amount = fee.amount.max(Decimal::ZERO);

    if fee_amount >= amount.amount {
        DeductedAmount {
            value: Asset::zero(amount.currency),
            fee: amount,
        }
    } else {
        DeductedAmount {
            value: Asset::new(amount.amount - fee_amount, amount.currency),
            fee: Asset::new(fee_amount, amount.currency),
        }
    }
}

/// Fee schedule applied to every settled trade leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Proportional fee (0.001 = 0.1%)
    pub rate: Decimal,
    /// Flat minimum charged on base-currency legs
    pub min_base_fee: Decimal,
    /// Flat minimum charged on synthetic legs
    pub min_synthetic_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            rate: Decimal::new(1, 3),
            min_base_fee: Decimal::ZERO,
            min_synthetic_fee: Decimal::ZERO,
        }
    }
}

impl FeeSchedule {
    /// A schedule that charges nothing
    pub fn zero() -> Self {
        Self {
            rate: Decimal::ZERO,
            min_base_fee: Decimal::ZERO,
            min_synthetic_fee: Decimal::ZERO,
        }
    }

    /// Raw fee for an amount, before clamping
    pub fn fee_for(&self, amount: &Asset) -> Asset {
        let proportional = amount
            .amount
            .checked_mul(self.rate)
            .unwrap_or(amount.amount)
            .round_dp_with_strategy(amount.currency.precision(), RoundingStrategy::AwayFromZero);

        let minimum = match amount.currency {
            Currency::Base => self.min_base_fee,
            Currency::Synthetic => self.min_synthetic_fee,
        };

        Asset::new(proportional.max(minimum), amount.currency)
    }

    /// Split an amount into payout and clamped fee
    pub fn deduct(&self, amount: Asset) -> DeductedAmount {
        deduct_fee(amount, |a| self.fee_for(a))
    }

    pub fn is_valid(&self) -> bool {
        self.rate >= Decimal::ZERO
            && self.rate <= Decimal::ONE
            && self.min_base_fee >= Decimal::ZERO
            && self.min_synthetic_fee >= Decimal::ZERO
    }
}
