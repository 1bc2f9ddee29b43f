//! Fixed-point currency amounts and exchange rates
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! The exchange trades exactly two currencies: the reference currency (`EOS`,
//! 4 decimal places) and the resource-backed synthetic token (`RAM`, whole
//! bytes). Rates are quoted as `EOS` per KiB of `RAM`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of synthetic units a rate is quoted for (1 KiB)
pub const RATE_UNIT: u32 = 1024;

/// Currencies traded on the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    /// Reference currency offered by buy orders
    #[serde(rename = "EOS")]
    Base,
    /// Synthetic resource token offered by sell orders
    #[serde(rename = "RAM")]
    Synthetic,
}

impl Currency {
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Base => "EOS",
            Currency::Synthetic => "RAM",
        }
    }

    /// Decimal places carried by amounts of this currency
    pub const fn precision(&self) -> u32 {
        match self {
            Currency::Base => 4,
            Currency::Synthetic => 0,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EOS" => Some(Currency::Base),
            "RAM" => Some(Currency::Synthetic),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Currency::Base => Currency::Synthetic,
            Currency::Synthetic => Currency::Base,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An amount tagged with its currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Asset {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn base(amount: Decimal) -> Self {
        Self::new(amount, Currency::Base)
    }

    pub fn synthetic(amount: Decimal) -> Self {
        Self::new(amount, Currency::Synthetic)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Non-negative and representable at the currency's precision
    pub fn is_valid(&self) -> bool {
        self.amount >= Decimal::ZERO
            && self.amount.round_dp(self.currency.precision()) == self.amount
    }

    pub fn checked_add(&self, other: &Asset) -> Option<Asset> {
        if self.currency != other.currency {
            return None;
        }
        Some(Asset::new(self.amount.checked_add(other.amount)?, self.currency))
    }

    /// Subtract, returning `None` on currency mismatch or a negative result
    pub fn checked_sub(&self, other: &Asset) -> Option<Asset> {
        if self.currency != other.currency || other.amount > self.amount {
            return None;
        }
        Some(Asset::new(self.amount.checked_sub(other.amount)?, self.currency))
    }

    pub fn min(self, other: Asset) -> Asset {
        if other.amount < self.amount {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.currency.precision() as usize;
        write!(f, "{:.*} {}", precision, self.amount, self.currency)
    }
}

/// Error parsing an asset string such as `"10.0000 EOS"`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid asset: {0}")]
pub struct ParseAssetError(String);

impl FromStr for Asset {
    type Err = ParseAssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseAssetError(s.to_string()));
        };
        let amount = Decimal::from_str(amount).map_err(|e| ParseAssetError(e.to_string()))?;
        let currency = Currency::from_code(code).ok_or_else(|| ParseAssetError(code.to_string()))?;
        Ok(Asset::new(amount, currency))
    }
}

/// Exchange rate: `EOS` paid per `RATE_UNIT` units of `RAM`
///
/// Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// Create a rate, returning `None` unless strictly positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whole synthetic units purchasable with `base` at this rate (rounded down)
    pub fn synthetic_for(&self, base: Decimal) -> Option<Decimal> {
        let exact = base
            .checked_mul(Decimal::from(RATE_UNIT))?
            .checked_div(self.0)?;
        Some(exact.round_dp_with_strategy(
            Currency::Synthetic.precision(),
            RoundingStrategy::ToZero,
        ))
    }

    /// Base-currency cost of `synthetic` units at this rate (rounded up)
    pub fn base_for(&self, synthetic: Decimal) -> Option<Decimal> {
        let exact = synthetic
            .checked_mul(self.0)?
            .checked_div(Decimal::from(RATE_UNIT))?;
        Some(exact.round_dp_with_strategy(
            Currency::Base.precision(),
            RoundingStrategy::AwayFromZero,
        ))
    }
}

/// Error parsing a rate string such as `"0.5"`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rate: {0}")]
pub struct ParseRateError(String);

impl FromStr for Rate {
    type Err = ParseRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|e| ParseRateError(e.to_string()))?;
        Self::try_new(value).ok_or_else(|| ParseRateError(s.to_string()))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/KiB", self.0, Currency::Base)
    }
}
