//! Price reference adapter
//!
//! Reads the external resource pool's reserves and derives the spot rate and
//! the minimum tradable amount. Never mutates anything.

use rust_decimal::Decimal;
use types::numeric::{Asset, Currency, Rate, RATE_UNIT};

use crate::config::ExchangeSettings;
use crate::errors::OracleError;
use crate::ports::{MarketReserves, PriceOracle};

/// Reject empty or mismatched reserves
pub fn validate_reserves(reserves: &MarketReserves) -> Result<(), OracleError> {
    let valid = reserves.base.currency == Currency::Base
        && reserves.synthetic.currency == Currency::Synthetic
        && reserves.base.is_positive()
        && reserves.synthetic.is_positive();
    if !valid {
        return Err(OracleError::InvalidReserves {
            base: reserves.base,
            synthetic: reserves.synthetic,
        });
    }
    Ok(())
}

/// Spot rate in base currency per KiB: `base_reserve * 1024 / synthetic_reserve`
pub fn spot_rate<O: PriceOracle + ?Sized>(oracle: &O) -> Result<Rate, OracleError> {
    let reserves = oracle.market_reserves()?;
    validate_reserves(&reserves)?;

    let rate = reserves
        .base
        .amount
        .checked_mul(Decimal::from(RATE_UNIT))
        .and_then(|v| v.checked_div(reserves.synthetic.amount))
        .ok_or(OracleError::Overflow)?;

    Rate::try_new(rate).ok_or(OracleError::InvalidReserves {
        base: reserves.base,
        synthetic: reserves.synthetic,
    })
}

/// Minimum order size in `currency`
///
/// The synthetic minimum comes from settings; the base minimum is its value
/// at the spot rate, rounded up.
pub fn min_trade_amount<O: PriceOracle + ?Sized>(
    oracle: &O,
    settings: &ExchangeSettings,
    currency: Currency,
) -> Result<Asset, OracleError> {
    match currency {
        Currency::Synthetic => Ok(Asset::synthetic(settings.min_synthetic_trade)),
        Currency::Base => {
            let rate = spot_rate(oracle)?;
            let base = rate
                .base_for(settings.min_synthetic_trade)
                .ok_or(OracleError::Overflow)?;
            Ok(Asset::base(base))
        }
    }
}
