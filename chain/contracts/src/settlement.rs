//! Fee extraction and settlement
//!
//! Converts trade results and closed orders into staged transfers and supply
//! changes. Each settled trade burns the sold synthetic escrow and issues the
//! same quantity for delivery, so net issuance stays zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::ids::AccountName;
use types::numeric::{Asset, Currency};
use types::order::{Order, Side};
use types::trade::TradeResult;

use crate::config::ExchangeConfig;
use crate::errors::ExchangeError;
use crate::ports::Journal;

/// Synthetic-token supply accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyLedger {
    /// Synthetic units escrowed by open sell orders
    pub escrowed: Decimal,
    pub issued: Decimal,
    pub burned: Decimal,
}

impl SupplyLedger {
    /// Issued minus burned
    pub fn net_issuance(&self) -> Decimal {
        self.issued - self.burned
    }

    pub fn escrowed_asset(&self) -> Asset {
        Asset::synthetic(self.escrowed)
    }

    fn escrow(&mut self, amount: Decimal) -> Result<(), ExchangeError> {
        self.escrowed = self.escrowed.checked_add(amount).ok_or(ExchangeError::Overflow)?;
        Ok(())
    }

    fn release(&mut self, amount: Decimal) -> Result<(), ExchangeError> {
        if amount > self.escrowed {
            return Err(ExchangeError::Overflow);
        }
        self.escrowed -= amount;
        Ok(())
    }

    fn record_burn(&mut self, amount: Decimal) -> Result<(), ExchangeError> {
        self.burned = self.burned.checked_add(amount).ok_or(ExchangeError::Overflow)?;
        Ok(())
    }

    fn record_issue(&mut self, amount: Decimal) -> Result<(), ExchangeError> {
        self.issued = self.issued.checked_add(amount).ok_or(ExchangeError::Overflow)?;
        Ok(())
    }
}

/// Staging context for one action's settlement
pub struct Settlement<'a> {
    config: &'a ExchangeConfig,
    journal: &'a mut Journal,
    supply: &'a mut SupplyLedger,
}

impl<'a> Settlement<'a> {
    pub fn new(config: &'a ExchangeConfig, journal: &'a mut Journal, supply: &'a mut SupplyLedger) -> Self {
        Self {
            config,
            journal,
            supply,
        }
    }

    fn pay(&mut self, to: &AccountName, amount: Asset, memo: impl Into<String>) {
        self.journal
            .credit(to, amount, memo, self.config.transfer_proxy.as_ref());
    }

    /// Take custody of a new order's escrow.
    ///
    /// `debit_trader` is set for direct placements; escrow that arrived by
    /// deposit is already in custody.
    pub fn escrow_order(&mut self, order: &Order, debit_trader: bool) -> Result<(), ExchangeError> {
        if debit_trader {
            self.journal
                .debit(&order.trader, order.quantity, format!("Escrow for order {}", order.order_id));
        }
        if order.side == Side::SELL {
            self.supply.escrow(order.quantity.amount)?;
        }
        Ok(())
    }

    /// Settle one trade: supply rebalance, then net payouts and fees
    pub fn settle_trade(&mut self, trade: &TradeResult) -> Result<(), ExchangeError> {
        if !trade.check_fee_bounds() {
            return Err(ExchangeError::Overflow);
        }
        let synthetic = trade.synthetic;

        self.supply.release(synthetic.amount)?;
        self.journal.burn(synthetic, format!("Burn sold RAM for trade {}", trade.sequence));
        self.supply.record_burn(synthetic.amount)?;
        self.journal.issue(synthetic, format!("Issue RAM for trade {}", trade.sequence));
        self.supply.record_issue(synthetic.amount)?;

        let fee_recipient = self.config.fee_recipient.clone();

        self.pay(
            &trade.buyer,
            trade.buyer_receives(),
            format!("Bought RAM tokens @{}", trade.rate),
        );
        self.pay(&fee_recipient, trade.buyer_fee, format!("Fee for trade {}", trade.sequence));

        self.pay(
            &trade.seller,
            trade.seller_receives(),
            format!("Sold RAM tokens @{}", trade.rate),
        );
        self.pay(&fee_recipient, trade.seller_fee, format!("Fee for trade {}", trade.sequence));

        info!(
            sequence = trade.sequence,
            buy_order = %trade.buy_order_id,
            sell_order = %trade.sell_order_id,
            synthetic = %trade.synthetic,
            base = %trade.base,
            buyer_fee = %trade.buyer_fee,
            seller_fee = %trade.seller_fee,
            "trade settled"
        );
        Ok(())
    }

    /// Return escrow left in a closed order to its trader
    pub fn refund(&mut self, order: &Order, amount: Asset, memo: impl Into<String>) -> Result<(), ExchangeError> {
        if amount.currency == Currency::Synthetic {
            self.supply.release(amount.amount)?;
        }
        self.pay(&order.trader, amount, memo);
        Ok(())
    }

    /// Send an arbitrary amount back to an account (e.g. a cancel deposit)
    pub fn return_funds(&mut self, to: &AccountName, amount: Asset, memo: impl Into<String>) {
        self.pay(to, amount, memo);
    }
}
