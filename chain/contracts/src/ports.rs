//! Collaborator ports and staged effects
//!
//! The exchange never calls its collaborators directly. Each action records
//! the transfers, supply changes and timer operations it needs in a
//! [`Journal`]. When the action commits, the journal becomes a [`Receipt`]
//! that the host applies within the same ledger transaction. A receipt that
//! fails to apply must abort the host transaction.

use serde::{Deserialize, Serialize};
use types::ids::{AccountName, OrderId};
use types::numeric::Asset;
use types::order::Timestamp;

use crate::errors::{LedgerError, OracleError};
use crate::events::ContractEvent;

/// Outgoing transfer from exchange custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: AccountName,
    pub amount: Asset,
    pub memo: String,
    /// Proxy account the transfer is routed through, if configured
    pub via: Option<AccountName>,
}

/// Deferred expiration delivered back through `on_order_expired`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledExpiration {
    pub order_id: OrderId,
    pub fire_at: Timestamp,
}

/// One side effect of a committed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Move `amount` from `account` into exchange custody
    Debit {
        account: AccountName,
        amount: Asset,
        memo: String,
    },
    /// Move funds out of custody
    Credit(Transfer),
    /// Create synthetic units in custody
    Issue { amount: Asset, memo: String },
    /// Destroy synthetic units held in custody
    Burn { amount: Asset, memo: String },
    Schedule(ScheduledExpiration),
    CancelSchedule { order_id: OrderId },
}

/// Token transfer and supply collaborator
pub trait TokenLedger {
    fn debit(&mut self, account: &AccountName, amount: &Asset, memo: &str) -> Result<(), LedgerError>;

    fn credit(&mut self, transfer: &Transfer) -> Result<(), LedgerError>;

    fn issue(&mut self, amount: &Asset, memo: &str) -> Result<(), LedgerError>;

    fn burn(&mut self, amount: &Asset, memo: &str) -> Result<(), LedgerError>;
}

/// Deferred-action collaborator
pub trait Scheduler {
    fn schedule(&mut self, expiration: &ScheduledExpiration);

    /// Cancel a pending expiration; a missing entry is not an error
    fn best_effort_cancel(&mut self, order_id: OrderId);
}

/// Reserves of the external resource-price pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketReserves {
    /// Base currency held by the pool
    pub base: Asset,
    /// Synthetic units (bytes) held by the pool
    pub synthetic: Asset,
}

/// Read-only price source
pub trait PriceOracle {
    fn market_reserves(&self) -> Result<MarketReserves, OracleError>;
}

/// Effects staged by an action in progress
#[derive(Debug, Clone, Default)]
pub struct Journal {
    effects: Vec<Effect>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debit(&mut self, account: &AccountName, amount: Asset, memo: impl Into<String>) {
        if amount.is_zero() {
            return;
        }
        self.effects.push(Effect::Debit {
            account: account.clone(),
            amount,
            memo: memo.into(),
        });
    }

    /// Stage a payout; zero-valued transfers are skipped
    pub fn credit(
        &mut self,
        to: &AccountName,
        amount: Asset,
        memo: impl Into<String>,
        via: Option<&AccountName>,
    ) {
        if amount.is_zero() {
            return;
        }
        self.effects.push(Effect::Credit(Transfer {
            to: to.clone(),
            amount,
            memo: memo.into(),
            via: via.cloned(),
        }));
    }

    pub fn issue(&mut self, amount: Asset, memo: impl Into<String>) {
        if amount.is_zero() {
            return;
        }
        self.effects.push(Effect::Issue {
            amount,
            memo: memo.into(),
        });
    }

    pub fn burn(&mut self, amount: Asset, memo: impl Into<String>) {
        if amount.is_zero() {
            return;
        }
        self.effects.push(Effect::Burn {
            amount,
            memo: memo.into(),
        });
    }

    pub fn schedule(&mut self, order_id: OrderId, fire_at: Timestamp) {
        self.effects
            .push(Effect::Schedule(ScheduledExpiration { order_id, fire_at }));
    }

    pub fn cancel_schedule(&mut self, order_id: OrderId) {
        self.effects.push(Effect::CancelSchedule { order_id });
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn into_receipt(self, events: Vec<ContractEvent>) -> Receipt {
        Receipt {
            effects: self.effects,
            events,
        }
    }
}

/// Everything a committed action produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub effects: Vec<Effect>,
    /// Events emitted by this action (also appended to the exchange log)
    pub events: Vec<ContractEvent>,
}

impl Receipt {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.events.is_empty()
    }

    /// Credits paid out by this action
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Credit(transfer) => Some(transfer),
            _ => None,
        })
    }

    /// Apply the effects in order to the host collaborators
    pub fn apply<L, S>(&self, ledger: &mut L, scheduler: &mut S) -> Result<(), LedgerError>
    where
        L: TokenLedger + ?Sized,
        S: Scheduler + ?Sized,
    {
        for effect in &self.effects {
            match effect {
                Effect::Debit { account, amount, memo } => ledger.debit(account, amount, memo)?,
                Effect::Credit(transfer) => ledger.credit(transfer)?,
                Effect::Issue { amount, memo } => ledger.issue(amount, memo)?,
                Effect::Burn { amount, memo } => ledger.burn(amount, memo)?,
                Effect::Schedule(expiration) => scheduler.schedule(expiration),
                Effect::CancelSchedule { order_id } => scheduler.best_effort_cancel(*order_id),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_zero_valued_effects_are_skipped() {
        let mut journal = Journal::new();
        let alice = AccountName::from("alice");
        journal.credit(&alice, Asset::base(Decimal::ZERO), "nothing", None);
        journal.issue(Asset::synthetic(Decimal::ZERO), "nothing");
        journal.credit(&alice, Asset::base(Decimal::ONE), "payout", None);

        assert_eq!(journal.effects().len(), 1);
        let receipt = journal.into_receipt(Vec::new());
        let transfers: Vec<_> = receipt.transfers().collect();
        assert_eq!(transfers[0].amount, Asset::base(Decimal::ONE));
    }

    #[test]
    fn test_credit_routes_through_proxy() {
        let mut journal = Journal::new();
        let proxy = AccountName::from("proxy");
        journal.credit(&AccountName::from("bob"), Asset::synthetic(Decimal::from(10)), "x", Some(&proxy));

        match &journal.effects()[0] {
            Effect::Credit(transfer) => assert_eq!(transfer.via, Some(proxy)),
            other => panic!("unexpected effect {:?}", other),
        }
    }
}
