//! In-memory host collaborators shared by the integration tests
//!
//! The ledger keeps per-account balances plus exchange custody per currency,
//! so conservation can be checked across every applied receipt.

#![allow(dead_code)]

use std::collections::BTreeMap;

use contracts::ports::{ScheduledExpiration, Transfer};
use contracts::{
    ActionContext, DepositCommand, Exchange, ExchangeError, ExchangeSettings, LedgerError,
    MarketReserves, OracleError, PriceOracle, Receipt, Scheduler, TokenLedger,
};
use rust_decimal::Decimal;
use types::ids::{AccountName, OrderId, TxId};
use types::numeric::{Asset, Currency, Rate};
use types::order::{Timestamp, Ttl};

pub const OWNER: &str = "exchange.adm";
pub const FEES: &str = "fees.acct";

// ═══════════════════════════════════════════════════════════════════
// Collaborators
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: BTreeMap<(AccountName, Currency), Decimal>,
    custody: BTreeMap<Currency, Decimal>,
    pub issued: Decimal,
    pub burned: Decimal,
    pub transfers: Vec<Transfer>,
}

impl InMemoryLedger {
    pub fn fund(&mut self, account: &AccountName, amount: Asset) {
        *self
            .balances
            .entry((account.clone(), amount.currency))
            .or_default() += amount.amount;
    }

    pub fn balance(&self, account: &AccountName, currency: Currency) -> Decimal {
        self.balances
            .get(&(account.clone(), currency))
            .copied()
            .unwrap_or_default()
    }

    pub fn custody(&self, currency: Currency) -> Decimal {
        self.custody.get(&currency).copied().unwrap_or_default()
    }

    /// Everything held by accounts plus custody
    pub fn total(&self, currency: Currency) -> Decimal {
        let held: Decimal = self
            .balances
            .iter()
            .filter(|((_, c), _)| *c == currency)
            .map(|(_, amount)| *amount)
            .sum();
        held + self.custody(currency)
    }

    fn take_custody(&mut self, amount: &Asset) -> Result<(), LedgerError> {
        let held = self.custody.entry(amount.currency).or_default();
        if *held < amount.amount {
            return Err(LedgerError::InsufficientCustody { required: *amount });
        }
        *held -= amount.amount;
        Ok(())
    }

    /// Host-side move of a deposit into custody, ahead of the notification
    pub fn deposit(&mut self, from: &AccountName, amount: &Asset) -> Result<(), LedgerError> {
        self.debit(from, amount, "deposit")
    }
}

impl TokenLedger for InMemoryLedger {
    fn debit(&mut self, account: &AccountName, amount: &Asset, _memo: &str) -> Result<(), LedgerError> {
        let balance = self
            .balances
            .entry((account.clone(), amount.currency))
            .or_default();
        if *balance < amount.amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.clone(),
                required: *amount,
            });
        }
        *balance -= amount.amount;
        *self.custody.entry(amount.currency).or_default() += amount.amount;
        Ok(())
    }

    fn credit(&mut self, transfer: &Transfer) -> Result<(), LedgerError> {
        self.take_custody(&transfer.amount)?;
        self.fund(&transfer.to, transfer.amount);
        self.transfers.push(transfer.clone());
        Ok(())
    }

    fn issue(&mut self, amount: &Asset, _memo: &str) -> Result<(), LedgerError> {
        *self.custody.entry(amount.currency).or_default() += amount.amount;
        self.issued += amount.amount;
        Ok(())
    }

    fn burn(&mut self, amount: &Asset, _memo: &str) -> Result<(), LedgerError> {
        self.take_custody(amount)?;
        self.burned += amount.amount;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduler {
    pub pending: BTreeMap<OrderId, Timestamp>,
    pub cancel_requests: usize,
}

impl InMemoryScheduler {
    /// Pending expirations due at `now`
    pub fn due(&self, now: Timestamp) -> Vec<OrderId> {
        self.pending
            .iter()
            .filter(|(_, fire_at)| **fire_at <= now)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Scheduler for InMemoryScheduler {
    fn schedule(&mut self, expiration: &ScheduledExpiration) {
        self.pending.insert(expiration.order_id, expiration.fire_at);
    }

    fn best_effort_cancel(&mut self, order_id: OrderId) {
        self.cancel_requests += 1;
        self.pending.remove(&order_id);
    }
}

#[derive(Debug, Clone)]
pub struct FixedOracle {
    pub reserves: MarketReserves,
}

impl FixedOracle {
    /// Pool priced at 0.5 EOS per KiB
    pub fn half_eos_per_kib() -> Self {
        Self {
            reserves: MarketReserves {
                base: Asset::base(Decimal::from(512)),
                synthetic: Asset::synthetic(Decimal::from(1_048_576)),
            },
        }
    }
}

impl PriceOracle for FixedOracle {
    fn market_reserves(&self) -> Result<MarketReserves, OracleError> {
        Ok(self.reserves)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Harness
// ═══════════════════════════════════════════════════════════════════

/// Route exchange logs to the test output; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn account(name: &str) -> AccountName {
    AccountName::from(name)
}

pub fn eos(value: &str) -> Asset {
    Asset::base(value.parse().expect("valid decimal"))
}

pub fn ram(bytes: i64) -> Asset {
    Asset::synthetic(Decimal::from(bytes))
}

pub fn rate(value: &str) -> Option<Rate> {
    Some(value.parse::<Rate>().expect("valid rate"))
}

/// Exchange plus host collaborators, applying every receipt like a host would
pub struct Harness {
    pub exchange: Exchange<FixedOracle>,
    pub ledger: InMemoryLedger,
    pub scheduler: InMemoryScheduler,
    pub now: Timestamp,
    tx_counter: u64,
}

impl Harness {
    /// Initialized and running exchange with default settings
    pub fn new() -> Self {
        Self::with_settings(ExchangeSettings::default())
    }

    pub fn with_settings(settings: ExchangeSettings) -> Self {
        init_tracing();
        let mut harness = Self {
            exchange: Exchange::new(account(OWNER), settings, FixedOracle::half_eos_per_kib()),
            ledger: InMemoryLedger::default(),
            scheduler: InMemoryScheduler::default(),
            now: Timestamp::from_secs(1_000),
            tx_counter: 0,
        };
        let ctx = harness.ctx(OWNER);
        let receipt = harness.exchange.initialize(&ctx, account(FEES));
        harness.commit(receipt).expect("initialize");
        let ctx = harness.ctx(OWNER);
        let receipt = harness.exchange.start(&ctx);
        harness.commit(receipt).expect("start");
        harness
    }

    /// Context for a fresh transaction authorized by `authorizer`
    pub fn ctx(&mut self, authorizer: &str) -> ActionContext {
        self.tx_counter += 1;
        ActionContext {
            now: self.now,
            tx_id: TxId::from_raw_transaction(format!("tx-{}", self.tx_counter).as_bytes()),
            authorizer: account(authorizer),
        }
    }

    pub fn advance(&mut self, secs: u32) {
        self.now = self.now.checked_add_secs(secs).expect("clock");
    }

    /// Apply a committed receipt; a failed application aborts the test
    pub fn commit(&mut self, result: Result<Receipt, ExchangeError>) -> Result<Receipt, ExchangeError> {
        let receipt = result?;
        receipt
            .apply(&mut self.ledger, &mut self.scheduler)
            .expect("receipt applies cleanly");
        Ok(receipt)
    }

    pub fn fund(&mut self, name: &str, amount: Asset) {
        self.ledger.fund(&account(name), amount);
    }

    pub fn balance(&self, name: &str, currency: Currency) -> Decimal {
        self.ledger.balance(&account(name), currency)
    }

    pub fn place(
        &mut self,
        trader: &str,
        amount: Asset,
        ttl: Ttl,
        force: bool,
        limit: Option<Rate>,
    ) -> Result<OrderId, ExchangeError> {
        let ctx = self.ctx(trader);
        let order_id = OrderId::derive(&ctx.tx_id);
        let result = match amount.currency {
            Currency::Base => self
                .exchange
                .place_buy(&ctx, account(trader), amount, ttl, force, limit),
            Currency::Synthetic => self
                .exchange
                .place_sell(&ctx, account(trader), amount, ttl, force, limit),
        };
        self.commit(result)?;
        Ok(order_id)
    }

    pub fn buy(&mut self, trader: &str, amount: &str, limit: Option<Rate>) -> Result<OrderId, ExchangeError> {
        self.place(trader, eos(amount), Ttl::Infinite, false, limit)
    }

    pub fn sell(&mut self, trader: &str, bytes: i64, limit: Option<Rate>) -> Result<OrderId, ExchangeError> {
        self.place(trader, ram(bytes), Ttl::Infinite, false, limit)
    }

    /// Deposit-driven action: custody moves first, and is rolled back if the
    /// exchange rejects the notification
    pub fn deposit(
        &mut self,
        from: &str,
        amount: Asset,
        command: DepositCommand,
    ) -> Result<Receipt, ExchangeError> {
        let snapshot = self.ledger.clone();
        self.ledger
            .deposit(&account(from), &amount)
            .expect("depositor is funded");
        let ctx = self.ctx(from);
        let result = self.exchange.on_deposit(&ctx, account(from), amount, command);
        if result.is_err() {
            self.ledger = snapshot;
        }
        self.commit(result)
    }

    /// Deliver every scheduled expiration that is due
    pub fn fire_due(&mut self) -> Vec<Receipt> {
        let mut receipts = Vec::new();
        for order_id in self.scheduler.due(self.now) {
            self.scheduler.pending.remove(&order_id);
            let ctx = self.ctx("scheduler");
            let result = self.exchange.on_order_expired(&ctx, order_id);
            receipts.push(self.commit(result).expect("expiration never fails"));
        }
        receipts
    }
}
