//! Exchange contract
//!
//! Entry points for every public, administrative and scheduler action.
//!
//! Each action runs against a staged copy of the exchange state together with
//! an effect journal. The copy replaces the live state only when the action
//! succeeds, and the journal is handed back as a [`Receipt`] for the host to
//! apply. A failed action leaves the books, config, timers, supply and event
//! log untouched.

use matching_engine::engine::{BookDepth, ClosedOrder, Disposition};
use matching_engine::MatchingEngine;
use tracing::{debug, info, warn};
use types::errors::OrderError;
use types::ids::{AccountName, OrderId, TxId};
use types::numeric::{Asset, Currency, Rate};
use types::order::{CancelReason, Order, Side, Timestamp, Ttl};

use crate::config::{ExchangeConfig, ExchangeSettings};
use crate::errors::{ExchangeError, OracleError};
use crate::events::{
    ConfigChange, ConfigUpdated, ContractEvent, OrderCanceled, OrderExpired, OrderFilled,
    OrderPlaced, OrdersCleared, TradeSettled,
};
use crate::ingestion::{self, CancelTarget, DepositCommand, OrderRequest};
use crate::ports::{Journal, PriceOracle, Receipt};
use crate::price_reference;
use crate::settlement::{Settlement, SupplyLedger};
use crate::ttl::{FireDecision, TtlManager};

/// Ledger context of the action being executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    /// Current ledger time
    pub now: Timestamp,
    /// Transaction carrying the action; new orders derive their id from it
    pub tx_id: TxId,
    /// Already-authenticated account that authorized the action
    pub authorizer: AccountName,
}

/// Mutable state replaced atomically on commit
#[derive(Debug, Clone)]
struct ExchangeState {
    config: Option<ExchangeConfig>,
    engine: MatchingEngine,
    ttl: TtlManager,
    supply: SupplyLedger,
}

/// The exchange contract
#[derive(Debug)]
pub struct Exchange<O: PriceOracle> {
    /// Account allowed to initialize the exchange
    owner: AccountName,
    settings: ExchangeSettings,
    oracle: O,
    state: ExchangeState,
    /// Committed events; kept outside the staged state
    events: Vec<ContractEvent>,
}

impl<O: PriceOracle> Exchange<O> {
    pub fn new(owner: AccountName, settings: ExchangeSettings, oracle: O) -> Self {
        let engine = MatchingEngine::new(settings.fee.clone());
        Self {
            owner,
            settings,
            oracle,
            state: ExchangeState {
                config: None,
                engine,
                ttl: TtlManager::new(),
                supply: SupplyLedger::default(),
            },
            events: Vec::new(),
        }
    }

    /// Run an action on a staged copy of the state and commit it on success
    fn stage<F>(&mut self, action: &'static str, f: F) -> Result<Receipt, ExchangeError>
    where
        F: FnOnce(&mut Staged<'_, O>) -> Result<(), ExchangeError>,
    {
        let mut staged = Staged {
            owner: &self.owner,
            settings: &self.settings,
            oracle: &self.oracle,
            state: self.state.clone(),
            journal: Journal::new(),
            emitted: Vec::new(),
        };

        if let Err(err) = f(&mut staged) {
            warn!(action, error = %err, "action rejected");
            return Err(err);
        }

        let Staged {
            state,
            journal,
            emitted,
            ..
        } = staged;
        self.state = state;
        self.events.extend(emitted.iter().cloned());
        debug!(action, effects = journal.effects().len(), "action committed");
        Ok(journal.into_receipt(emitted))
    }

    // ───────────────────────── Public Actions ─────────────────────────

    /// Open a buy order escrowing base currency debited from `trader`
    pub fn place_buy(
        &mut self,
        ctx: &ActionContext,
        trader: AccountName,
        amount: Asset,
        ttl: Ttl,
        force: bool,
        rate: Option<Rate>,
    ) -> Result<Receipt, ExchangeError> {
        self.stage("place_buy", |staged| {
            ingestion::require_currency(&amount, Currency::Base)?;
            staged.require_authorizer(ctx, &trader)?;
            let request = OrderRequest {
                trader,
                amount,
                ttl,
                force,
                rate,
            };
            staged.place(ctx, &request, true).map(|_| ())
        })
    }

    /// Open a sell order escrowing synthetic units debited from `trader`
    pub fn place_sell(
        &mut self,
        ctx: &ActionContext,
        trader: AccountName,
        amount: Asset,
        ttl: Ttl,
        force: bool,
        rate: Option<Rate>,
    ) -> Result<Receipt, ExchangeError> {
        self.stage("place_sell", |staged| {
            ingestion::require_currency(&amount, Currency::Synthetic)?;
            staged.require_authorizer(ctx, &trader)?;
            let request = OrderRequest {
                trader,
                amount,
                ttl,
                force,
                rate,
            };
            staged.place(ctx, &request, true).map(|_| ())
        })
    }

    /// Cancel an order; allowed for its owner and the admin
    pub fn cancel(&mut self, ctx: &ActionContext, order_id: OrderId) -> Result<Receipt, ExchangeError> {
        self.stage("cancel", |staged| {
            staged.require_running()?;
            staged.cancel_order(order_id, &ctx.authorizer)
        })
    }

    /// Cancel the order created by transaction `tx_id`
    pub fn cancel_by_transaction(&mut self, ctx: &ActionContext, tx_id: TxId) -> Result<Receipt, ExchangeError> {
        let order_id = CancelTarget::Transaction(tx_id).order_id();
        self.stage("cancel_by_transaction", |staged| {
            staged.require_running()?;
            staged.cancel_order(order_id, &ctx.authorizer)
        })
    }

    /// Handle funds deposited into custody together with a parsed command
    ///
    /// The deposit is already in custody, so no debit is staged. A cancel
    /// command returns the deposited amount to the sender.
    pub fn on_deposit(
        &mut self,
        ctx: &ActionContext,
        from: AccountName,
        amount: Asset,
        command: DepositCommand,
    ) -> Result<Receipt, ExchangeError> {
        self.stage("on_deposit", |staged| {
            staged.require_authorizer(ctx, &from)?;
            match command {
                DepositCommand::MakeOrder { ttl, force, rate } => {
                    let request = OrderRequest {
                        trader: from,
                        amount,
                        ttl,
                        force,
                        rate,
                    };
                    staged.place(ctx, &request, false).map(|_| ())
                }
                DepositCommand::CancelOrder { target } => {
                    staged.require_running()?;
                    staged.cancel_order(target.order_id(), &from)?;
                    staged
                        .settlement()?
                        .return_funds(&from, amount, "Returning cancel deposit");
                    Ok(())
                }
            }
        })
    }

    // ───────────────────────── Scheduler ─────────────────────────

    /// Deferred expiration delivered by the scheduler. Idempotent.
    pub fn on_order_expired(&mut self, ctx: &ActionContext, order_id: OrderId) -> Result<Receipt, ExchangeError> {
        self.stage("on_order_expired", |staged| {
            staged.config()?;
            let decision = staged
                .state
                .ttl
                .on_fire(&order_id, staged.state.engine.find(&order_id), ctx.now);

            match decision {
                FireDecision::Ignore => {
                    debug!(order_id = %order_id, "expiration for absent or closed order ignored");
                    Ok(())
                }
                FireDecision::Reschedule { fire_at } => {
                    warn!(
                        order_id = %order_id,
                        now = %ctx.now,
                        expires_at = %fire_at,
                        "expiration delivered early, rescheduling"
                    );
                    staged.state.ttl.schedule(order_id, fire_at, &mut staged.journal);
                    Ok(())
                }
                FireDecision::Expire => staged.expire_order(order_id, ctx.now),
            }
        })
    }

    // ───────────────────────── Administration ─────────────────────────

    /// Create the exchange config. Only the owner may initialize, once.
    /// The exchange starts stopped.
    pub fn initialize(&mut self, ctx: &ActionContext, fee_recipient: AccountName) -> Result<Receipt, ExchangeError> {
        self.stage("initialize", |staged| {
            if &ctx.authorizer != staged.owner {
                return Err(ExchangeError::Unauthorized {
                    account: ctx.authorizer.clone(),
                });
            }
            if staged.state.config.is_some() {
                return Err(ExchangeError::AlreadyInitialized);
            }
            let admin = staged.owner.clone();
            staged.state.config = Some(ExchangeConfig::new(admin.clone(), fee_recipient.clone()));
            info!(admin = %admin, fee_recipient = %fee_recipient, "exchange initialized");
            staged.emit_config_change(
                ConfigChange::Initialized {
                    admin,
                    fee_recipient,
                },
                &ctx.authorizer,
            );
            Ok(())
        })
    }

    pub fn set_fee_recipient(&mut self, ctx: &ActionContext, account: AccountName) -> Result<Receipt, ExchangeError> {
        self.stage("set_fee_recipient", |staged| {
            staged.admin_config_mut(ctx)?.fee_recipient = account.clone();
            info!(fee_recipient = %account, "fee recipient updated");
            staged.emit_config_change(ConfigChange::FeeRecipient(account), &ctx.authorizer);
            Ok(())
        })
    }

    /// Route outgoing transfers through `proxy`, or directly when `None`
    pub fn set_transfer_proxy(
        &mut self,
        ctx: &ActionContext,
        proxy: Option<AccountName>,
    ) -> Result<Receipt, ExchangeError> {
        self.stage("set_transfer_proxy", |staged| {
            staged.admin_config_mut(ctx)?.transfer_proxy = proxy.clone();
            info!(proxy = ?proxy, "transfer proxy updated");
            staged.emit_config_change(ConfigChange::TransferProxy(proxy), &ctx.authorizer);
            Ok(())
        })
    }

    /// Hand administration over to another account
    pub fn set_admin(&mut self, ctx: &ActionContext, new_admin: AccountName) -> Result<Receipt, ExchangeError> {
        self.stage("set_admin", |staged| {
            let config = staged.admin_config_mut(ctx)?;
            if !config.access.transfer_admin(&ctx.authorizer, new_admin.clone()) {
                return Err(ExchangeError::Unauthorized {
                    account: ctx.authorizer.clone(),
                });
            }
            info!(admin = %new_admin, "admin transferred");
            staged.emit_config_change(ConfigChange::Admin(new_admin), &ctx.authorizer);
            Ok(())
        })
    }

    pub fn start(&mut self, ctx: &ActionContext) -> Result<Receipt, ExchangeError> {
        self.stage("start", |staged| {
            staged.admin_config_mut(ctx)?.running.unpause();
            info!("exchange started");
            staged.emit_config_change(ConfigChange::Started, &ctx.authorizer);
            Ok(())
        })
    }

    pub fn stop(&mut self, ctx: &ActionContext) -> Result<Receipt, ExchangeError> {
        self.stage("stop", |staged| {
            staged.admin_config_mut(ctx)?.running.pause();
            info!("exchange stopped");
            staged.emit_config_change(ConfigChange::Stopped, &ctx.authorizer);
            Ok(())
        })
    }

    /// Cancel and refund every order in both books
    pub fn clear_all_orders(&mut self, ctx: &ActionContext, reason: &str) -> Result<Receipt, ExchangeError> {
        self.stage("clear_all_orders", |staged| staged.clear(ctx, None, reason))
    }

    /// Cancel and refund every order escrowing `currency`
    pub fn clear_orders(
        &mut self,
        ctx: &ActionContext,
        currency: Currency,
        reason: &str,
    ) -> Result<Receipt, ExchangeError> {
        self.stage("clear_orders", |staged| staged.clear(ctx, Some(currency), reason))
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.state.engine.find(order_id)
    }

    pub fn depth(&self, levels: usize) -> BookDepth {
        self.state.engine.depth(levels)
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.state.engine
    }

    pub fn spot_rate(&self) -> Result<Rate, OracleError> {
        price_reference::spot_rate(&self.oracle)
    }

    pub fn min_trade_amount(&self, currency: Currency) -> Result<Asset, OracleError> {
        price_reference::min_trade_amount(&self.oracle, &self.settings, currency)
    }

    pub fn supply(&self) -> &SupplyLedger {
        &self.state.supply
    }

    pub fn config(&self) -> Option<&ExchangeConfig> {
        self.state.config.as_ref()
    }

    pub fn settings(&self) -> &ExchangeSettings {
        &self.settings
    }

    pub fn pending_expiration(&self, order_id: &OrderId) -> Option<Timestamp> {
        self.state.ttl.pending(order_id)
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Replace the price source (e.g. to follow the pool between blocks)
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain events (for processing).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Staged state plus read-only context for one action
struct Staged<'a, O: PriceOracle> {
    owner: &'a AccountName,
    settings: &'a ExchangeSettings,
    oracle: &'a O,
    state: ExchangeState,
    journal: Journal,
    emitted: Vec<ContractEvent>,
}

impl<'a, O: PriceOracle> Staged<'a, O> {
    fn emit(&mut self, event: ContractEvent) {
        self.emitted.push(event);
    }

    fn emit_config_change(&mut self, change: ConfigChange, updated_by: &AccountName) {
        self.emit(ContractEvent::ConfigUpdated(ConfigUpdated {
            change,
            updated_by: updated_by.clone(),
        }));
    }

    fn config(&self) -> Result<&ExchangeConfig, ExchangeError> {
        self.state.config.as_ref().ok_or(ExchangeError::NotInitialized)
    }

    fn admin_config_mut(&mut self, ctx: &ActionContext) -> Result<&mut ExchangeConfig, ExchangeError> {
        let config = self.state.config.as_mut().ok_or(ExchangeError::NotInitialized)?;
        config.access.require_admin(&ctx.authorizer)?;
        Ok(config)
    }

    fn require_running(&self) -> Result<(), ExchangeError> {
        self.config()?.running.require_running()
    }

    fn require_authorizer(&self, ctx: &ActionContext, account: &AccountName) -> Result<(), ExchangeError> {
        if &ctx.authorizer != account {
            return Err(ExchangeError::Unauthorized {
                account: ctx.authorizer.clone(),
            });
        }
        Ok(())
    }

    fn settlement(&mut self) -> Result<Settlement<'_>, ExchangeError> {
        let config = self.state.config.as_ref().ok_or(ExchangeError::NotInitialized)?;
        Ok(Settlement::new(config, &mut self.journal, &mut self.state.supply))
    }

    /// Validate, escrow, match and settle a new order
    fn place(
        &mut self,
        ctx: &ActionContext,
        request: &OrderRequest,
        debit_trader: bool,
    ) -> Result<OrderId, ExchangeError> {
        self.require_running()?;

        let order = ingestion::build_order(request, ctx.tx_id, ctx.now, self.settings, self.oracle)?;
        let order_id = order.order_id;
        if self.state.engine.contains(&order_id) {
            return Err(OrderError::DuplicateId { order_id }.into());
        }

        self.settlement()?.escrow_order(&order, debit_trader)?;
        info!(
            order_id = %order_id,
            trader = %order.trader,
            side = ?order.side,
            quantity = %order.quantity,
            rate = %order.rate,
            expires_at = %order.expires_at,
            force = request.force,
            "order accepted"
        );
        self.emit(ContractEvent::OrderPlaced(OrderPlaced {
            order_id,
            tx_id: order.tx_id,
            trader: order.trader.clone(),
            side: order.side,
            rate: order.rate,
            quantity: order.quantity,
            expires_at: order.expires_at,
            force: request.force,
        }));

        let result = self.state.engine.submit(order, request.force, ctx.now)?;

        for expired in &result.expired_makers {
            self.close_expired(expired, ctx.now)?;
        }

        for trade in &result.trades {
            self.settlement()?.settle_trade(trade)?;
            self.emit(ContractEvent::TradeSettled(TradeSettled {
                sequence: trade.sequence,
                buy_order_id: trade.buy_order_id,
                sell_order_id: trade.sell_order_id,
                buyer: trade.buyer.clone(),
                seller: trade.seller.clone(),
                rate: trade.rate,
                synthetic: trade.synthetic,
                base: trade.base,
                buyer_fee: trade.buyer_fee,
                seller_fee: trade.seller_fee,
                executed_at: trade.executed_at,
            }));
        }

        for filled in &result.filled_makers {
            self.close_filled(filled)?;
        }

        match result.disposition {
            Disposition::Filled { order, dust } => {
                self.close_filled(&ClosedOrder { order, refund: dust })?;
            }
            Disposition::Resting { order } => {
                if order.has_ttl() {
                    self.state
                        .ttl
                        .schedule(order.order_id, order.expires_at, &mut self.journal);
                }
            }
        }
        Ok(order_id)
    }

    fn close_filled(&mut self, closed: &ClosedOrder) -> Result<(), ExchangeError> {
        let order = &closed.order;
        self.state.ttl.cancel(&order.order_id, &mut self.journal);
        self.settlement()?
            .refund(order, closed.refund, format!("Dust refund for filled order {}", order.order_id))?;
        info!(order_id = %order.order_id, dust = %closed.refund, "order filled");
        self.emit(ContractEvent::OrderFilled(OrderFilled {
            order_id: order.order_id,
            trader: order.trader.clone(),
            dust_refund: closed.refund,
        }));
        Ok(())
    }

    fn close_expired(&mut self, closed: &ClosedOrder, now: Timestamp) -> Result<(), ExchangeError> {
        let order = &closed.order;
        self.state.ttl.cancel(&order.order_id, &mut self.journal);
        self.settlement()?
            .refund(order, closed.refund, format!("Order {} expired", order.order_id))?;
        info!(order_id = %order.order_id, refund = %closed.refund, "order expired");
        self.emit(ContractEvent::OrderExpired(OrderExpired {
            order_id: order.order_id,
            trader: order.trader.clone(),
            refund: closed.refund,
            expired_at: now,
        }));
        Ok(())
    }

    fn expire_order(&mut self, order_id: OrderId, now: Timestamp) -> Result<(), ExchangeError> {
        let mut order = self
            .state
            .engine
            .remove(&order_id)
            .ok_or_else(|| ExchangeError::order_not_found(order_id))?;
        let refund = order.expire()?;
        self.close_expired(&ClosedOrder { order, refund }, now)
    }

    fn cancel_order(&mut self, order_id: OrderId, caller: &AccountName) -> Result<(), ExchangeError> {
        let config = self.config()?;
        let order = self
            .state
            .engine
            .find(&order_id)
            .ok_or_else(|| ExchangeError::order_not_found(order_id))?;
        config.access.require_owner_or_admin(caller, &order.trader)?;
        let reason = if caller == &order.trader {
            CancelReason::OwnerRequested
        } else {
            CancelReason::AdminCancel
        };

        let mut order = self
            .state
            .engine
            .remove(&order_id)
            .ok_or_else(|| ExchangeError::order_not_found(order_id))?;
        let refund = order.cancel(reason)?;
        self.refund_canceled(&order, refund, reason, caller, "Order canceled")
    }

    fn refund_canceled(
        &mut self,
        order: &Order,
        refund: Asset,
        reason: CancelReason,
        caller: &AccountName,
        memo: &str,
    ) -> Result<(), ExchangeError> {
        self.state.ttl.cancel(&order.order_id, &mut self.journal);
        self.settlement()?
            .refund(order, refund, format!("{}: {}", memo, order.order_id))?;
        info!(order_id = %order.order_id, refund = %refund, reason = ?reason, "order canceled");
        self.emit(ContractEvent::OrderCanceled(OrderCanceled {
            order_id: order.order_id,
            trader: order.trader.clone(),
            reason,
            refund,
            canceled_by: caller.clone(),
        }));
        Ok(())
    }

    fn clear(&mut self, ctx: &ActionContext, currency: Option<Currency>, reason: &str) -> Result<(), ExchangeError> {
        self.admin_config_mut(ctx)?;
        let orders = self.state.engine.clear(currency.map(Side::for_currency));
        let count = orders.len();

        for mut order in orders {
            let refund = order.cancel(CancelReason::Cleared)?;
            self.refund_canceled(&order, refund, CancelReason::Cleared, &ctx.authorizer, reason)?;
        }

        info!(currency = ?currency, count, reason, "orders cleared");
        self.emit(ContractEvent::OrdersCleared(OrdersCleared {
            currency,
            reason: reason.to_string(),
            count,
        }));
        Ok(())
    }
}
