//! Contract events
//!
//! Events are immutable records emitted by exchange actions. They are
//! appended to the log only when the emitting action commits.

use serde::{Deserialize, Serialize};
use types::ids::{AccountName, OrderId, TxId};
use types::numeric::{Asset, Currency, Rate};
use types::order::{CancelReason, Side, Timestamp};

/// A new order passed validation and entered matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub tx_id: TxId,
    pub trader: AccountName,
    pub side: Side,
    pub rate: Rate,
    pub quantity: Asset,
    pub expires_at: Timestamp,
    pub force: bool,
}

/// A trade was settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSettled {
    pub sequence: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer: AccountName,
    pub seller: AccountName,
    pub rate: Rate,
    pub synthetic: Asset,
    pub base: Asset,
    pub buyer_fee: Asset,
    pub seller_fee: Asset,
    pub executed_at: Timestamp,
}

/// An order left the book completely filled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub order_id: OrderId,
    pub trader: AccountName,
    /// Unspendable remainder returned to the trader
    pub dust_refund: Asset,
}

/// An order was cancelled and its escrow refunded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    pub order_id: OrderId,
    pub trader: AccountName,
    pub reason: CancelReason,
    pub refund: Asset,
    pub canceled_by: AccountName,
}

/// An order reached its TTL and its escrow was refunded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpired {
    pub order_id: OrderId,
    pub trader: AccountName,
    pub refund: Asset,
    pub expired_at: Timestamp,
}

/// Which part of the configuration changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigChange {
    Initialized { admin: AccountName, fee_recipient: AccountName },
    FeeRecipient(AccountName),
    TransferProxy(Option<AccountName>),
    Admin(AccountName),
    Started,
    Stopped,
}

/// Administrative configuration change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdated {
    pub change: ConfigChange,
    pub updated_by: AccountName,
}

/// Administrative clearing of one or both books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersCleared {
    /// `None` when both books were cleared
    pub currency: Option<Currency>,
    pub reason: String,
    pub count: usize,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    OrderPlaced(OrderPlaced),
    TradeSettled(TradeSettled),
    OrderFilled(OrderFilled),
    OrderCanceled(OrderCanceled),
    OrderExpired(OrderExpired),
    ConfigUpdated(ConfigUpdated),
    OrdersCleared(OrdersCleared),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_order_canceled_serialization() {
        let event = OrderCanceled {
            order_id: OrderId::from_u64(77),
            trader: AccountName::from("alice"),
            reason: CancelReason::OwnerRequested,
            refund: Asset::base(Decimal::new(15, 1)),
            canceled_by: AccountName::from("alice"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: OrderCanceled = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_contract_event_enum_variant() {
        let event = ContractEvent::OrdersCleared(OrdersCleared {
            currency: Some(Currency::Synthetic),
            reason: "maintenance".to_string(),
            count: 3,
        });
        assert!(matches!(event, ContractEvent::OrdersCleared(_)));
    }

    #[test]
    fn test_config_updated_serialization() {
        let event = ConfigUpdated {
            change: ConfigChange::TransferProxy(Some(AccountName::from("proxy"))),
            updated_by: AccountName::from("admin"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: ConfigUpdated = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
