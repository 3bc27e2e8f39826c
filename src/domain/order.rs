use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a persisted order. `Pending` is the only initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "FAILED" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// Terminal state an order is finalized into. Kept separate from
/// [`OrderStatus`] so that `Pending` can never be written by `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalState {
    Confirmed,
    Failed,
}

impl From<FinalState> for OrderStatus {
    fn from(state: FinalState) -> Self {
        match state {
            FinalState::Confirmed => OrderStatus::Confirmed,
            FinalState::Failed => OrderStatus::Failed,
        }
    }
}

/// Courier delivery mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryType {
    #[default]
    Home,
    Point,
}

impl DeliveryType {
    pub fn code(&self) -> i16 {
        match self {
            DeliveryType::Home => 0,
            DeliveryType::Point => 1,
        }
    }
}

impl TryFrom<i64> for DeliveryType {
    type Error = i64;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DeliveryType::Home),
            1 => Ok(DeliveryType::Point),
            other => Err(other),
        }
    }
}

/// A validated order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub invoice: String,
    pub user_id: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub cod_amount: BigDecimal,
    pub note: Option<String>,
    pub item_description: Option<String>,
    pub delivery_type: DeliveryType,
}

/// The durable order record as owned by the order store.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub invoice: String,
    pub user_id: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub cod_amount: BigDecimal,
    pub note: Option<String>,
    pub item_description: Option<String>,
    pub delivery_type: DeliveryType,
    pub status: OrderStatus,
    pub provider_response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build the initial `PENDING` record for `new`, stamped with `now`.
    pub fn pending(new: NewOrder, now: DateTime<Utc>) -> Self {
        Order {
            invoice: new.invoice,
            user_id: new.user_id,
            recipient_name: new.recipient_name,
            recipient_phone: new.recipient_phone,
            recipient_address: new.recipient_address,
            cod_amount: new.cod_amount,
            note: new.note,
            item_description: new.item_description,
            delivery_type: new.delivery_type,
            status: OrderStatus::Pending,
            provider_response: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}
