use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    PaymentPending,
    PaymentCancelled,
    Paid,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Statuses that no longer hold their table.
    pub const SETTLED: [OrderStatus; 3] = [
        OrderStatus::Paid,
        OrderStatus::Cancelled,
        OrderStatus::PaymentCancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::PaymentPending => "PaymentPending",
            OrderStatus::PaymentCancelled => "PaymentCancelled",
            OrderStatus::Paid => "Paid",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
        }
    }

    /// An active order blocks its table from taking another order.
    pub fn is_active(&self) -> bool {
        !Self::SETTLED.contains(self)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::PaymentCancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(OrderStatus::Created),
            "PaymentPending" => Ok(OrderStatus::PaymentPending),
            "PaymentCancelled" => Ok(OrderStatus::PaymentCancelled),
            "Paid" => Ok(OrderStatus::Paid),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "Failed" => Ok(OrderStatus::Failed),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Opaque row-version used for compare-and-swap writes. A fresh token is minted on
/// every mutation of the order row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(Vec<u8>);

impl VersionToken {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().as_bytes().to_vec())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A value read together with the version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: VersionToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub table_number: i32,
    pub items: Vec<OrderItem>,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub confirmed_at: DateTime<Utc>,
}

/// An order ready to be persisted with its initial version.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order: Order,
    pub version: VersionToken,
}

/// One requested line of a new order, naming the product the way the menu displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub product_name: String,
    pub quantity: i32,
}

impl OrderItemRequest {
    /// Client forms sometimes submit template rows; those never reach the order engine.
    pub fn is_placeholder(&self) -> bool {
        let name = self.product_name.trim();
        name.is_empty() || name == "string" || self.quantity <= 0
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub table_number: i32,
    pub user_id: Uuid,
    pub items: Vec<OrderItemRequest>,
}

pub fn compute_total(items: &[OrderItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + item.line_total())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptItem {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub order_id: Uuid,
    pub table_number: i32,
    pub confirmed_at: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub items: Vec<ReceiptItem>,
}
