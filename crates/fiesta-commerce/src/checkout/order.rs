//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cart::LineItem;
use crate::ids::{OrderId, OrderLineId, ProductId, UserId};
use crate::money;
use crate::CommerceError;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting hosted payment.
    #[default]
    Pending,
    /// Recorded for payment outside the hosted flow.
    Reserved,
    /// Paid and settled.
    Completed,
    /// Cancelled by an administrator, or left behind by a failed reservation.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Reserved,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Reserved => "reserved",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Reserved => "Reserved",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CommerceError::UnknownStatus(s.to_string()))
    }
}

/// An order row as stored by the order collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest orders.
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The create-order payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    /// A bare order with no contact details.
    pub fn new(user_id: Option<UserId>, total_amount: Decimal, status: OrderStatus) -> Self {
        Self {
            user_id,
            total_amount,
            status,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            notes: None,
        }
    }

    /// Materialize the row a backend stores for this payload.
    pub fn into_order(self, id: OrderId, now: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            total_amount: self.total_amount,
            status: self.status,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An order line before its order exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineDraft {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&LineItem> for OrderLineDraft {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.name.clone(),
            price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

/// The create-order-lines payload entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl NewOrderLine {
    pub fn new(order_id: OrderId, draft: &OrderLineDraft) -> Self {
        Self {
            order_id,
            product_id: draft.product_id.clone(),
            product_name: draft.product_name.clone(),
            price: draft.price,
            quantity: draft.quantity,
        }
    }

    pub fn into_line(self, id: OrderLineId) -> OrderLine {
        OrderLine {
            id,
            order_id: self.order_id,
            product_id: self.product_id,
            product_name: self.product_name,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// A stored order line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.price, self.quantity)
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderSummary {
    /// Sum of `price * quantity` over the lines.
    pub fn line_total(&self) -> Decimal {
        money::sum_totals(self.lines.iter().map(OrderLine::line_total))
    }

    /// Whether the lines add up to the order's `total_amount`.
    ///
    /// Totals travel as floats on the wire, so both sides are compared at
    /// cent precision.
    pub fn is_consistent(&self) -> bool {
        self.line_total().round_dp(2) == self.order.total_amount.round_dp(2)
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Which orders a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by one user.
    Own(UserId),
    /// Every order in the store.
    All,
}

impl OrderScope {
    pub fn includes(&self, order: &Order) -> bool {
        match self {
            OrderScope::Own(user) => order.user_id.as_ref() == Some(user),
            OrderScope::All => true,
        }
    }
}
