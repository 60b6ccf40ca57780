//! Money type for representing monetary values.
//!
//! Amounts are exact decimals. Nothing is rounded while totals are being
//! accumulated; rounding to the currency's minor unit happens only when a
//! value is formatted for display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CommerceError;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    MXN,
    CAD,
    JPY,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::MXN => "MXN",
            Currency::CAD => "CAD",
            Currency::JPY => "JPY",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::MXN => "MX$",
            Currency::CAD => "CA$",
            Currency::JPY => "\u{00a5}",
        }
    }

    /// Get the number of decimal places shown for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "MXN" => Some(Currency::MXN),
            "CAD" => Some(Currency::CAD),
            "JPY" => Some(Currency::JPY),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::from_code(s).ok_or_else(|| CommerceError::UnknownCurrency(s.to_string()))
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Exact amount in major units (e.g., dollars).
    pub amount: Decimal,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// The amount rounded to the currency's minor unit.
    ///
    /// ```
    /// use fiesta_commerce::money::{Currency, Money};
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::new(Decimal::new(10005, 3), Currency::USD); // 10.005
    /// assert_eq!(m.rounded().to_string(), "10.01");
    /// ```
    pub fn rounded(&self) -> Decimal {
        self.amount.round_dp_with_strategy(
            self.currency.decimal_places(),
            RoundingStrategy::MidpointAwayFromZero,
        )
    }

    /// Format as a display string (e.g., "$49.99").
    pub fn display(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{}{:.places$}", self.currency.symbol(), self.rounded())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// `price * quantity`, pinned at `Decimal::MAX` instead of overflowing.
pub(crate) fn line_total(price: Decimal, quantity: u32) -> Decimal {
    price.saturating_mul(Decimal::from(quantity))
}

/// Sum of line totals, pinned at `Decimal::MAX` instead of overflowing.
pub(crate) fn sum_totals(totals: impl IntoIterator<Item = Decimal>) -> Decimal {
    totals
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
