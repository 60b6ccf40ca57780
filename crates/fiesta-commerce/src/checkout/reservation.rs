//! Contact details for the reserve-now, pay-later path.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checkout::NewOrder;

/// A required reservation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationField {
    ContactName,
    ContactEmail,
    ContactPhone,
}

impl ReservationField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationField::ContactName => "contact_name",
            ReservationField::ContactEmail => "contact_email",
            ReservationField::ContactPhone => "contact_phone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReservationField::ContactName => "name",
            ReservationField::ContactEmail => "email",
            ReservationField::ContactPhone => "phone",
        }
    }
}

impl fmt::Display for ReservationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Form input for a reservation. Consumed by a single submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReservationRequest {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReservationRequest {
    pub fn new(
        contact_name: impl Into<String>,
        contact_email: impl Into<String>,
        contact_phone: impl Into<String>,
    ) -> Self {
        Self {
            contact_name: contact_name.into(),
            contact_email: contact_email.into(),
            contact_phone: contact_phone.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Required fields that are empty or whitespace, in form order.
    pub fn missing_fields(&self) -> Vec<ReservationField> {
        [
            (ReservationField::ContactName, &self.contact_name),
            (ReservationField::ContactEmail, &self.contact_email),
            (ReservationField::ContactPhone, &self.contact_phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Copy the trimmed contact details onto an order payload.
    pub(crate) fn apply_to(&self, order: &mut NewOrder) {
        order.contact_name = Some(self.contact_name.trim().to_string());
        order.contact_email = Some(self.contact_email.trim().to_string());
        order.contact_phone = Some(self.contact_phone.trim().to_string());
        order.notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_request() {
        let req = ReservationRequest::new("Ana", "ana@example.com", "555-0100");
        assert!(req.is_complete());
    }

    #[test]
    fn test_missing_fields_in_form_order() {
        let req = ReservationRequest::new(" ", "ana@example.com", "");
        assert_eq!(
            req.missing_fields(),
            vec![ReservationField::ContactName, ReservationField::ContactPhone]
        );
    }

    #[test]
    fn test_notes_are_optional_and_trimmed() {
        let mut order = NewOrder::new(None, rust_decimal::Decimal::ONE, crate::checkout::OrderStatus::Reserved);
        ReservationRequest::new(" Ana ", "a@b.c", "1")
            .with_notes("   ")
            .apply_to(&mut order);

        assert_eq!(order.contact_name.as_deref(), Some("Ana"));
        assert_eq!(order.notes, None);
    }
}
