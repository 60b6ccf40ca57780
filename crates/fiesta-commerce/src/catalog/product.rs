//! Product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use crate::CommerceError;

/// Image shown for products that were saved without one.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400?text=Sin+Imagen";

/// A sellable product, as returned by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units available to rent.
    #[serde(default)]
    pub stock: i64,
    /// Image reference, if one was uploaded.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The image to display, falling back to [`PLACEHOLDER_IMAGE`].
    pub fn image_or_placeholder(&self) -> &str {
        match self.image.as_deref() {
            Some(image) if !image.trim().is_empty() => image,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Capture the display fields a cart line keeps.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.price,
            image: self.image_or_placeholder().to_string(),
        }
    }
}

/// The product fields copied into the cart at add time.
///
/// The cart never re-reads the catalog, so later price or name changes do
/// not reach lines that are already in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub image: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        product.snapshot()
    }
}

/// Fields an administrator supplies to create or update a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductDraft {
    /// Problems that would make the backend reject this draft.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("name is required");
        }
        if self.description.trim().is_empty() {
            problems.push("description is required");
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            problems.push("price must not be negative");
        }
        if self.stock < 0 {
            problems.push("stock must not be negative");
        }
        problems
    }

    /// Check the draft before it is sent anywhere.
    pub fn validate(&self) -> Result<(), CommerceError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CommerceError::ValidationError(problems.join(", ")))
        }
    }
}
