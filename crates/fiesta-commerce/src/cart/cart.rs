//! Cart and line item types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::ProductSnapshot;
use crate::ids::ProductId;
use crate::money;

/// A shopping cart: line items in the order they were first added.
///
/// Holds at most one line per product; adding a product that is already
/// present merges into its quantity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of a product.
    ///
    /// Returns `false` (and leaves the cart untouched) only for a zero
    /// quantity.
    pub fn add_item(&mut self, product: ProductSnapshot, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return true;
        }

        self.items.push(LineItem {
            product_id: product.id,
            name: product.name,
            unit_price: product.unit_price,
            image: product.image,
            quantity,
        });
        true
    }

    /// Remove the line for a product. Returns whether one was present.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() < len_before
    }

    /// Set a line's quantity. Zero or below removes the line.
    ///
    /// Returns whether the cart changed; unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove every line. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        let had_items = !self.items.is_empty();
        self.items.clear();
        had_items
    }

    /// Take away the quantities in `ordered`, dropping lines that reach zero.
    ///
    /// Lines and units added after `ordered` was taken are kept. Returns
    /// whether the cart changed.
    pub fn remove_ordered(&mut self, ordered: &[LineItem]) -> bool {
        let mut changed = false;
        for line in ordered {
            if let Some(item) = self.items.iter_mut().find(|i| i.product_id == line.product_id) {
                item.quantity = item.quantity.saturating_sub(line.quantity);
                changed = true;
            }
        }
        self.items.retain(|i| i.quantity > 0);
        changed
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line for a product, if present.
    pub fn get(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Sum of quantities across all lines.
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` across all lines, unrounded.
    pub fn total_price(&self) -> Decimal {
        money::sum_totals(self.items.iter().map(LineItem::line_total))
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One product and its quantity in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub product_id: ProductId,
    /// Product name at add time.
    pub name: String,
    /// Unit price at add time.
    pub unit_price: Decimal,
    /// Image reference at add time.
    pub image: String,
    /// Always at least 1.
    pub quantity: u32,
}

impl LineItem {
    /// `unit_price * quantity`, saturating at `Decimal::MAX`.
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.unit_price, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(id: &str, price: Decimal) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: price,
            image: String::new(),
        }
    }

    #[test]
    fn test_add_same_product_merges_quantity() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("p", dec!(4)), 2);
        cart.add_item(snapshot("p", dec!(4)), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductId::new("p")).unwrap().quantity, 5);
    }

    #[test]
    fn test_merge_keeps_first_snapshot() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("p", dec!(4)), 1);
        cart.add_item(snapshot("p", dec!(9)), 1);

        assert_eq!(cart.items()[0].unit_price, dec!(4));
        assert_eq!(cart.total_price(), dec!(8));
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("A", dec!(10)), 2);
        cart.add_item(snapshot("B", dec!(5)), 1);

        assert_eq!(cart.total_item_count(), 3);
        assert_eq!(cart.total_price(), dec!(25));
    }

    #[test]
    fn test_totals_are_not_rounded() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("A", dec!(0.333)), 3);
        assert_eq!(cart.total_price(), dec!(0.999));
    }

    #[test]
    fn test_oversized_line_does_not_overflow() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("A", Decimal::MAX), u32::MAX);
        cart.add_item(snapshot("B", dec!(1)), 1);

        assert_eq!(cart.items()[0].line_total(), Decimal::MAX);
        assert_eq!(cart.total_price(), Decimal::MAX);
    }

    #[test]
    fn test_update_quantity_zero_equals_remove() {
        let mut by_update = Cart::new();
        by_update.add_item(snapshot("A", dec!(1)), 1);
        by_update.add_item(snapshot("B", dec!(1)), 1);
        let mut by_remove = by_update.clone();

        assert!(by_update.update_quantity(&ProductId::new("A"), 0));
        assert!(by_remove.remove_item(&ProductId::new("A")));
        assert_eq!(by_update, by_remove);

        assert!(by_update.update_quantity(&ProductId::new("B"), -4));
        assert!(by_update.is_empty());
    }

    #[test]
    fn test_update_quantity_unknown_product_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.update_quantity(&ProductId::new("missing"), 3));
        assert!(!cart.remove_item(&ProductId::new("missing")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = Cart::new();
        for id in ["c", "a", "b"] {
            cart.add_item(snapshot(id, dec!(1)), 1);
        }
        cart.add_item(snapshot("a", dec!(1)), 1);
        cart.update_quantity(&ProductId::new("c"), 7);

        let order: Vec<&str> = cart.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_zero_quantity_add_is_ignored() {
        let mut cart = Cart::new();
        assert!(!cart.add_item(snapshot("A", dec!(1)), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("A", dec!(3)), 2);

        assert!(cart.clear());
        assert!(!cart.clear());
        assert_eq!(cart.total_item_count(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_remove_ordered_keeps_later_additions() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("A", dec!(10)), 2);
        cart.add_item(snapshot("B", dec!(5)), 1);
        let ordered = cart.items().to_vec();

        cart.add_item(snapshot("A", dec!(10)), 1);
        cart.add_item(snapshot("C", dec!(7)), 4);

        assert!(cart.remove_ordered(&ordered));
        let left: Vec<(&str, u32)> = cart
            .items()
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity))
            .collect();
        assert_eq!(left, vec![("A", 1), ("C", 4)]);
    }

    #[test]
    fn test_remove_ordered_ignores_lines_already_gone() {
        let mut cart = Cart::new();
        cart.add_item(snapshot("A", dec!(10)), 2);
        let ordered = cart.items().to_vec();
        cart.remove_item(&ProductId::new("A"));

        assert!(!cart.remove_ordered(&ordered));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_final_state_is_order_independent() {
        let a = || snapshot("A", dec!(10));
        let b = || snapshot("B", dec!(5));

        let mut first = Cart::new();
        first.add_item(a(), 1);
        first.add_item(b(), 4);
        first.update_quantity(&ProductId::new("A"), 2);
        first.update_quantity(&ProductId::new("B"), 1);

        let mut second = Cart::new();
        second.add_item(b(), 1);
        second.add_item(a(), 3);
        second.remove_item(&ProductId::new("A"));
        second.add_item(a(), 2);

        assert_eq!(first.total_item_count(), second.total_item_count());
        assert_eq!(first.total_price(), second.total_price());
        assert_eq!(first.total_price(), dec!(25));
    }
}
