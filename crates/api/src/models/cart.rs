//! Shopping cart types.

use serde::Serialize;

use shopvely_core::{CartId, CartItemId, Money, MoneyError, Quantity, order_total};

use super::ProductSummary;

/// A stored cart line joined with current catalog data.
#[derive(Debug, Clone)]
pub struct CartEntry {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: Quantity,
}

/// One line of a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: Quantity,
    /// Current price times quantity. Not stored.
    pub subtotal: Money,
}

/// A user's cart with computed totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartLine>,
    /// Sum of line subtotals at current catalog prices. Not stored.
    pub total: Money,
}

impl Cart {
    /// Price the entries at their current catalog prices.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::TooLarge`] if a line or the total passes
    /// [`Money::MAX`].
    pub fn new(id: CartId, entries: Vec<CartEntry>) -> Result<Self, MoneyError> {
        let total = order_total(
            entries
                .iter()
                .map(|entry| (entry.product.price, entry.quantity)),
        )?;

        let items = entries
            .into_iter()
            .map(|entry| {
                Ok(CartLine {
                    subtotal: entry.product.price.times(entry.quantity)?,
                    id: entry.id,
                    product: entry.product,
                    quantity: entry.quantity,
                })
            })
            .collect::<Result<_, MoneyError>>()?;

        Ok(Self { id, items, total })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopvely_core::ProductId;

    use super::*;

    fn entry(id: i32, cents: i64, qty: i32) -> CartEntry {
        CartEntry {
            id: CartItemId::new(id),
            product: ProductSummary {
                id: ProductId::new(id),
                title: format!("Product {id}"),
                price: Money::new(Decimal::new(cents, 2)).unwrap(),
                image: String::new(),
            },
            quantity: Quantity::new(qty).unwrap(),
        }
    }

    #[test]
    fn test_totals() {
        let cart = Cart::new(CartId::new(1), vec![entry(1, 100_00, 2), entry(2, 50_00, 1)]).unwrap();
        assert_eq!(cart.items[0].subtotal.amount(), Decimal::new(200_00, 2));
        assert_eq!(cart.items[1].subtotal.amount(), Decimal::new(50_00, 2));
        assert_eq!(cart.total.amount(), Decimal::new(250_00, 2));
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let cart = Cart::new(CartId::new(1), Vec::new()).unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, Money::ZERO);
    }

    #[test]
    fn test_total_above_max_is_rejected() {
        let err = Cart::new(CartId::new(1), vec![entry(1, 100_00, 1_000_000)]).unwrap_err();
        assert_eq!(err, MoneyError::TooLarge);

        let err = Cart::new(
            CartId::new(1),
            vec![entry(1, 60_000_000_00, 1), entry(2, 40_000_000_00, 1)],
        )
        .unwrap_err();
        assert_eq!(err, MoneyError::TooLarge);
    }
}
