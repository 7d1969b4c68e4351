use serde::{Deserialize, Serialize};

use storefront_catalog::Product;
use storefront_core::{DomainError, DomainResult, Money, ProductId};

/// A requested cart line, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order line with name and price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderLine {
    /// Snapshot a sellable product for `quantity` units.
    pub fn snapshot(product: &Product, quantity: u32) -> DomainResult<Self> {
        product.ensure_sellable(quantity)?;
        let subtotal = product
            .price
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::validation("invalid_price", "line subtotal overflows"))?;

        Ok(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            subtotal,
        })
    }
}

/// Merge repeated products and reject empty carts or zero quantities.
///
/// First-seen order is kept.
pub fn consolidate(requests: &[LineRequest]) -> DomainResult<Vec<LineRequest>> {
    if requests.is_empty() {
        return Err(DomainError::validation("empty_order", "order has no lines"));
    }

    let mut merged: Vec<LineRequest> = Vec::with_capacity(requests.len());
    for req in requests {
        if req.quantity == 0 {
            return Err(DomainError::validation(
                "invalid_quantity",
                "line quantity must be at least 1",
            ));
        }
        match merged.iter_mut().find(|l| l.product_id == req.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(req.quantity).ok_or_else(|| {
                    DomainError::validation("invalid_quantity", "line quantity overflows")
                })?;
            }
            None => merged.push(*req),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_catalog::ProductDraft;

    fn product(price: u64, stock: i64) -> Product {
        ProductDraft {
            name: "Lamp".into(),
            price: Money::from_minor(price),
            stock_quantity: stock,
            ..ProductDraft::default()
        }
        .into_product(ProductId::new(), "EGP", Utc::now())
        .unwrap()
    }

    #[test]
    fn snapshot_computes_subtotal() {
        let p = product(1000, 5);
        let line = OrderLine::snapshot(&p, 2).unwrap();
        assert_eq!(line.subtotal, Money::from_minor(2000));
        assert_eq!(line.product_name, "Lamp");
    }

    #[test]
    fn snapshot_rejects_oversized_quantity() {
        let p = product(1000, 1);
        assert_eq!(OrderLine::snapshot(&p, 2).unwrap_err().code(), "out_of_stock");
    }

    #[test]
    fn consolidate_merges_duplicates() {
        let a = ProductId::new();
        let b = ProductId::new();
        let merged = consolidate(&[
            LineRequest { product_id: a, quantity: 1 },
            LineRequest { product_id: b, quantity: 2 },
            LineRequest { product_id: a, quantity: 3 },
        ])
        .unwrap();

        assert_eq!(
            merged,
            vec![
                LineRequest { product_id: a, quantity: 4 },
                LineRequest { product_id: b, quantity: 2 },
            ]
        );
    }

    #[test]
    fn consolidate_rejects_empty_and_zero() {
        assert_eq!(consolidate(&[]).unwrap_err().code(), "empty_order");
        let zero = [LineRequest { product_id: ProductId::new(), quantity: 0 }];
        assert_eq!(consolidate(&zero).unwrap_err().code(), "invalid_quantity");
    }
}
