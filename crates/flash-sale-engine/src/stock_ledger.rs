//! Implementation of the central stock ledger

use dashmap::DashMap;
use flash_sale_core::FlashSaleError;

/// Stock of a single product
#[derive(Clone, Copy, Debug)]
struct StockEntry {
    /// Quantity the product was initialized with
    total: u64,
    /// Remaining claimable quantity, always `<= total`
    remaining: u64,
}

/// Outcome of a decrement attempt
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Decrement {
    /// One unit was claimed; `remaining` is the count after the decrement
    Claimed {
        /// Stock remaining after this claim
        remaining: u64,
    },
    /// No stock remains (or the product was never initialized)
    SoldOut,
}

/// Holds the remaining claimable quantity per product
///
/// The ledger exclusively owns remaining-stock mutation. Each entry is
/// guarded by the map's per-key lock, so a decrement is atomic with respect
/// to all concurrent attempts for the same product.
pub struct StockLedger {
    products: DashMap<String, StockEntry>,
}

impl StockLedger {
    /// Create an empty [`StockLedger`]
    pub fn new() -> Self {
        Self {
            products: DashMap::new(),
        }
    }

    /// Set remaining = total = `quantity` for `product`
    ///
    /// Re-initializing an existing product overwrites the prior value; this
    /// is how an admin re-runs a sale.
    pub fn init(&self, product: &str, quantity: u64) {
        self.products.insert(
            product.to_owned(),
            StockEntry {
                total: quantity,
                remaining: quantity,
            },
        );
    }

    /// Check whether `product` has ever been initialized
    pub fn contains(&self, product: &str) -> bool {
        self.products.contains_key(product)
    }

    /// Get the remaining stock of `product`
    ///
    /// Returns [`None`] for a product that was never initialized.
    pub fn remaining(&self, product: &str) -> Option<u64> {
        self.products.get(product).map(|entry| entry.remaining)
    }

    /// Atomically test `remaining > 0` and decrement by one if so
    ///
    /// This is the single oversell-prevention primitive: the number of
    /// [`Decrement::Claimed`] outcomes for a product can never exceed its
    /// initialized quantity. An uninitialized product reports
    /// [`Decrement::SoldOut`] with no mutation.
    pub fn try_decrement(&self, product: &str) -> Result<Decrement, FlashSaleError> {
        let Some(mut entry) = self.products.get_mut(product) else {
            return Ok(Decrement::SoldOut);
        };
        if entry.remaining > entry.total {
            return Err(FlashSaleError::Fault(format!(
                "stock ledger corrupt for {product}: remaining {} exceeds total {}",
                entry.remaining, entry.total
            )));
        }
        if entry.remaining == 0 {
            return Ok(Decrement::SoldOut);
        }
        entry.remaining -= 1;
        Ok(Decrement::Claimed {
            remaining: entry.remaining,
        })
    }

    /// Reset `product` to `quantity` units, or close the sale with 0
    ///
    /// Returns `false` if the product was never initialized.
    pub fn reset(&self, product: &str, quantity: Option<u64>) -> bool {
        let Some(mut entry) = self.products.get_mut(product) else {
            return false;
        };
        let quantity = quantity.unwrap_or(0);
        *entry = StockEntry {
            total: quantity,
            remaining: quantity,
        };
        true
    }
}
