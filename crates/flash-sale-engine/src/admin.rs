//! Privileged administration operations

use std::sync::Arc;

use flash_sale_core::{FlashSaleError, Rejection};

use crate::service::FlashSaleService;

/// Privileged controller mutating sale state outside the claim workflow
///
/// Every mutation takes the product's claim lock, so no claim attempt can
/// observe a half-applied init or reset.
pub struct AdminController {
    service: Arc<FlashSaleService>,
}

impl AdminController {
    /// Create a new [`AdminController`] over `service`
    pub fn new(service: Arc<FlashSaleService>) -> Self {
        Self { service }
    }

    /// Initialize (or re-initialize) the stock of `product` to `quantity`
    pub fn init_stock(&self, product: &str, quantity: u64) {
        let lock = self.service.claim_lock(product);
        let _guard = lock.lock();
        self.service.ledger.init(product, quantity);
        tracing::info!(product, quantity, "stock initialized");
    }

    /// Reset the sale state of `product`
    ///
    /// Clears the stock (to 0, or to `quantity` for an immediate re-run),
    /// removes all participation records and revokes outstanding tokens.
    /// The ledger is reset before the registry is cleared; if the pair were
    /// ever split, a stale participation record blocks a re-claim rather
    /// than permitting an oversell.
    pub fn reset_flash_sale(
        &self,
        product: &str,
        quantity: Option<u64>,
    ) -> Result<(), FlashSaleError> {
        let lock = self.service.claim_lock(product);
        let _guard = lock.lock();
        if !self.service.ledger.reset(product, quantity) {
            return Err(Rejection::UnknownProduct.into());
        }
        self.service.registry.clear_product(product);
        self.service.coordinator.revoke_product(product);
        tracing::info!(product, ?quantity, "flash sale reset");
        Ok(())
    }

    /// Set or override the sale start instant
    pub fn set_start_time(&self, start_unix_secs: u64) {
        self.service.gate.set_start_time(start_unix_secs);
    }

    /// Count the participants of `product`
    pub fn participants_count(&self, product: &str) -> Result<u64, FlashSaleError> {
        if !self.service.ledger.contains(product) {
            return Err(Rejection::UnknownProduct.into());
        }
        Ok(self.service.registry.count_for(product))
    }
}
