//! The composed claim workflow

use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use flash_sale_core::{Config, FlashSaleError, Rejection};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::registry::{ClaimEntry, ParticipationRegistry};
use crate::stock_ledger::{Decrement, StockLedger};
use crate::time_gate::TimeGate;
use crate::unlock::{
    AdmissionPolicy, AllowAll, Consume, EligibilityToken, TokenBucket, UnlockCoordinator,
};

/// Confirmation of a successful claim
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ClaimReceipt {
    /// Stock remaining after this claim
    pub remaining: u64,
}

/// The flash-sale service: time gate, stock ledger, participation registry
/// and unlock coordinator composed into the claim workflow
///
/// The dedupe-and-decrement pair runs inside a per-product mutex, so the
/// combined effect of N concurrent claim attempts is equivalent to some
/// serial ordering of those attempts. The lock deliberately does not cover
/// the time gate or the token consume; holding it across the admission
/// decision would be a latency hazard.
pub struct FlashSaleService {
    pub(crate) gate: TimeGate,
    pub(crate) ledger: StockLedger,
    pub(crate) registry: ParticipationRegistry,
    pub(crate) coordinator: UnlockCoordinator,

    /// One claim lock per product, created on first use
    claim_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FlashSaleService {
    /// Create a new [`FlashSaleService`] from `config`
    pub fn new(config: &Config) -> Self {
        let policy: Box<dyn AdmissionPolicy> = if config.unlock_burst == 0 {
            Box::new(AllowAll)
        } else {
            Box::new(TokenBucket::new(
                config.unlock_burst,
                std::time::Duration::from_secs(config.unlock_refill.max(1) as u64),
            ))
        };
        Self {
            gate: TimeGate::new(config.start_time),
            ledger: StockLedger::new(),
            registry: ParticipationRegistry::new(),
            coordinator: UnlockCoordinator::new(
                policy,
                std::time::Duration::from_secs(config.token_ttl as u64),
            ),
            claim_locks: DashMap::new(),
        }
    }

    /// Get the claim lock for `product`
    ///
    /// Admin operations take the same lock to serialize against in-flight
    /// claim attempts for the product.
    pub(crate) fn claim_lock(&self, product: &str) -> Arc<Mutex<()>> {
        self.claim_locks
            .entry(product.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Request admission and issue an eligibility token
    pub fn unlock(&self, user: &str, product: &str) -> Result<EligibilityToken, FlashSaleError> {
        match self.coordinator.unlock(user, product) {
            Some(token) => Ok(token),
            None => Err(Rejection::Denied.into()),
        }
    }

    /// Attempt to claim one unit of `product` for `user`
    ///
    /// Protocol: time gate, then token consume, then — atomically per
    /// product — dedupe-then-decrement with rollback on sold-out. A failed
    /// attempt leaves no partial effect.
    pub fn participate(
        &self,
        user: &str,
        product: &str,
        token: Option<Uuid>,
    ) -> Result<ClaimReceipt, FlashSaleError> {
        if !self.gate.is_open(SystemTime::now()) {
            return Err(Rejection::NotStarted.into());
        }

        let Some(token) = token else {
            return Err(Rejection::NotEligible.into());
        };
        if self.coordinator.consume(token, user, product) != Consume::Valid {
            return Err(Rejection::NotEligible.into());
        }

        let lock = self.claim_lock(product);
        let _guard = lock.lock();

        if self.registry.claim_if_absent(user, product) == ClaimEntry::AlreadyClaimed {
            // the ledger must not be touched on this path
            return Err(Rejection::AlreadyParticipated.into());
        }

        match self.ledger.try_decrement(product) {
            Ok(Decrement::Claimed { remaining }) => {
                tracing::info!(user, product, remaining, "claim committed");
                Ok(ClaimReceipt { remaining })
            }
            Ok(Decrement::SoldOut) => {
                // retract the record inserted above; a user who got nothing
                // must not be left marked as claimed
                self.registry.retract(user, product);
                Err(Rejection::SoldOut.into())
            }
            Err(fault) => {
                self.registry.retract(user, product);
                tracing::error!(user, product, %fault, "claim aborted on fault");
                Err(fault)
            }
        }
    }

    /// Get the remaining stock of `product`
    pub fn stock(&self, product: &str) -> Result<u64, FlashSaleError> {
        self.ledger
            .remaining(product)
            .ok_or_else(|| Rejection::UnknownProduct.into())
    }

    /// Check whether `user` owns a successful claim for `product`
    pub fn has_participated(&self, user: &str, product: &str) -> Result<bool, FlashSaleError> {
        if !self.ledger.contains(product) {
            return Err(Rejection::UnknownProduct.into());
        }
        Ok(self.registry.has_claimed(user, product))
    }

    /// Get the scheduled start instant as unix seconds, if any
    pub fn start_time(&self) -> Option<u64> {
        self.gate.start_unix_secs()
    }
}
