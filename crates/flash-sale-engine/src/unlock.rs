//! Implementation of the unlock coordinator
//!
//! Admission into the claim path is gated independently of stock. The
//! concrete admission policy is pluggable; correctness of stock accounting
//! never depends on it.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Decision of an [`AdmissionPolicy`]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Admission {
    /// Admit the caller into the claim path
    Allow,
    /// Deny admission; a normal outcome, not a fault
    Deny,
}

/// Capability interface for admission gating
///
/// Concrete policies (token bucket, queue ticket, allow-all) are swappable
/// without touching the claim workflow.
pub trait AdmissionPolicy: Send + Sync {
    /// Decide whether `user` may attempt a claim on `product`
    fn decide(&self, user: &str, product: &str) -> Admission;
}

/// Policy admitting every unlock attempt
pub struct AllowAll;

impl AdmissionPolicy for AllowAll {
    fn decide(&self, _user: &str, _product: &str) -> Admission {
        Admission::Allow
    }
}

#[derive(Clone, Copy)]
struct Bucket {
    remaining: u32,
    window_start: Instant,
}

/// Per-user token bucket: at most `burst` admissions per refill interval
pub struct TokenBucket {
    buckets: DashMap<String, Bucket>,
    burst: u32,
    refill: Duration,
}

impl TokenBucket {
    /// Create a bucket policy granting `burst` admissions per `refill`
    pub fn new(burst: u32, refill: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            burst,
            refill,
        }
    }
}

impl AdmissionPolicy for TokenBucket {
    fn decide(&self, user: &str, _product: &str) -> Admission {
        let now = Instant::now();
        let mut bucket = self.buckets.entry(user.to_owned()).or_insert(Bucket {
            remaining: self.burst,
            window_start: now,
        });
        if now.duration_since(bucket.window_start) >= self.refill {
            bucket.remaining = self.burst;
            bucket.window_start = now;
        }
        if bucket.remaining == 0 {
            return Admission::Deny;
        }
        bucket.remaining -= 1;
        Admission::Allow
    }
}

struct TokenState {
    user: String,
    product: String,
    issued_at: Instant,
    used: bool,
}

/// A short-lived eligibility token issued to one (user, product) pair
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EligibilityToken {
    /// Opaque token id, presented back on a claim attempt
    pub id: Uuid,
}

/// Outcome of consuming an eligibility token
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Consume {
    /// The token was valid and is now spent
    Valid,
    /// The token's TTL elapsed before it was consumed
    Expired,
    /// The token has already authorized a claim attempt
    AlreadyUsed,
    /// The token was never issued, or is bound to a different (user, product)
    Unknown,
}

/// Issues and validates eligibility tokens
///
/// A token is single-use, bound to the (user, product) pair it was issued
/// for, and expires after a bounded TTL to prevent indefinite hoarding of
/// admission slots.
pub struct UnlockCoordinator {
    tokens: DashMap<Uuid, TokenState>,
    policy: Box<dyn AdmissionPolicy>,
    ttl: Duration,
}

impl UnlockCoordinator {
    /// Create a new [`UnlockCoordinator`] with the given policy and TTL
    pub fn new(policy: Box<dyn AdmissionPolicy>, ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            policy,
            ttl,
        }
    }

    /// Attempt to admit `user` and issue an [`EligibilityToken`]
    ///
    /// Returns [`None`] if the admission policy denies the attempt.
    pub fn unlock(&self, user: &str, product: &str) -> Option<EligibilityToken> {
        if self.policy.decide(user, product) == Admission::Deny {
            return None;
        }
        let id = Uuid::new_v4();
        self.tokens.insert(
            id,
            TokenState {
                user: user.to_owned(),
                product: product.to_owned(),
                issued_at: Instant::now(),
                used: false,
            },
        );
        Some(EligibilityToken { id })
    }

    /// Consume `token` for a claim attempt by `user` on `product`
    ///
    /// A token authorizes at most one claim attempt: on [`Consume::Valid`]
    /// it is marked spent before this method returns.
    pub fn consume(&self, token: Uuid, user: &str, product: &str) -> Consume {
        let Some(mut state) = self.tokens.get_mut(&token) else {
            return Consume::Unknown;
        };
        if state.user != user || state.product != product {
            return Consume::Unknown;
        }
        if state.issued_at.elapsed() > self.ttl {
            drop(state);
            self.tokens.remove(&token);
            return Consume::Expired;
        }
        if state.used {
            return Consume::AlreadyUsed;
        }
        state.used = true;
        Consume::Valid
    }

    /// Drop all expired tokens
    ///
    /// Called periodically by the sweeper thread so hoarded tokens do not
    /// accumulate.
    pub fn sweep_expired(&self) {
        self.tokens
            .retain(|_, state| state.issued_at.elapsed() <= self.ttl);
    }

    /// Revoke all outstanding tokens for `product` (admin reset)
    pub fn revoke_product(&self, product: &str) {
        self.tokens.retain(|_, state| state.product != product);
    }
}
