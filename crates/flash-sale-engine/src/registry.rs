//! Implementation of the participation registry

use std::time::SystemTime;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Record of one successful claim
#[derive(Clone, Copy, Debug)]
pub struct ParticipationRecord {
    /// Instant the claim was committed
    pub claimed_at: SystemTime,
}

/// Outcome of a check-and-insert attempt
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClaimEntry {
    /// No record existed; one was inserted for the caller
    Claimed,
    /// A record already existed; nothing was inserted
    AlreadyClaimed,
}

/// Records, per (user, product) pair, whether a successful claim exists
///
/// The registry exclusively owns claim-existence mutation. Check-and-insert
/// goes through the map's entry API, so it is indivisible with respect to
/// concurrent callers for the same key: two concurrent callers for the same
/// (user, product) can never both observe [`ClaimEntry::Claimed`].
pub struct ParticipationRegistry {
    records: DashMap<(String, String), ParticipationRecord>,
}

impl ParticipationRegistry {
    /// Create an empty [`ParticipationRegistry`]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Check whether `user` already owns a claim for `product`
    pub fn has_claimed(&self, user: &str, product: &str) -> bool {
        self.records
            .contains_key(&(user.to_owned(), product.to_owned()))
    }

    /// Atomically check absence and insert a record if absent
    pub fn claim_if_absent(&self, user: &str, product: &str) -> ClaimEntry {
        match self.records.entry((user.to_owned(), product.to_owned())) {
            Entry::Occupied(_) => ClaimEntry::AlreadyClaimed,
            Entry::Vacant(entry) => {
                entry.insert(ParticipationRecord {
                    claimed_at: SystemTime::now(),
                });
                ClaimEntry::Claimed
            }
        }
    }

    /// Retract a record inserted by [`Self::claim_if_absent`]
    ///
    /// Used to roll a claim back when the stock decrement reports sold out,
    /// so stock exhaustion never permanently blocks a user who did not
    /// actually obtain stock.
    pub fn retract(&self, user: &str, product: &str) {
        self.records.remove(&(user.to_owned(), product.to_owned()));
    }

    /// Remove all records for `product` (admin reset)
    pub fn clear_product(&self, product: &str) {
        self.records.retain(|(_, p), _| p != product);
    }

    /// Count the participants of `product`
    pub fn count_for(&self, product: &str) -> u64 {
        self.records.iter().filter(|r| r.key().1 == product).count() as u64
    }
}
