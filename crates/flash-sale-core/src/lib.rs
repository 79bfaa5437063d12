//! 🏗 Infrastructure for handling flash-sale requests, etc.
#![warn(missing_docs)]

mod error;
mod request;

pub use error::{FlashSaleError, Rejection};
pub use request::{RawRequest, Request, RequestHandler, RequestKind, RequestMethod};

/// Configuration of the flash-sale system
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Sale start instant as unix seconds
    ///
    /// [`None`] means the sale is not scheduled yet; every claim attempt is
    /// rejected as not started until an admin sets a start time.
    pub start_time: Option<u64>,
    /// Timeout in seconds after which eligibility tokens expire
    pub token_ttl: u32,
    /// Seconds between two sweeps of expired eligibility tokens
    pub sweep_interval: u32,
    /// Unlock admissions granted per user within one refill interval
    ///
    /// 0 disables rate gating entirely, i.e. every unlock is admitted.
    pub unlock_burst: u32,
    /// Refill interval of the unlock rate gate, in seconds
    pub unlock_refill: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_time: None,
            token_ttl: 30,
            sweep_interval: 10,
            unlock_burst: 0,
            unlock_refill: 1,
        }
    }
}
