//! Background sweeper for expired eligibility tokens

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::service::FlashSaleService;

/// Periodically drops expired eligibility tokens
pub struct TokenSweeper {
    service: Arc<FlashSaleService>,
    interval_secs: u32,
    shutdown: Receiver<()>,
}

impl TokenSweeper {
    /// Create a new [`TokenSweeper`]
    pub fn new(service: Arc<FlashSaleService>, interval_secs: u32, shutdown: Receiver<()>) -> Self {
        Self {
            service,
            interval_secs,
            shutdown,
        }
    }

    /// The sweeper's main routine
    ///
    /// Sleeps on the shutdown channel between sweeps; any message (or the
    /// sender being dropped) terminates the loop.
    pub fn run(&mut self) {
        let interval = Duration::from_secs(self.interval_secs.max(1) as u64);
        loop {
            match self.shutdown.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    self.service.coordinator.sweep_expired();
                }
            }
        }
    }
}
