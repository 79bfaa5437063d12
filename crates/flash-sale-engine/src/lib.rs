//! Implementation of the flash-sale claim service
//!
//! The service lets a strictly bounded quantity of a product be claimed
//! exactly once per eligible user under burst traffic, without overselling,
//! without losing a legitimate claim, and with idempotent re-queries.
//!
//! Components: the [time gate][time_gate], [stock ledger][stock_ledger],
//! [participation registry][registry], [unlock coordinator][unlock] and
//! [admin controller][admin], composed by the [claim workflow][service].

#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]

use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use flash_sale_core::{Config, FlashSaleError, Rejection, Request, RequestHandler, RequestKind};

mod admin;
mod registry;
mod service;
mod stock_ledger;
mod sweeper;
mod time_gate;
mod unlock;

pub use admin::AdminController;
pub use registry::{ClaimEntry, ParticipationRecord, ParticipationRegistry};
pub use service::{ClaimReceipt, FlashSaleService};
pub use stock_ledger::{Decrement, StockLedger};
pub use time_gate::TimeGate;
pub use unlock::{
    Admission, AdmissionPolicy, AllowAll, Consume, EligibilityToken, TokenBucket,
    UnlockCoordinator,
};

use sweeper::TokenSweeper;

/// Entrypoint of the flash-sale engine
///
/// Constructs the service, spawns the token sweeper thread and returns an
/// [`Engine`] which is served requests by the surrounding infrastructure.
pub fn launch(config: &Config) -> Engine {
    let service = Arc::new(FlashSaleService::new(config));
    let admin = AdminController::new(service.clone());

    let (sweeper_shutdown, shutdown_receiver) = mpsc::channel();
    let mut sweeper = TokenSweeper::new(service.clone(), config.sweep_interval, shutdown_receiver);
    let sweeper_thread = thread::spawn(move || {
        sweeper.run();
    });

    Engine {
        service,
        admin,
        sweeper_shutdown,
        sweeper_thread,
    }
}

/// The flash-sale engine
///
/// ⚠️ This struct must implement the [`RequestHandler`] trait, and it must
/// be exposed from the crate root (to be used from the server and the test
/// harness as `flash_sale_engine::Engine`).
pub struct Engine {
    service: Arc<FlashSaleService>,
    admin: AdminController,
    sweeper_shutdown: mpsc::Sender<()>,
    sweeper_thread: JoinHandle<()>,
}

/// Answer `rq` with `err`, logging faults on the way out
fn respond_with(rq: Request, err: FlashSaleError) {
    match err {
        FlashSaleError::Rejected(rejection) => rq.respond_with_rejection(&rejection),
        FlashSaleError::Fault(message) => {
            tracing::error!(%message, "request failed on internal fault");
            rq.respond_with_fault(message);
        }
    }
}

/// Extract the user id, answering the request on failure
macro_rules! require_user {
    ($rq:expr) => {
        match $rq.user_id() {
            Some(user) => user.to_owned(),
            None => {
                $rq.respond_with_rejection(&Rejection::InvalidInput("missing user id".into()));
                return;
            }
        }
    };
}

/// Extract the product id, answering the request on failure
macro_rules! require_product {
    ($rq:expr) => {
        match $rq.product_id() {
            Some(product) => product.to_owned(),
            None => {
                $rq.respond_with_rejection(&Rejection::InvalidInput("missing product id".into()));
                return;
            }
        }
    };
}

impl RequestHandler for Engine {
    fn handle(&self, mut rq: Request) {
        match rq.kind() {
            RequestKind::HealthCheck => rq.respond_with_string("UP"),

            RequestKind::GetStartTime => match self.service.start_time() {
                Some(secs) => rq.respond_with_int(secs),
                None => {
                    tracing::warn!("no sale start time scheduled");
                    rq.respond_with_string("NOT_SCHEDULED")
                }
            },

            RequestKind::Unlock => {
                let user = require_user!(rq);
                let product = require_product!(rq);
                match self.service.unlock(&user, &product) {
                    Ok(token) => rq.respond_with_token(token.id),
                    Err(err) => respond_with(rq, err),
                }
            }

            RequestKind::Participate => {
                let user = require_user!(rq);
                let product = require_product!(rq);
                let token = rq.token();
                match self.service.participate(&user, &product, token) {
                    Ok(receipt) => rq.respond_with_claimed(receipt.remaining),
                    Err(err) => respond_with(rq, err),
                }
            }

            RequestKind::GetStock => {
                let product = require_product!(rq);
                match self.service.stock(&product) {
                    Ok(remaining) => rq.respond_with_int(remaining),
                    Err(err) => respond_with(rq, err),
                }
            }

            RequestKind::CheckParticipation => {
                let user = require_user!(rq);
                let product = require_product!(rq);
                match self.service.has_participated(&user, &product) {
                    Ok(participated) => rq.respond_with_bool(participated),
                    Err(err) => respond_with(rq, err),
                }
            }

            RequestKind::InitStock => {
                let product = require_product!(rq);
                match rq.read_u64() {
                    Some(quantity) => {
                        self.admin.init_stock(&product, quantity);
                        rq.respond_with_string("stock initialized");
                    }
                    None => rq.respond_with_rejection(&Rejection::InvalidInput(
                        "init-stock requires a quantity".into(),
                    )),
                }
            }

            RequestKind::ResetFlashSale => {
                let product = require_product!(rq);
                // an absent payload closes the sale (stock back to 0)
                let quantity = rq.read_u64();
                match self.admin.reset_flash_sale(&product, quantity) {
                    Ok(()) => rq.respond_with_string("flash sale reset"),
                    Err(err) => respond_with(rq, err),
                }
            }

            RequestKind::SetStartTime => match rq.read_u64() {
                Some(secs) => {
                    self.admin.set_start_time(secs);
                    rq.respond_with_string("start time set");
                }
                None => rq.respond_with_rejection(&Rejection::InvalidInput(
                    "set-start-time requires unix seconds".into(),
                )),
            },

            RequestKind::ParticipantsCount => {
                let product = require_product!(rq);
                match self.admin.participants_count(&product) {
                    Ok(count) => rq.respond_with_int(count),
                    Err(err) => respond_with(rq, err),
                }
            }
        }
    }

    fn shutdown(self) {
        // tell the sweeper to shut down
        let _ = self.sweeper_shutdown.send(());
        let _ = self.sweeper_thread.join();
    }
}
