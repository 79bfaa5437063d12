//! Error taxonomy of the flash-sale system
//!
//! Rejections are expected outcomes of contention and business rules. They
//! carry a stable machine-readable code so clients can branch on semantics
//! ("sold out" vs "already entered" vs "not open yet"). Faults are
//! unexpected internal failures and are the only errors worth logging.

use thiserror::Error;

/// A user-facing rejection of a request
///
/// These are terminal: retrying the same request yields the same outcome
/// (except under changed contention, e.g. a restock).
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Rejection {
    /// The sale has not started yet (or no start time is scheduled)
    #[error("the flash sale has not started yet")]
    NotStarted,
    /// The caller holds no valid eligibility token
    #[error("not eligible: a valid eligibility token is required")]
    NotEligible,
    /// The caller already owns a successful claim for this product
    #[error("this user has already participated in this sale")]
    AlreadyParticipated,
    /// No stock remains
    #[error("the product is sold out")]
    SoldOut,
    /// The product was never initialized
    #[error("unknown product")]
    UnknownProduct,
    /// The admission gate denied an unlock attempt
    #[error("unlock denied, try again later")]
    Denied,
    /// The request was malformed (missing id, unparseable payload, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Rejection {
    /// Stable error code for this rejection
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::NotStarted => "NOT_STARTED",
            Rejection::NotEligible => "NOT_ELIGIBLE",
            Rejection::AlreadyParticipated => "ALREADY_PARTICIPATED",
            Rejection::SoldOut => "SOLD_OUT",
            Rejection::UnknownProduct => "UNKNOWN_PRODUCT",
            Rejection::Denied => "DENIED",
            Rejection::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

/// Any error produced by the flash-sale engine
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum FlashSaleError {
    /// An expected business-rule rejection, never logged as a fault
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// An internal invariant violation; transient from the caller's view,
    /// since the claim workflow commits nothing before its final step
    #[error("internal fault: {0}")]
    Fault(String),
}

impl FlashSaleError {
    /// Stable error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            FlashSaleError::Rejected(rejection) => rejection.code(),
            FlashSaleError::Fault(_) => "INTERNAL",
        }
    }
}
