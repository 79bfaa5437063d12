use std::io;

use uuid::Uuid;

use crate::Rejection;

/// Kind of the request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum RequestKind {
    /// Retrieve the scheduled sale start instant
    GetStartTime,

    /// Request admission into the claim path
    ///
    /// On success the response carries a single-use eligibility token.
    Unlock,

    /// Attempt to claim one unit of stock
    ///
    /// Requires a valid eligibility token previously issued by
    /// [`RequestKind::Unlock`].
    Participate,

    /// Retrieve the remaining stock of a product
    GetStock,

    /// Check whether a user already owns a successful claim
    CheckParticipation,

    /// Initialize (or re-initialize) the stock of a product
    ///
    /// Privileged; not exposed to ordinary users.
    InitStock,

    /// Reset a product's sale state: stock and participation records
    ///
    /// Privileged; not exposed to ordinary users.
    ResetFlashSale,

    /// Set or override the sale start instant
    ///
    /// Privileged; not exposed to ordinary users.
    SetStartTime,

    /// Retrieve the number of participants of a product
    ///
    /// Privileged; not exposed to ordinary users.
    ParticipantsCount,

    /// Liveness probe
    HealthCheck,
}

/// Request sent by a sale client
pub struct Request {
    kind: RequestKind,
    user: Option<String>,
    product: Option<String>,
    token: Option<Uuid>,
    raw: Box<dyn RawRequest + Send>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("user", &self.user)
            .field("product", &self.product)
            .field("token", &self.token)
            .field("raw", &format_args!(".."))
            .finish()
    }
}

/// HTTP request method
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum RequestMethod {
    /// GET request
    Get,
    /// POST request, may have a payload
    Post,
}

/// Interface for handling client requests
///
/// The engine implements this trait; the HTTP server and the test harness
/// only ever see it.
pub trait RequestHandler {
    /// Handle a single client request
    ///
    /// This method may be called concurrently from different threads.
    fn handle(&self, request: Request);

    /// Shut the flash-sale system down
    ///
    /// This method waits for all threads spawned for the flash-sale system
    /// (e.g., the token sweeper) to have terminated.
    fn shutdown(self);
}

/// A raw request, implemented by the transport (HTTP server or test mock)
pub trait RawRequest {
    /// Get the URL
    fn url(&self) -> &str;
    /// Get the request method
    fn method(&self) -> RequestMethod;

    /// Read the request body as bytes
    fn read_bytes(&mut self) -> io::Result<Vec<u8>>;
    /// Read the request body as string
    fn read_string(&mut self) -> io::Result<String>;
    /// Parse the request body as [`u64`] integer
    fn read_u64(&mut self) -> Option<u64>;

    /// Respond with a stable error code and a human-readable message
    fn respond_with_error(self: Box<Self>, code: &'static str, message: String);
    /// Respond with an integer
    fn respond_with_int(self: Box<Self>, int: u64);
    /// Respond with a boolean
    fn respond_with_bool(self: Box<Self>, value: bool);
    /// Respond with a string
    fn respond_with_string(self: Box<Self>, s: String);
    /// Respond with a freshly issued eligibility token
    fn respond_with_token(self: Box<Self>, token: Uuid);
    /// Respond with a claim confirmation carrying the remaining stock
    fn respond_with_claimed(self: Box<Self>, remaining: u64);
}

impl Request {
    /// Get the request's kind
    #[inline]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Get the user id, if the client sent one
    #[inline]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Get the product id, if the request carries one
    #[inline]
    pub fn product_id(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Get the eligibility token, if the client sent one
    #[inline]
    pub fn token(&self) -> Option<Uuid> {
        self.token
    }

    /// Get the request URL
    #[inline]
    #[allow(unused)]
    pub fn url(&self) -> &str {
        self.raw.url()
    }

    /// Get the request method
    #[inline]
    #[allow(unused)]
    pub fn method(&self) -> RequestMethod {
        self.raw.method()
    }

    /// Read an integer from the request body (e.g., a stock quantity or a
    /// unix timestamp)
    ///
    /// Returns [`None`] if the body is missing, unparseable, or a
    /// communication error happened. Consumes the body; call at most once
    /// per request.
    #[inline]
    pub fn read_u64(&mut self) -> Option<u64> {
        self.raw.read_u64()
    }

    /// Read the request body as bytes
    ///
    /// Returns [`Err`] in case of a communication error. Like
    /// [`Self::read_u64()`], this consumes the body.
    #[inline]
    #[allow(unused)]
    pub fn read_bytes(&mut self) -> io::Result<Vec<u8>> {
        self.raw.read_bytes()
    }

    /// Read the request body as a UTF-8 string
    ///
    /// Returns [`Err`] if the body is invalid UTF-8 or in case of a
    /// communication error. Like [`Self::read_u64()`], this consumes the
    /// body.
    #[inline]
    pub fn read_string(&mut self) -> io::Result<String> {
        self.raw.read_string()
    }

    /// Respond with a business-rule rejection
    ///
    /// The stable code of the rejection is preserved so the client can
    /// branch on semantics. This method blocks until the response has been
    /// sent.
    #[inline]
    pub fn respond_with_rejection(self, rejection: &Rejection) {
        self.raw
            .respond_with_error(rejection.code(), rejection.to_string());
    }

    /// Respond with an internal fault
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_fault(self, message: impl Into<String>) {
        self.raw.respond_with_error("INTERNAL", message.into());
    }

    /// Respond with an integer, e.g., a remaining stock count.
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_int(self, int: u64) {
        self.raw.respond_with_int(int);
    }

    /// Respond with a boolean, e.g., a participation check result.
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_bool(self, value: bool) {
        self.raw.respond_with_bool(value);
    }

    /// Respond with an arbitrary string
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_string(self, s: impl Into<String>) {
        self.raw.respond_with_string(s.into());
    }

    /// Respond with a freshly issued eligibility token
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_token(self, token: Uuid) {
        self.raw.respond_with_token(token);
    }

    /// Respond with a claim confirmation carrying the remaining stock
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_claimed(self, remaining: u64) {
        self.raw.respond_with_claimed(remaining);
    }

    /// Create a new request from a [`RawRequest`]
    ///
    /// Used by the transports (the HTTP server and the test mock); the
    /// engine never constructs requests itself.
    #[inline]
    pub fn from_raw(
        kind: RequestKind,
        user: Option<String>,
        product: Option<String>,
        token: Option<Uuid>,
        raw: Box<dyn RawRequest + Send>,
    ) -> Self {
        Self {
            kind,
            user,
            product,
            token,
            raw,
        }
    }
}
