use eyre::Result;
use flume::Sender;
use nanorand::Rng;
use thiserror::Error;
use flash_sale_core::RequestKind;
use tokio::sync::oneshot;
use uuid::Uuid;

pub mod mock;

/// An error response carrying its stable code
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum Response {
    Error { code: &'static str, message: String },
    Int(u64),
    Bool(bool),
    Str(String),
    Token(Uuid),
    Claimed { remaining: u64 },
}

impl Response {
    fn into_api_result_u64(self, rq_kind: RequestKind) -> ApiResult<u64> {
        match self {
            Response::Error { code, message } => Err(ApiError {
                code: code.into(),
                message,
            }),
            Response::Int(i) => Ok(i),
            resp => panic!("{rq_kind:?} must not be answered by {resp:?}"),
        }
    }

    fn into_api_result_string(self, rq_kind: RequestKind) -> ApiResult<String> {
        match self {
            Response::Error { code, message } => Err(ApiError {
                code: code.into(),
                message,
            }),
            Response::Str(s) => Ok(s),
            resp => panic!("{rq_kind:?} must not be answered by {resp:?}"),
        }
    }
}

struct RequestMsg {
    kind: RequestKind,
    user: Option<String>,
    product: Option<String>,
    token: Option<Uuid>,
    payload: Option<u64>,
    response_channel: oneshot::Sender<Response>,
}

/// Client-side handle on the flash-sale system
///
/// All requests go through one flume channel consumed by every handler
/// thread, so concurrent requests really are handled in parallel.
#[derive(Clone)]
pub struct Api {
    channel: Sender<RequestMsg>,
}

impl Api {
    fn new(channel: Sender<RequestMsg>) -> Self {
        Self { channel }
    }
}

/// Scheduled sale start, as reported by the system
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StartTime {
    Scheduled(u64),
    NotScheduled,
}

/// Outcome of a participation attempt
///
/// Business-rule rejections are expected outcomes of contention, so they
/// are modeled as values rather than errors; only malformed requests and
/// faults surface as [`ApiError`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClaimOutcome {
    Claimed { remaining: u64 },
    NotStarted,
    NotEligible,
    AlreadyParticipated,
    SoldOut,
}

impl Api {
    async fn make_request(
        &self,
        kind: RequestKind,
        user: Option<&str>,
        product: Option<&str>,
        token: Option<Uuid>,
        payload: Option<u64>,
    ) -> Result<Response> {
        let (sender, receiver) = oneshot::channel();
        let msg = RequestMsg {
            kind,
            user: user.map(str::to_owned),
            product: product.map(str::to_owned),
            token,
            payload,
            response_channel: sender,
        };
        self.channel.send_async(msg).await?;
        Ok(receiver.await?)
    }

    pub async fn get_start_time(&self) -> Result<ApiResult<StartTime>> {
        let kind = RequestKind::GetStartTime;
        Ok(match self.make_request(kind, None, None, None, None).await? {
            Response::Error { code, message } => Err(ApiError {
                code: code.into(),
                message,
            }),
            Response::Int(secs) => Ok(StartTime::Scheduled(secs)),
            Response::Str(s) if s == "NOT_SCHEDULED" => Ok(StartTime::NotScheduled),
            resp => panic!("{kind:?} must not be answered by {resp:?}"),
        })
    }

    pub async fn unlock(&self, user: &str, product: &str) -> Result<ApiResult<Uuid>> {
        let kind = RequestKind::Unlock;
        Ok(
            match self
                .make_request(kind, Some(user), Some(product), None, None)
                .await?
            {
                Response::Error { code, message } => Err(ApiError {
                    code: code.into(),
                    message,
                }),
                Response::Token(token) => Ok(token),
                resp => panic!("{kind:?} must not be answered by {resp:?}"),
            },
        )
    }

    pub async fn participate(
        &self,
        user: &str,
        product: &str,
        token: Option<Uuid>,
    ) -> Result<ApiResult<ClaimOutcome>> {
        let kind = RequestKind::Participate;
        Ok(
            match self
                .make_request(kind, Some(user), Some(product), token, None)
                .await?
            {
                Response::Claimed { remaining } => Ok(ClaimOutcome::Claimed { remaining }),
                Response::Error { code, message } => match code {
                    "NOT_STARTED" => Ok(ClaimOutcome::NotStarted),
                    "NOT_ELIGIBLE" => Ok(ClaimOutcome::NotEligible),
                    "ALREADY_PARTICIPATED" => Ok(ClaimOutcome::AlreadyParticipated),
                    "SOLD_OUT" => Ok(ClaimOutcome::SoldOut),
                    _ => Err(ApiError {
                        code: code.into(),
                        message,
                    }),
                },
                resp => panic!("{kind:?} must not be answered by {resp:?}"),
            },
        )
    }

    pub async fn get_stock(&self, product: &str) -> Result<ApiResult<u64>> {
        let kind = RequestKind::GetStock;
        let response = self.make_request(kind, None, Some(product), None, None);
        Ok(response.await?.into_api_result_u64(kind))
    }

    pub async fn check_participation(&self, user: &str, product: &str) -> Result<ApiResult<bool>> {
        let kind = RequestKind::CheckParticipation;
        Ok(
            match self
                .make_request(kind, Some(user), Some(product), None, None)
                .await?
            {
                Response::Error { code, message } => Err(ApiError {
                    code: code.into(),
                    message,
                }),
                Response::Bool(participated) => Ok(participated),
                resp => panic!("{kind:?} must not be answered by {resp:?}"),
            },
        )
    }

    pub async fn init_stock(&self, product: &str, quantity: u64) -> Result<ApiResult<String>> {
        let kind = RequestKind::InitStock;
        let response = self.make_request(kind, None, Some(product), None, Some(quantity));
        Ok(response.await?.into_api_result_string(kind))
    }

    /// Init-stock request with a missing quantity payload
    pub async fn init_stock_without_quantity(&self, product: &str) -> Result<ApiResult<String>> {
        let kind = RequestKind::InitStock;
        let response = self.make_request(kind, None, Some(product), None, None);
        Ok(response.await?.into_api_result_string(kind))
    }

    pub async fn reset_flash_sale(
        &self,
        product: &str,
        quantity: Option<u64>,
    ) -> Result<ApiResult<String>> {
        let kind = RequestKind::ResetFlashSale;
        let response = self.make_request(kind, None, Some(product), None, quantity);
        Ok(response.await?.into_api_result_string(kind))
    }

    pub async fn set_start_time(&self, unix_secs: u64) -> Result<ApiResult<String>> {
        let kind = RequestKind::SetStartTime;
        let response = self.make_request(kind, None, None, None, Some(unix_secs));
        Ok(response.await?.into_api_result_string(kind))
    }

    pub async fn participants_count(&self, product: &str) -> Result<ApiResult<u64>> {
        let kind = RequestKind::ParticipantsCount;
        let response = self.make_request(kind, None, Some(product), None, None);
        Ok(response.await?.into_api_result_u64(kind))
    }

    pub async fn health_check(&self) -> Result<ApiResult<String>> {
        let kind = RequestKind::HealthCheck;
        let response = self.make_request(kind, None, None, None, None);
        Ok(response.await?.into_api_result_string(kind))
    }

    /// Create a session for a fresh, randomly named user
    pub fn create_user_session(&self) -> UserSession {
        let mut bytes = [0u8; 8];
        nanorand::tls_rng().fill(&mut bytes);
        UserSession {
            api: self,
            user_id: format!("user-{:016x}", u64::from_be_bytes(bytes)),
            token: None,
        }
    }
}

/// One user interacting with the sale
///
/// The session remembers the most recently issued eligibility token, the
/// way a browser would carry it from `unlock` to `participate`.
pub struct UserSession<'a> {
    pub api: &'a Api,
    pub user_id: String,
    pub token: Option<Uuid>,
}

impl<'a> UserSession<'a> {
    pub async fn unlock(&mut self, product: &str) -> Result<ApiResult<Uuid>> {
        let result = self.api.unlock(&self.user_id, product).await?;
        if let Ok(token) = &result {
            self.token = Some(*token);
        }
        Ok(result)
    }

    /// Participate using the token issued by the last [`Self::unlock`]
    pub async fn participate(&self, product: &str) -> Result<ApiResult<ClaimOutcome>> {
        self.api
            .participate(&self.user_id, product, self.token)
            .await
    }

    /// Participate with an explicit token (or none at all)
    pub async fn participate_with(
        &self,
        product: &str,
        token: Option<Uuid>,
    ) -> Result<ApiResult<ClaimOutcome>> {
        self.api.participate(&self.user_id, product, token).await
    }

    /// Unlock and immediately participate
    pub async fn claim(&mut self, product: &str) -> Result<ApiResult<ClaimOutcome>> {
        match self.unlock(product).await? {
            Ok(_) => self.participate(product).await,
            Err(err) if err.code == "DENIED" => Ok(Ok(ClaimOutcome::NotEligible)),
            Err(err) => Ok(Err(err)),
        }
    }

    pub async fn check_participation(&self, product: &str) -> Result<ApiResult<bool>> {
        self.api.check_participation(&self.user_id, product).await
    }
}
