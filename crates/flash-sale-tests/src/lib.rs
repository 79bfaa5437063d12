use std::time::{SystemTime, UNIX_EPOCH};

use eyre::Result;
use flash_sale_core::Config;

mod api;
pub use api::{Api, ApiError, ApiResult, ClaimOutcome, StartTime, UserSession};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

pub struct TestCtxBuilder {
    /// Count of handler threads driving the engine
    pub handler_threads: u16,
    /// Engine configuration
    pub config: Config,
}

impl TestCtxBuilder {
    /// Create a new test context builder with the sale already open
    pub fn new() -> Self {
        TestCtxBuilder {
            handler_threads: 4,
            config: Config {
                // one minute in the past, i.e. participation is open
                start_time: Some(unix_now().saturating_sub(60)),
                ..Config::default()
            },
        }
    }

    /// Leave the sale unscheduled (every claim is rejected as not started)
    pub fn not_scheduled(mut self) -> Self {
        self.config.start_time = None;
        self
    }

    /// Schedule the sale `secs` seconds in the future
    pub fn with_start_in(mut self, secs: u64) -> Self {
        self.config.start_time = Some(unix_now() + secs);
        self
    }

    /// Set the eligibility token TTL (in seconds)
    pub fn with_token_ttl(mut self, secs: u32) -> Self {
        self.config.token_ttl = secs;
        self
    }

    /// Set the token sweep interval (in seconds)
    pub fn with_sweep_interval(mut self, secs: u32) -> Self {
        self.config.sweep_interval = secs;
        self
    }

    /// Gate unlocks at `burst` admissions per user per `refill` seconds
    pub fn with_unlock_rate(mut self, burst: u32, refill: u32) -> Self {
        self.config.unlock_burst = burst;
        self.config.unlock_refill = refill;
        self
    }

    /// Set the number of handler threads to use
    pub fn with_handler_threads(mut self, threads: u16) -> Self {
        assert_ne!(threads, 0);
        self.handler_threads = threads;
        self
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let (engine, api) = api::mock::start(self.handler_threads, self.config).await;
        Ok(TestCtx {
            api,
            engine,
            drop_bomb: DropBomb,
        })
    }
}

impl Default for TestCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the flash-sale system
    pub api: Api,
    engine: api::mock::MockEngine,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// Shut down the flash-sale system and finish the test
    pub async fn finish(self) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        self.engine.shutdown().await;
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!(
            "@TestAuthor: You should call `ctx.finish().await` to shut the flash-sale system down"
        );
    }
}
