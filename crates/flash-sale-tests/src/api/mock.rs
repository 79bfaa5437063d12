//! Mock API implementation directly using the `flash-sale-engine` crate

use std::sync::Arc;

use flash_sale_core::{RawRequest, Request, RequestHandler, RequestKind};
use tokio::task::{self, JoinHandle};
use uuid::Uuid;

use super::{Api, RequestMsg, Response};

pub struct MockEngine {
    engine: Arc<flash_sale_engine::Engine>,
    join_handles: Vec<JoinHandle<()>>,
}

struct MockRawRequest {
    payload: Option<u64>,
    kind: RequestKind,
    response_channel: tokio::sync::oneshot::Sender<Response>,
}

pub async fn start(threads: u16, config: flash_sale_core::Config) -> (MockEngine, Api) {
    let engine = Arc::new(
        tokio::task::spawn_blocking(move || flash_sale_engine::launch(&config))
            .await
            .unwrap(),
    );

    // flume is MPMC: every handler thread consumes the same channel
    let (sender, receiver) = flume::bounded::<RequestMsg>(65536);
    let join_handles = (0..threads)
        .map(|_| {
            let engine = engine.clone();
            let receiver = receiver.clone();
            task::spawn_blocking(move || {
                let engine = &*engine;
                for msg in receiver.into_iter() {
                    let raw = Box::new(MockRawRequest {
                        payload: msg.payload,
                        kind: msg.kind,
                        response_channel: msg.response_channel,
                    });
                    engine.handle(Request::from_raw(
                        msg.kind,
                        msg.user,
                        msg.product,
                        msg.token,
                        raw,
                    ))
                }
            })
        })
        .collect();
    drop(receiver);

    let mock_engine = MockEngine {
        engine,
        join_handles,
    };
    (mock_engine, Api::new(sender))
}

impl MockEngine {
    pub async fn shutdown(self) {
        for handle in self.join_handles {
            handle.await.unwrap()
        }
        task::spawn_blocking(move || Arc::into_inner(self.engine).unwrap().shutdown())
            .await
            .unwrap();
    }
}

impl RawRequest for MockRawRequest {
    fn url(&self) -> &str {
        use RequestKind::*;
        match self.kind {
            GetStartTime => "/api/flash-sale/start-time",
            Unlock => "/api/flash-sale/unlock/",
            Participate => "/api/flash-sale/participate/",
            GetStock => "/api/flash-sale/stock/",
            CheckParticipation => "/api/flash-sale/check/",
            InitStock => "/api/admin/flash-sale/init-stock/",
            ResetFlashSale => "/api/admin/flash-sale/reset/",
            SetStartTime => "/api/admin/flash-sale/start-time",
            ParticipantsCount => "/api/admin/flash-sale/participants-count/",
            HealthCheck => "/api/test/health",
        }
    }

    fn method(&self) -> flash_sale_core::RequestMethod {
        use flash_sale_core::RequestMethod::*;
        use RequestKind::*;
        match self.kind {
            GetStartTime | GetStock | CheckParticipation | ParticipantsCount | HealthCheck => Get,
            _ => Post,
        }
    }

    fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> {
        Ok(match self.payload.take() {
            None => Vec::new(),
            Some(i) => i.to_string().into_bytes(),
        })
    }
    fn read_string(&mut self) -> std::io::Result<String> {
        Ok(match self.payload.take() {
            None => String::new(),
            Some(i) => i.to_string(),
        })
    }
    fn read_u64(&mut self) -> Option<u64> {
        self.payload.take()
    }

    fn respond_with_error(self: Box<Self>, code: &'static str, message: String) {
        self.response_channel
            .send(Response::Error { code, message })
            .unwrap()
    }

    fn respond_with_int(self: Box<Self>, int: u64) {
        self.response_channel.send(Response::Int(int)).unwrap()
    }

    fn respond_with_bool(self: Box<Self>, value: bool) {
        self.response_channel.send(Response::Bool(value)).unwrap()
    }

    fn respond_with_string(self: Box<Self>, s: String) {
        self.response_channel.send(Response::Str(s)).unwrap()
    }

    fn respond_with_token(self: Box<Self>, token: Uuid) {
        self.response_channel.send(Response::Token(token)).unwrap()
    }

    fn respond_with_claimed(self: Box<Self>, remaining: u64) {
        self.response_channel
            .send(Response::Claimed { remaining })
            .unwrap()
    }
}
