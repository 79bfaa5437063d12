//! 🏗 HTTP request implementation

use std::io;
use std::io::Read;

use flash_sale_core::RequestKind;
use tiny_http::{Header, Response};
use uuid::Uuid;

struct HTTPRequest(tiny_http::Request);

impl flash_sale_core::RawRequest for HTTPRequest {
    fn url(&self) -> &str {
        self.0.url()
    }

    fn method(&self) -> flash_sale_core::RequestMethod {
        match self.0.method() {
            tiny_http::Method::Get => flash_sale_core::RequestMethod::Get,
            tiny_http::Method::Post => flash_sale_core::RequestMethod::Post,
            _ => unreachable!(),
        }
    }

    fn read_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.0.body_length().unwrap_or(0));
        self.0.as_reader().read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn read_string(&mut self) -> io::Result<String> {
        let mut s = String::with_capacity(self.0.body_length().unwrap_or(0));
        self.0.as_reader().read_to_string(&mut s)?;
        Ok(s)
    }

    fn read_u64(&mut self) -> Option<u64> {
        let mut s = String::with_capacity(self.0.body_length().unwrap_or(24));
        self.0.as_reader().read_to_string(&mut s).ok()?;
        s.trim().parse().ok()
    }

    fn respond_with_error(self: Box<Self>, code: &'static str, message: String) {
        let status = match code {
            "INVALID_INPUT" => 400,
            "UNKNOWN_PRODUCT" => 404,
            "INTERNAL" => 500,
            // business rejections: the request was well-formed but lost
            _ => 409,
        };
        let mut res = Response::from_string(message).with_status_code(status);
        res.add_header(Header::from_bytes(b"X-Error-Code", code.as_bytes()).unwrap());
        self.respond(res)
    }

    fn respond_with_int(self: Box<Self>, int: u64) {
        self.respond(Response::from_string(int.to_string()).with_status_code(200))
    }

    fn respond_with_bool(self: Box<Self>, value: bool) {
        self.respond(Response::from_string(value.to_string()).with_status_code(200))
    }

    fn respond_with_string(self: Box<Self>, s: String) {
        self.respond(Response::from_string(s).with_status_code(200))
    }

    fn respond_with_token(self: Box<Self>, token: Uuid) {
        self.respond(Response::from_string(token.hyphenated().to_string()).with_status_code(200))
    }

    fn respond_with_claimed(self: Box<Self>, remaining: u64) {
        let mut res = Response::from_string(remaining.to_string()).with_status_code(200);
        res.add_header(Header::from_bytes(b"X-Claimed", b"true").unwrap());
        self.respond(res)
    }
}

impl HTTPRequest {
    /// Add CORS headers to `res` and send it
    fn respond<R: Read>(self, mut res: Response<R>) {
        add_response_cors_headers(&mut res);
        self.0.respond(res).expect("HTTP response failed");
    }
}

/// Strip `prefix` from `url` and return the non-empty remainder
fn path_param<'a>(url: &'a str, prefix: &str) -> Option<&'a str> {
    url.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

/// Parse the given HTTP request
///
/// If [`None`] is returned, the request was already answered with a
/// corresponding error message.
pub fn parse(rq: tiny_http::Request) -> Option<flash_sale_core::Request> {
    use tiny_http::Method::*;

    let mut product = None;
    let kind = match (rq.method(), rq.url()) {
        (Options, _) => {
            let mut res = Response::empty(204);
            add_response_cors_headers(&mut res);
            rq.respond(res).expect("HTTP response failed");
            return None;
        }
        (Get, "/api/flash-sale/start-time") => RequestKind::GetStartTime,
        (Get, "/api/test/health") => RequestKind::HealthCheck,
        (Post, "/api/admin/flash-sale/start-time") => RequestKind::SetStartTime,
        (method, url) => {
            let parsed = match method {
                Post => path_param(url, "/api/flash-sale/unlock/")
                    .map(|p| (RequestKind::Unlock, p))
                    .or_else(|| {
                        path_param(url, "/api/flash-sale/participate/")
                            .map(|p| (RequestKind::Participate, p))
                    })
                    .or_else(|| {
                        path_param(url, "/api/admin/flash-sale/init-stock/")
                            .map(|p| (RequestKind::InitStock, p))
                    })
                    .or_else(|| {
                        path_param(url, "/api/admin/flash-sale/reset/")
                            .map(|p| (RequestKind::ResetFlashSale, p))
                    }),
                Get => path_param(url, "/api/flash-sale/stock/")
                    .map(|p| (RequestKind::GetStock, p))
                    .or_else(|| {
                        path_param(url, "/api/flash-sale/check/")
                            .map(|p| (RequestKind::CheckParticipation, p))
                    })
                    .or_else(|| {
                        path_param(url, "/api/admin/flash-sale/participants-count/")
                            .map(|p| (RequestKind::ParticipantsCount, p))
                    }),
                _ => {
                    let mut res = Response::empty(405);
                    add_response_cors_headers(&mut res);
                    rq.respond(res).expect("HTTP response failed");
                    return None;
                }
            };
            match parsed {
                Some((kind, p)) => {
                    product = Some(p.to_owned());
                    kind
                }
                None => {
                    let mut res = Response::from_string(
                        "🦀 could not find the service you are looking for!

Valid requests are:
  GET  /api/flash-sale/start-time
  POST /api/flash-sale/unlock/{productId}
  POST /api/flash-sale/participate/{productId}
  GET  /api/flash-sale/stock/{productId}
  GET  /api/flash-sale/check/{productId}
  POST /api/admin/flash-sale/init-stock/{productId}
  POST /api/admin/flash-sale/reset/{productId}
  POST /api/admin/flash-sale/start-time
  GET  /api/admin/flash-sale/participants-count/{productId}
  GET  /api/test/health",
                    )
                    .with_status_code(404);
                    add_response_cors_headers(&mut res);
                    rq.respond(res).expect("HTTP response failed");
                    return None;
                }
            }
        }
    };

    let mut user = None;
    let mut token = None;
    for hdr in rq.headers() {
        if hdr.field.equiv("x-user-id") {
            let value = hdr.value.as_str();
            if !value.is_empty() {
                user = Some(value.to_owned());
            }
        } else if hdr.field.equiv("x-eligibility-token") {
            if let Ok(id) = Uuid::parse_str(hdr.value.as_str()) {
                token = Some(id);
            }
        }
    }

    Some(flash_sale_core::Request::from_raw(
        kind,
        user,
        product,
        token,
        Box::new(HTTPRequest(rq)),
    ))
}

/// Add CORS headers to `res`
fn add_response_cors_headers<R: Read>(res: &mut Response<R>) {
    res.add_header(Header::from_bytes(b"Access-Control-Request-Method", b"*").unwrap());
    res.add_header(Header::from_bytes(b"Access-Control-Allow-Origin", b"*").unwrap());
    res.add_header(Header::from_bytes(b"Access-Control-Allow-Headers", b"*").unwrap());
    res.add_header(Header::from_bytes(b"Access-Control-Expose-Headers", b"*").unwrap());
}
