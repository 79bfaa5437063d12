//! Server implementation

#![warn(missing_docs)]

mod http;

use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use flash_sale_core::{Config, RequestHandler};

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the flash-sale system
    config: Config,

    /// Port for the HTTP server to listen on
    port: u16,
    /// Host for the HTTP server to listen on
    host: String,
    /// Number of HTTP handler threads
    handler_threads: u32,
}

impl Opts {
    fn from_args() -> Self {
        let mut opts = Opts {
            port: 8090,
            host: String::from("127.0.0.1"),
            config: Config::default(),
            handler_threads: 64,
        };

        let mut option: Option<String> = None;
        for arg in std::env::args().skip(1) {
            if let Some(opt) = option {
                match opt.as_str() {
                    "-port" => opts.port = arg.parse().expect("-port takes a decimal u16"),
                    "-host" => opts.host = arg,
                    "-handler-threads" => {
                        opts.handler_threads =
                            arg.parse().expect("-handler-threads takes a decimal u32")
                    }
                    "-start-time" => {
                        opts.config.start_time =
                            Some(arg.parse().expect("-start-time takes unix seconds"))
                    }
                    "-start-in" => {
                        let secs: u64 = arg.parse().expect("-start-in takes a decimal u64");
                        let now = SystemTime::now()
                            .duration_since(UNIX_EPOCH)
                            .expect("system clock before unix epoch")
                            .as_secs();
                        opts.config.start_time = Some(now + secs);
                    }
                    "-token-ttl" => {
                        opts.config.token_ttl =
                            arg.parse().expect("-token-ttl takes a decimal u32")
                    }
                    "-sweep-interval" => {
                        opts.config.sweep_interval =
                            arg.parse().expect("-sweep-interval takes a decimal u32")
                    }
                    "-unlock-burst" => {
                        opts.config.unlock_burst =
                            arg.parse().expect("-unlock-burst takes a decimal u32")
                    }
                    "-unlock-refill" => {
                        opts.config.unlock_refill =
                            arg.parse().expect("-unlock-refill takes a decimal u32")
                    }
                    _ => {
                        eprintln!("Error: ignoring unknown option {opt}");
                        std::process::exit(1);
                    }
                }
                option = None;
            } else {
                option = Some(arg);
            }
        }
        if let Some(opt) = option {
            eprintln!("Error: ignoring leftover option {opt}");
            std::process::exit(1);
        }

        opts
    }
}

fn http_loop<H: RequestHandler>(server: &tiny_http::Server, handler: &H) {
    loop {
        let rq = server.recv().expect("HTTP receive failed");
        if let Some(rq) = http::parse(rq) {
            handler.handle(rq);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let opts = Opts::from_args();

    let server = tiny_http::Server::http((opts.host.as_str(), opts.port)).unwrap();
    tracing::info!(host = %opts.host, port = opts.port, "flash-sale server listening");

    let engine = flash_sale_engine::launch(&opts.config);

    thread::scope(|s| {
        for i in 0..opts.handler_threads {
            thread::Builder::new()
                .name(format!("handler_{i}"))
                .spawn_scoped(s, || http_loop(&server, &engine))
                .unwrap();
        }
    });
}
