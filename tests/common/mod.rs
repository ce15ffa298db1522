//! Shared utilities for integration and load testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use upstream_guard::config::{AppConfig, BreakerConfig, RetryConfig, UpstreamConfig};
use upstream_guard::http::{HttpServer, ServerError};
use upstream_guard::lifecycle::Shutdown;

/// Start a mock backend that always returns `200` with `body`.
#[allow(dead_code)]
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, body.to_string()) }).await
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` is invoked once per request and decides status and body.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let (status, body) = f().await;
                        let reason = match status {
                            200 => "OK",
                            404 => "Not Found",
                            500 => "Internal Server Error",
                            502 => "Bad Gateway",
                            503 => "Service Unavailable",
                            _ => "Unknown",
                        };

                        let response = format!(
                            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                            body.len(),
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Config pointing at `backend`, with delays short enough for tests.
#[allow(dead_code)]
pub fn config_for(backend: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream = UpstreamConfig {
        host: backend.ip().to_string(),
        port: backend.port(),
        path: "/data".into(),
        timeout_ms: 1000,
    };
    config.breaker = BreakerConfig {
        timeout_ms: 1000,
        error_threshold_percent: 50,
        reset_timeout_ms: 300,
        minimum_calls: 3,
        window_size: 10,
    };
    config.retry = RetryConfig {
        max_attempts: 5,
        base_delay_ms: 20,
        jitter_ms: 5,
    };
    config
}

/// A running upstream-guard instance.
#[allow(dead_code)]
pub struct Guard {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

#[allow(dead_code)]
impl Guard {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the real server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_guard(config: AppConfig) -> Guard {
    let server = HttpServer::new(config).unwrap();
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, rx).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    Guard {
        addr,
        shutdown,
        handle,
    }
}

/// Non-pooled client that ignores proxy settings.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
