//! Unreliable upstream for exercising upstream-guard.
//!
//! `GET /data` answers a small JSON document. With probability `FAILURE_RATE`
//! it answers 500 instead; with probability `SLOW_RATE` it first sleeps
//! `SLOW_MS` milliseconds. Listens on `UPSTREAM_BIND` (default 127.0.0.1:4000).

use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use rand::Rng;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy)]
struct Behaviour {
    failure_rate: f64,
    slow_rate: f64,
    slow: Duration,
}

impl Behaviour {
    fn from_env() -> Result<Self, String> {
        Ok(Self {
            failure_rate: rate("FAILURE_RATE", 0.2)?,
            slow_rate: rate("SLOW_RATE", 0.1)?,
            slow: Duration::from_millis(env_or("SLOW_MS", 4000)?),
        })
    }
}

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> Result<T, String> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("invalid value for {var}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn rate(var: &str, default: f64) -> Result<f64, String> {
    let value = env_or(var, default)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{var} must be within 0.0..=1.0, got {value}"))
    }
}

async fn data(State(behaviour): State<Behaviour>) -> (StatusCode, Json<Value>) {
    let (slow, fail) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_bool(behaviour.slow_rate),
            rng.gen_bool(behaviour.failure_rate),
        )
    };

    if slow {
        tracing::info!(delay_ms = behaviour.slow.as_millis() as u64, "Stalling response");
        tokio::time::sleep(behaviour.slow).await;
    }

    if fail {
        tracing::info!("Injecting failure");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "injected failure"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": uuid::Uuid::new_v4(),
            "message": "upstream says hello",
        })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flaky_upstream=info".into()),
        )
        .init();

    let behaviour = Behaviour::from_env()?;
    let addr: SocketAddr = env_or("UPSTREAM_BIND", SocketAddr::from(([127, 0, 0, 1], 4000)))?;

    let app = Router::new()
        .route("/data", get(data))
        .route("/health", get(|| async { StatusCode::OK }))
        .with_state(behaviour);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        failure_rate = behaviour.failure_rate,
        slow_rate = behaviour.slow_rate,
        slow_ms = behaviour.slow.as_millis() as u64,
        "Flaky upstream listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
