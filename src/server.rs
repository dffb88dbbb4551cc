//! Metrics registry state, HTTP router, and the fault-isolating scrape
//! handler.
//!
//! The scrape handler is the single recovery boundary for a collection
//! cycle: a typed error or a panic anywhere in the collection-to-encoding
//! path turns into a 500 response with a JSON `{error, stack}` body, and the
//! process keeps serving. Collectors themselves never swallow faults.

use std::any::Any;
use std::backtrace::Backtrace;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;

use crate::collector::Collector;
use crate::error::Result;

/// Registry plus registered collectors, fixed at startup and shared
/// read-only across scrapes.
pub struct AppState {
    registry: Registry,
    collectors: Vec<Box<dyn Collector>>,
}

impl AppState {
    /// Create the registry with the process self-metrics attached.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;
        Ok(Self {
            registry,
            collectors: Vec::new(),
        })
    }

    /// Register a collector. Runs one real collection to describe it
    /// (describe-by-collect); a failure here is tolerated because the
    /// daemon may come up after the exporter.
    pub fn register(&mut self, collector: Box<dyn Collector>) {
        match collector.describe() {
            Ok(families) => {
                tracing::debug!(families = families.len(), "registered collector");
            }
            Err(error) => {
                tracing::warn!(%error, "collector description failed at registration");
            }
        }
        self.collectors.push(collector);
    }
}

pub fn router(metrics_path: &str, state: Arc<AppState>) -> Router {
    let index_body = format!(
        "<html><head><title>Ganesha Exporter</title></head>\
         <body><h1>Ganesha Exporter</h1>\
         <p><a href=\"{metrics_path}\">Metrics</a></p></body></html>"
    );
    Router::new()
        .route(
            "/",
            get(move || {
                let body = index_body.clone();
                async move { Html(body) }
            }),
        )
        .route("/healthz", get(healthz))
        .route(metrics_path, get(metrics))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Diagnostic body for a failed scrape.
#[derive(Serialize)]
struct ScrapeFault {
    error: String,
    stack: String,
}

/// One scrape. The D-Bus calls underneath are synchronous, so the whole
/// rendering step runs on the blocking pool; a hung daemon stalls this
/// scrape only.
pub(crate) async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let rendering = tokio::task::spawn_blocking(move || render_scrape(&state)).await;
    match rendering {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Ok(Err(error)) => {
            tracing::error!(%error, "scrape failed");
            fault_response(error.to_string())
        }
        Err(join_error) => {
            let message = match join_error.try_into_panic() {
                Ok(panic) => panic_message(panic),
                Err(_) => "unknown panic reason".to_string(),
            };
            tracing::error!(error = %message, "scrape panicked");
            fault_response(message)
        }
    }
}

/// Gather the registry's own families, then every collector's, in
/// registration order, and encode the lot. Any collector fault aborts the
/// whole scrape; no partial exposition is produced.
fn render_scrape(state: &AppState) -> Result<String> {
    let mut families = state.registry.gather();
    for collector in &state.collectors {
        families.extend(collector.collect()?);
    }
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn fault_response(message: String) -> Response {
    let fault = ScrapeFault {
        error: message,
        stack: Backtrace::force_capture().to_string(),
    };
    match serde_json::to_string(&fault) {
        Ok(body) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        // Abandon the body rather than raise a second fault.
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic reason".to_string()
    }
}
