//! Request metrics middleware.
//!
//! Records request count and duration using the `metrics` crate (rendered
//! by the Prometheus exporter at `/metrics`).
//!
//! # Metrics Emitted
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `http_requests_total` | Counter | `method`, `path`, `status` | Total request count |
//! | `http_request_duration_seconds` | Histogram | `method`, `path`, `status` | Request latency |
//!
//! `path` is the route with any `/api` prefix removed, so `/api/signup`
//! and `/signup` share a series. Unrecognized paths are bucketed as `/*`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http::{Request, Response};
use tower::{Layer, Service};

/// Known routes for metric label normalization.
const KNOWN_PATHS: &[&str] = &[
    "/",
    "/health",
    "/health/live",
    "/health/ready",
    "/metrics",
    "/signup",
    "/login",
    "/reset-password",
    "/send-notification",
    "/send-sms",
    "/send-otp",
    "/verify-otp",
];

/// Prefix under which every route is also mounted.
const API_PREFIX: &str = "/api";

/// Tower layer for request metrics collection.
///
/// Placed inside `TraceLayer` and outside `TimeoutLayer`, so timed-out
/// requests are counted with their 408 status.
#[derive(Clone, Copy, Default)]
pub struct MetricsLayer;

impl MetricsLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

/// Metrics middleware service.
#[derive(Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().to_string();
        let path = normalize_path(req.uri().path());

        let start = Instant::now();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            let duration = start.elapsed().as_secs_f64();
            let labels = [
                ("method", method),
                ("path", path.to_string()),
                ("status", response.status().as_u16().to_string()),
            ];

            metrics::counter!("http_requests_total", &labels).increment(1);
            metrics::histogram!("http_request_duration_seconds", &labels).record(duration);

            Ok(response)
        })
    }
}

/// Map a request path to a bounded label value.
fn normalize_path(path: &str) -> &'static str {
    let route = match path.strip_prefix(API_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    };

    KNOWN_PATHS
        .iter()
        .find(|known| **known == route)
        .copied()
        .unwrap_or("/*")
}
