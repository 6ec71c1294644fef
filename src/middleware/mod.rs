//! Tower middleware for the HTTP pipeline.
//!
//! # Middleware Order
//! Request flows top to bottom through the `ServiceBuilder` in
//! `startup::apply_middleware`:
//! 1. RequestIdLayer - Extract/generate request ID first
//! 2. TraceLayer - Request tracing with spans
//! 3. MetricsLayer - Request count and latency
//! 4. TimeoutLayer - Request timeout
//! 5. CorsLayer - CORS handling

pub mod metrics;
pub mod request_id;

pub use metrics::MetricsLayer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
