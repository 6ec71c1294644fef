//! Route table and health check handlers.

use agrisense_core::{AppError, AppResult};
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use serde::Serialize;

use crate::core::SmsProvider;
use crate::services::{accounts, notifications};
use crate::startup::AppState;

/// Build version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Banner served at `/`.
const BANNER: &str = "AgriSense backend running";

/// Historical prefix every route is also mounted under.
const API_PREFIX: &str = "/api";

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    database: CheckResult,
    sms: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CheckResult {
    const fn healthy() -> Self {
        Self {
            status: "healthy",
            message: None,
        }
    }

    fn healthy_with(message: impl Into<String>) -> Self {
        Self {
            status: "healthy",
            message: Some(message.into()),
        }
    }

    fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            message: Some(message.into()),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Build the full router, mounted at the root and under `/api`.
pub fn build_router(state: AppState) -> Router {
    let routes = routes();
    Router::new()
        .merge(routes.clone())
        .nest(API_PREFIX, routes)
        .with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { BANNER }))
        .route("/health", get(|| async { "OK" }))
        .route("/health/live", get(|| async { "OK" }))
        .route("/health/ready", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        .route("/reset-password", post(accounts::reset_password))
        .route("/send-otp", post(accounts::send_otp))
        .route("/verify-otp", post(accounts::verify_otp))
        .route("/send-notification", post(notifications::send_notification))
        .route("/send-sms", post(notifications::send_notification))
}

async fn metrics_handler(State(state): State<AppState>) -> AppResult<String> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::NotConfigured("Metrics not enabled".to_string()))
}

async fn readiness_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let directory = state.ctx.directory();
    let db_check = if directory.health_check().await {
        CheckResult::healthy_with(directory.backend())
    } else {
        CheckResult::unhealthy("Database connection failed")
    };

    let sms_check = match state.ctx.sms() {
        SmsProvider::Twilio(service) => match service.validate_config() {
            Ok(()) => CheckResult::healthy(),
            Err(e) => CheckResult::unhealthy(e.to_string()),
        },
        SmsProvider::Console => CheckResult::healthy_with("console"),
    };

    let healthy = db_check.is_healthy() && sms_check.is_healthy();

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        version: VERSION,
        checks: HealthChecks {
            database: db_check,
            sms: sms_check,
        },
    })
}
