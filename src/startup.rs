//! Server startup and wiring.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use agrisense_db::Directory;
use agrisense_telemetry::PrometheusHandle;
use agrisense_twilio::TwilioService;
use axum::Router;
use axum::extract::FromRef;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Method, Request};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};

use crate::config::Config;
use crate::core::{ServiceContext, SmsProvider};
use crate::middleware::{MetricsLayer, REQUEST_ID_HEADER, RequestId, RequestIdLayer};
use crate::routes::build_router;
use crate::services::{AccountService, NotificationService};

/// CORS preflight cache lifetime.
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ServiceContext>,
    pub accounts: Arc<AccountService>,
    pub notifications: Arc<NotificationService>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(ctx: ServiceContext, metrics: Option<PrometheusHandle>) -> Self {
        let ctx = Arc::new(ctx);
        Self {
            accounts: Arc::new(AccountService::new(ctx.clone())),
            notifications: Arc::new(NotificationService::new(ctx.clone())),
            ctx,
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl FromRef<AppState> for Arc<NotificationService> {
    fn from_ref(state: &AppState) -> Self {
        state.notifications.clone()
    }
}

/// Build and configure the complete application.
pub async fn build_app(
    config: &Config,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<(Router, SocketAddr)> {
    let addr: SocketAddr = config.address.parse()?;

    // Account directory
    let directory = match config.db_config() {
        Some(db_config) => {
            let directory = Directory::connect(&db_config).await?;
            info!("Connected to database");
            directory
        }
        None => {
            warn!("DB_URL not set, accounts are kept in memory and lost on restart");
            Directory::in_memory()
        }
    };

    // SMS provider
    let sms = match config.twilio_config() {
        Some(twilio_config) => {
            let service = TwilioService::new(twilio_config)?;
            service.validate_config()?;
            SmsProvider::Twilio(Arc::new(service))
        }
        None => {
            warn!("Twilio not configured, SMS bodies are logged instead of sent");
            SmsProvider::Console
        }
    };

    info!(
        directory = directory.backend(),
        sms = sms.name(),
        otp = sms.otp_enabled(),
        "Services initialized"
    );

    let state = AppState::new(ServiceContext::new(directory, sms), metrics);
    let app = apply_middleware(build_router(state), config);

    Ok((app, addr))
}

/// Wrap the router in the shared middleware stack.
pub fn apply_middleware(router: Router, config: &Config) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(RequestIdLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let request_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(RequestId::as_str)
                        .unwrap_or_default();
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id,
                    )
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(MetricsLayer::new())
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(build_cors(config));

    router.layer(middleware)
}

fn build_cors(config: &Config) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION, request_id.clone()])
    };

    cors.expose_headers([request_id]).max_age(CORS_MAX_AGE)
}
