//! Gasto Recorrente Web Server
//!
//! Axum-based REST API for the Gasto Recorrente subscription analyzer.
//!
//! Security features:
//! - Restrictive CORS policy
//! - CSRF token and origin validation on billing requests
//! - Per-IP rate limiting on the extraction and billing endpoints
//! - Security headers (CSP, X-Frame-Options, X-Content-Type-Options)
//! - Sanitized error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info};

use gasto_core::ai::FallbackOrchestrator;
use gasto_core::billing::BillingDispatcher;
use gasto_core::paywall::{ConfirmationLedger, PaywallGate};
use gasto_core::ratelimit::{RateLimitConfig, RateLimiter};

mod client_ip;
mod handlers;
mod scheduler;

pub use scheduler::{start_sweep_scheduler, SWEEP_INTERVAL};

/// Default public site URL when `SITE_URL` is unset
pub const DEFAULT_SITE_URL: &str = "https://gastorecorrente.shop";

/// Header carrying the CSRF token on billing requests
pub(crate) const CSRF_TOKEN_HEADER: &str = "x-csrf-token";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Public site URL, used for billing origin checks and payment links
    pub site_url: String,
    /// Rate limit for the extraction endpoint
    pub extraction_limit: RateLimitConfig,
    /// Rate limit for the billing endpoint
    pub billing_limit: RateLimitConfig,
    /// When set, unlocking a report also requires a webhook-confirmed payment
    pub require_payment_confirmation: bool,
    /// Stripe webhook signing secret; unset leaves the Stripe webhook unconfigured
    pub stripe_webhook_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            extraction_limit: RateLimitConfig::new(5, Duration::from_secs(60)),
            billing_limit: RateLimitConfig::billing(),
            require_payment_confirmation: false,
            stripe_webhook_secret: None,
        }
    }
}

impl ServerConfig {
    /// Build configuration from environment variables
    ///
    /// `SITE_URL` defaults to the production site. `RATE_LIMIT_AI` tunes
    /// the extraction window. `REQUIRE_PAYMENT_CONFIRMATION=true` makes
    /// unlocking wait for a provider webhook. `STRIPE_WEBHOOK_SECRET`
    /// enables Stripe webhook signature verification.
    pub fn from_env() -> Self {
        let site_url = std::env::var("SITE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

        let require_payment_confirmation = std::env::var("REQUIRE_PAYMENT_CONFIRMATION")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);

        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            site_url,
            extraction_limit: RateLimitConfig::extraction_from_env(),
            billing_limit: RateLimitConfig::billing(),
            require_payment_confirmation,
            stripe_webhook_secret,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// Provider fallback chain for statement extraction
    pub orchestrator: FallbackOrchestrator,
    /// PIX charge creation with provider fallback
    pub dispatcher: BillingDispatcher,
    /// Per-IP counters for the extraction endpoint
    pub extraction_limiter: RateLimiter,
    /// Per-IP counters for the billing endpoint
    pub billing_limiter: RateLimiter,
    /// Pending payment markers and unlocked reports
    pub gate: PaywallGate,
    /// Webhook-confirmed payments, keyed by analysis id
    pub ledger: Arc<ConfirmationLedger>,
}

impl AppState {
    pub fn new(
        orchestrator: FallbackOrchestrator,
        dispatcher: BillingDispatcher,
        config: ServerConfig,
    ) -> Self {
        let ledger = Arc::new(ConfirmationLedger::new());
        let gate = if config.require_payment_confirmation {
            PaywallGate::require_confirmation(ledger.clone())
        } else {
            PaywallGate::new()
        };

        Self {
            config,
            orchestrator,
            dispatcher,
            extraction_limiter: RateLimiter::in_memory(),
            billing_limiter: RateLimiter::in_memory(),
            gate,
            ledger,
        }
    }
}

/// Create the application router with clients built from the environment
pub fn create_router(static_dir: Option<&str>, config: ServerConfig) -> Router {
    let orchestrator = FallbackOrchestrator::from_env();
    let dispatcher = BillingDispatcher::from_env();
    let state = Arc::new(AppState::new(orchestrator, dispatcher, config));
    create_router_with_state(state, static_dir)
}

/// Create the application router over prebuilt state (for testing)
pub fn create_router_with_state(state: Arc<AppState>, static_dir: Option<&str>) -> Router {
    let api_routes = Router::new()
        // Statement analysis
        .route("/analyze", post(handlers::analyze))
        // PIX billing
        .route("/billing", post(handlers::create_billing))
        // Payment return and verification
        .route("/payments/return", get(handlers::payment_return))
        .route("/payments/verify", get(handlers::verify_payment))
        // Unlocked reports and the canned demo
        .route("/reports/:id", get(handlers::get_report))
        .route("/demo", get(handlers::demo))
        // Cheaper alternative suggestions
        .route("/alternatives", get(handlers::list_alternatives))
        // Payment provider webhooks
        .route("/webhooks/woovi", post(handlers::woovi_webhook))
        .route("/webhooks/abacatepay", post(handlers::abacatepay_webhook))
        .route("/webhooks/stripe", post(handlers::stripe_webhook))
        // Health check
        .route("/health", get(handlers::health));

    // Restrictive CORS: same-origin only. The CSRF header must be allowed
    // or browser preflights reject the billing request.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(CSRF_TOKEN_HEADER),
        ]);

    // Security headers
    // CSP: restrict scripts to same-origin, allow inline styles, allow
    // https: images for provider-hosted PIX QR codes
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' blob: data: https:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(host: &str, port: u16, static_dir: Option<&str>) -> anyhow::Result<()> {
    serve_with_config(host, port, static_dir, ServerConfig::from_env()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.require_payment_confirmation {
        info!("Payment confirmation required before unlocking reports");
    }

    let orchestrator = FallbackOrchestrator::from_env();
    let dispatcher = BillingDispatcher::from_env();
    let state = Arc::new(AppState::new(orchestrator, dispatcher, config));

    // Periodic cleanup of expired rate-limit windows and payment markers
    start_sweep_scheduler(state.clone());

    let app = create_router_with_state(state, static_dir)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the shared 429 response with the client-facing retry hint
pub(crate) fn too_many_requests(
    limiter: &RateLimiter,
    identifier: &str,
    config: &RateLimitConfig,
) -> Result<Response, AppError> {
    let info = limiter.info(identifier, config)?;
    let retry_after = info.reset_in.as_secs_f64().ceil() as u64;

    tracing::warn!(client = %identifier, retry_after, "Rate limit exceeded");

    let body = Json(serde_json::json!({
        "error": "Too many requests",
        "retryAfter": retry_after,
    }));
    Ok((StatusCode::TOO_MANY_REQUESTS, body).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn forbidden(msg: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
