//! autha-ldap checks logins against an LDAP directory.
//!
//! The core lives in [`ldap`]: a search-then-bind verification on a single
//! directory connection. The rest is a thin HTTP host around it.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod ldap;
pub mod middleware;
mod router;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use middleware::{AuthenticationMiddleware, Registry};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// Content type of HTML forms.
#[cfg(test)]
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: axum::http::Method,
    path: &str,
    headers: &[(header::HeaderName, &str)],
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        request = request.header(name, *value);
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub registry: Registry,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Middleware selected by the configuration.
    pub fn middleware(&self) -> error::Result<Arc<dyn AuthenticationMiddleware>> {
        self.registry.get(&self.config.middleware).ok_or_else(|| {
            ServerError::UnknownMiddleware(self.config.middleware.clone())
        })
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout, directory calls included.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE, header::SET_COOKIE]));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `GET /metrics` renders Prometheus metrics.
        .route("/metrics", get(telemetry::render))
        .route("/api/middleware", get(router::middleware::list))
        .route("/api/middleware/{name}", get(router::middleware::setup))
        // Login page and login submission.
        .route(
            ldap::backend::LOGIN_PATH,
            get(router::login::entry_point).post(router::login::callback),
        )
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // read configuration file. let it in memory.
    let path = std::env::var("CONFIG_PATH").unwrap_or_default();
    let config = config::Configuration::default().path(path.into()).read();

    let registry = Registry::builder()
        .register(
            ldap::backend::NAME,
            ldap::LdapBackend::new(ldap::Ldap3Connector::new()),
        )
        .build();

    if registry.get(&config.middleware).is_none() {
        return Err(Box::new(ServerError::UnknownMiddleware(
            config.middleware.clone(),
        )));
    }

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "prometheus recorder not installed");
            None
        },
    };

    Ok(AppState {
        config: Arc::new(config),
        registry,
        metrics,
    })
}
