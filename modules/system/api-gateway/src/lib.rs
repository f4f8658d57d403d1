#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! API gateway
//!
//! Puts the authentication chain and the route authorization rules in
//! front of the REST and `gRPC` handlers. Handlers read the caller with the
//! [`Authenticated`] extractor.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use authz_resolver::Authorizer;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use carrier_auth::AuthChain;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod web;

pub use auth::{AuthRequirement, AuthState, Authenticated, GatewayRoutePolicy, build_route_policy};
pub use authz::{AuthzRules, AuthzState, RouteAuthRequest};
pub use config::{AuthorizationRule, GatewayConfig, RouteConfig};
pub use error::{ApiError, BuildError, Protocol, ServeError};
pub use web::{VersionInfo, WhoAmI};

/// Routes that never run the authentication chain.
fn builtin_public_routes() -> [RouteConfig; 2] {
    [RouteConfig::new("GET", "/healthz"), RouteConfig::new("GET", "/v1/version")]
}

/// The HTTP front of the server.
pub struct Gateway {
    config: GatewayConfig,
    chain: Arc<AuthChain>,
    authorizer: Arc<Authorizer>,
    version: VersionInfo,
    routes: Router,
}

impl Gateway {
    #[must_use]
    pub fn new(config: GatewayConfig, chain: AuthChain, authorizer: Authorizer) -> Self {
        Self {
            config,
            chain: Arc::new(chain),
            authorizer: Arc::new(authorizer),
            version: VersionInfo::default(),
            routes: Router::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: VersionInfo) -> Self {
        self.version = version;
        self
    }

    /// Serve `routes` behind the gateway's authentication and authorization.
    #[must_use]
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    /// Build the router with all middleware applied.
    ///
    /// Every call's cancellation token is a child of `shutdown`.
    ///
    /// # Errors
    /// Returns [`BuildError`] if public routes or authorization rules are invalid.
    pub fn build_router(&self, shutdown: &CancellationToken) -> Result<Router, BuildError> {
        let route_policy = build_route_policy(&self.config, &builtin_public_routes())?;
        let rules = AuthzRules::from_config(&self.config.authorization_rules)?;
        let request_timeout = Duration::from_secs(self.config.request_timeout_secs);

        tracing::info!(
            require_auth_by_default = self.config.require_auth_by_default,
            public_routes_count = self.config.public_routes.len(),
            authorization_rules_count = self.config.authorization_rules.len(),
            providers = ?self.chain.names(),
            "Route policy built"
        );

        let version = self.version.clone();
        let mut router = self
            .routes
            .clone()
            .route("/healthz", get(|| async { "ok" }))
            .route("/v1/whoami", get(web::whoami))
            .route(
                "/v1/version",
                get(move || {
                    let version = version.clone();
                    async move { axum::Json(version) }
                }),
            );

        // The last added layer runs first. Request order:
        // SetRequestId -> PropagateRequestId -> Trace -> Timeout -> AuthN -> AuthZ -> Router

        router = router.layer(from_fn_with_state(
            AuthzState {
                rules,
                authorizer: Arc::clone(&self.authorizer),
            },
            authz::authz_middleware,
        ));

        router = router.layer(from_fn_with_state(
            AuthState {
                chain: Arc::clone(&self.chain),
                route_policy,
                shutdown: shutdown.clone(),
                request_timeout,
            },
            auth::authn_middleware,
        ));

        router = router.layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ));

        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                    let rid = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("n/a");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        request_id = %rid,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<axum::body::Body>, latency: Duration, span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record("latency_ms", latency.as_millis());
                    },
                ),
        );

        router = router.layer(PropagateRequestIdLayer::x_request_id());
        router = router.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Ok(router)
    }

    /// Bind, then serve until `shutdown` is cancelled.
    ///
    /// # Errors
    /// Returns [`ServeError`] if the router cannot be built, the address is
    /// invalid or the listener fails.
    pub async fn serve(&self, shutdown: CancellationToken) -> Result<(), ServeError> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .map_err(|source| ServeError::BindAddr {
                addr: self.config.bind_addr.clone(),
                source,
            })?;
        let router = self.build_router(&shutdown)?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server bound on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully (cancellation)");
            })
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
