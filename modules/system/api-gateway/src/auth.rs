use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, Method, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use carrier_auth::{AuthChain, AuthError, CallContext};
use http_body::{Frame, SizeHint};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::{GatewayConfig, RouteConfig};
use crate::error::{ApiError, BuildError};

const GRPC_TIMEOUT: &str = "grpc-timeout";

/// Path matcher for one HTTP method.
#[derive(Clone, Default)]
pub struct RouteMatcher {
    matcher: matchit::Router<()>,
}

impl RouteMatcher {
    fn insert(&mut self, path: &str) -> Result<(), matchit::InsertError> {
        self.matcher.insert(path, ())
    }

    fn find(&self, path: &str) -> bool {
        self.matcher.at(path).is_ok()
    }
}

pub(crate) fn parse_method(method: &str) -> Result<Method, BuildError> {
    method
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| BuildError::InvalidMethod(method.to_owned()))
}

/// Whether a route requires authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequirement {
    /// No authentication required (public route).
    None,
    /// Authentication required.
    Required,
}

/// Decides per `(method, path)` whether the chain runs.
#[derive(Clone)]
pub struct GatewayRoutePolicy {
    public_matchers: Arc<HashMap<Method, RouteMatcher>>,
    require_auth_by_default: bool,
}

impl GatewayRoutePolicy {
    #[must_use]
    pub fn new(public_matchers: Arc<HashMap<Method, RouteMatcher>>, require_auth_by_default: bool) -> Self {
        Self {
            public_matchers,
            require_auth_by_default,
        }
    }

    /// Resolve the authentication requirement for a given (method, path).
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> AuthRequirement {
        let is_public = self
            .public_matchers
            .get(method)
            .is_some_and(|matcher| matcher.find(path));

        if self.require_auth_by_default && !is_public {
            AuthRequirement::Required
        } else {
            AuthRequirement::None
        }
    }
}

/// Build the policy from the configured public routes plus `builtin` ones.
///
/// # Errors
/// Returns [`BuildError`] for an unknown method or a malformed path pattern.
pub fn build_route_policy(cfg: &GatewayConfig, builtin: &[RouteConfig]) -> Result<GatewayRoutePolicy, BuildError> {
    let mut public_routes = HashSet::new();
    for route in builtin.iter().chain(&cfg.public_routes) {
        public_routes.insert((parse_method(&route.method)?, route.path.clone()));
    }

    let mut public_matchers: HashMap<Method, RouteMatcher> = HashMap::new();
    for (method, path) in public_routes {
        public_matchers
            .entry(method)
            .or_default()
            .insert(&path)
            .map_err(|source| BuildError::InvalidRoute { path, source })?;
    }

    Ok(GatewayRoutePolicy::new(
        Arc::new(public_matchers),
        cfg.require_auth_by_default,
    ))
}

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub chain: Arc<AuthChain>,
    pub route_policy: GatewayRoutePolicy,
    /// Server shutdown token; every call gets a child of it.
    pub shutdown: CancellationToken,
    pub request_timeout: Duration,
}

impl AuthState {
    fn call_context(&self, headers: &HeaderMap) -> CallContext {
        CallContext::new(headers.clone())
            .with_cancellation(self.shutdown.child_token())
            .with_timeout(request_deadline(headers, self.request_timeout))
    }
}

/// Parse a `grpc-timeout` header value: up to 8 digits followed by a unit.
fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if !value.is_ascii() || value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let timeout = match unit {
        "H" => Duration::from_secs(amount * 3600),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}

/// Time budget of a call: the client's `grpc-timeout` capped by `cap`.
fn request_deadline(headers: &HeaderMap, cap: Duration) -> Duration {
    headers
        .get(GRPC_TIMEOUT)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_grpc_timeout)
        .map_or(cap, |requested| requested.min(cap))
}

/// Authentication middleware running the [`AuthChain`].
///
/// For each request:
/// 1. Skips CORS preflight requests
/// 2. Builds a [`CallContext`] from the headers, with a cancellation token and deadline
/// 3. For public routes: inserts the context without an identity
/// 4. For required routes: runs the chain and inserts the authenticated context
///
/// The context is cancelled once the response body has been sent or dropped,
/// so work feeding a streamed body keeps running until the client is done.
pub async fn authn_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    // Skip CORS preflight
    if is_preflight_request(req.method(), req.headers()) {
        return next.run(req).await;
    }

    let ctx = state.call_context(req.headers());
    let guard = ctx.cancellation().clone().drop_guard();

    let response = match state.route_policy.resolve(req.method(), req.uri().path()) {
        AuthRequirement::None => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        AuthRequirement::Required => match state.chain.authenticate(ctx).await {
            Ok(ctx) => {
                req.extensions_mut().insert(ctx);
                next.run(req).await
            }
            Err(err) => ApiError::for_request(err, req.headers()).into_response(),
        },
    };
    response.map(|inner| Body::new(CancelOnDrop { inner, _guard: guard }))
}

/// Response body that cancels its call context when dropped.
struct CancelOnDrop {
    inner: Body,
    _guard: DropGuard,
}

impl http_body::Body for CancelOnDrop {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        http_body::Body::poll_frame(Pin::new(&mut self.inner), cx)
    }

    fn is_end_stream(&self) -> bool {
        http_body::Body::is_end_stream(&self.inner)
    }

    fn size_hint(&self) -> SizeHint {
        http_body::Body::size_hint(&self.inner)
    }
}

/// Check if this is a CORS preflight request
///
/// Preflight requests are OPTIONS requests with:
/// - Origin header present
/// - Access-Control-Request-Method header present
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// The [`CallContext`] the authentication middleware attached to the request.
///
/// On a public route the context carries no identity, and
/// [`CallContext::extract_identity`] fails `Unauthenticated`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub CallContext);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallContext>()
            .cloned()
            .map(Self)
            .ok_or_else(|| {
                ApiError::for_request(
                    AuthError::internal("request has no call context; authentication layer missing"),
                    &parts.headers,
                )
            })
    }
}
