//! Route authorization: configured rules checked by the [`Authorizer`].

use std::collections::HashMap;
use std::sync::Arc;

use authz_resolver::Authorizer;
use authz_resolver_sdk::{AuthRequest, AuthorizationOption, Verb};
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use carrier_auth::{AuthError, CallContext};

use crate::auth::parse_method;
use crate::config::AuthorizationRule;
use crate::error::{ApiError, BuildError};

#[derive(Debug, Clone)]
struct RuleTarget {
    kind: String,
    verb: Verb,
    namespace_param: Option<String>,
    name_param: Option<String>,
}

/// A request matched against a rule, ready for the authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAuthRequest {
    kind: String,
    option: AuthorizationOption,
}

impl AuthRequest for RouteAuthRequest {
    fn auth_option(&self) -> AuthorizationOption {
        self.option.clone()
    }

    fn resource_kind(&self) -> &str {
        &self.kind
    }
}

/// Authorization rules indexed by method and path pattern.
#[derive(Clone, Default)]
pub struct AuthzRules {
    by_method: Arc<HashMap<Method, matchit::Router<RuleTarget>>>,
}

impl AuthzRules {
    /// # Errors
    /// Returns [`BuildError`] for an unknown method, a malformed or
    /// conflicting path, or a scope parameter missing from its path.
    pub fn from_config(rules: &[AuthorizationRule]) -> Result<Self, BuildError> {
        let mut by_method: HashMap<Method, matchit::Router<RuleTarget>> = HashMap::new();
        for rule in rules {
            for param in rule.namespace_param.iter().chain(&rule.name_param) {
                if !rule.path.contains(&format!("{{{param}}}")) {
                    return Err(BuildError::UnknownParam {
                        path: rule.path.clone(),
                        param: param.clone(),
                    });
                }
            }
            let target = RuleTarget {
                kind: rule.kind.clone(),
                verb: rule.verb,
                namespace_param: rule.namespace_param.clone(),
                name_param: rule.name_param.clone(),
            };
            by_method
                .entry(parse_method(&rule.method)?)
                .or_insert_with(matchit::Router::new)
                .insert(rule.path.clone(), target)
                .map_err(|source| BuildError::InvalidRoute {
                    path: rule.path.clone(),
                    source,
                })?;
        }
        Ok(Self {
            by_method: Arc::new(by_method),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty()
    }

    /// The authorization a call to `(method, path)` needs, if any rule covers it.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteAuthRequest> {
        let matched = self.by_method.get(method)?.at(path).ok()?;
        let target = matched.value;

        let mut option = AuthorizationOption::new(target.verb);
        if let Some(value) = target.namespace_param.as_deref().and_then(|p| matched.params.get(p)) {
            option = option.namespace(value);
        }
        if let Some(value) = target.name_param.as_deref().and_then(|p| matched.params.get(p)) {
            option = option.name(value);
        }

        Some(RouteAuthRequest {
            kind: target.kind.clone(),
            option,
        })
    }
}

/// Shared state for the authorization middleware.
#[derive(Clone)]
pub struct AuthzState {
    pub rules: AuthzRules,
    pub authorizer: Arc<Authorizer>,
}

/// Authorization middleware. Must run inside the authentication middleware.
///
/// Requests no rule covers pass through untouched.
pub async fn authz_middleware(State(state): State<AuthzState>, req: Request, next: Next) -> Response {
    let Some(auth_request) = state.rules.resolve(req.method(), req.uri().path()) else {
        return next.run(req).await;
    };

    let Some(ctx) = req.extensions().get::<CallContext>().cloned() else {
        let err = AuthError::internal("authorization rule matched a request without call context");
        return ApiError::for_request(err, req.headers()).into_response();
    };

    match state.authorizer.authorize_request(&ctx, &auth_request).await {
        Ok(()) => next.run(req).await,
        Err(err) => ApiError::for_request(err, req.headers()).into_response(),
    }
}
