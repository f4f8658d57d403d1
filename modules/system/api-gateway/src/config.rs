use authz_resolver_sdk::Verb;
use serde::{Deserialize, Serialize};

fn default_bind_addr() -> String {
    "127.0.0.1:8443".to_owned()
}

/// Gateway server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub bind_addr: String,

    /// Upper bound on a call's deadline. A `grpc-timeout` header can only shorten it.
    pub request_timeout_secs: u64,

    /// If true, routes not listed in `public_routes` require authentication.
    pub require_auth_by_default: bool,

    /// Routes served without running the authentication chain.
    pub public_routes: Vec<RouteConfig>,

    /// Routes that must pass the authorizer before reaching their handler.
    pub authorization_rules: Vec<AuthorizationRule>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_timeout_secs: 30,
            require_auth_by_default: true,
            public_routes: Vec::new(),
            authorization_rules: Vec::new(),
        }
    }
}

/// A `(method, path)` pair. Paths use `{param}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub method: String,
    pub path: String,
}

impl RouteConfig {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// Authorization required by a route.
///
/// `namespace_param` and `name_param` name path parameters whose values
/// scope the check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationRule {
    pub method: String,
    pub path: String,
    pub kind: String,
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_param: Option<String>,
}
