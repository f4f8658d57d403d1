//! Configuration for the authorizer.

use serde::Deserialize;

/// Configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizerConfig {
    /// Resource type tags the authorizer knows about.
    pub rest_mappings: Vec<RestMappingConfig>,
}

/// One type tag to API resource mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestMappingConfig {
    /// Type tag, e.g. `Offering`.
    pub kind: String,
    /// API group; empty for the core group.
    #[serde(default)]
    pub group: String,
    pub version: String,
    /// Plural resource name. Derived from `kind` when omitted.
    #[serde(default)]
    pub resource: Option<String>,
}
