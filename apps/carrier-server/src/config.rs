use std::path::Path;

use anyhow::{Context, Result, ensure};
use api_gateway::GatewayConfig;
use authz_resolver::RestMappingConfig;
use carrier_http::ClusterConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

/// Environment variables with this prefix override the file; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "CARRIER__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: GatewayConfig,
    pub cluster: ClusterConfig,
    /// Resource kinds the authorizer can map to API resources.
    pub rest_mappings: Vec<RestMappingConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Load configuration from the optional YAML file and the environment.
///
/// # Errors
/// Fails if `path` does not exist or the merged configuration does not
/// deserialize.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        ensure!(path.exists(), "config file {} does not exist", path.display());
        figment = figment.merge(Yaml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("invalid configuration")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let cfg = load_config(None).unwrap();
            assert_eq!(cfg.logging.format, LogFormat::Text);
            assert!(cfg.server.require_auth_by_default);
            assert_eq!(cfg.cluster, ClusterConfig::default());
            assert!(cfg.rest_mappings.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "carrier.yaml",
                r#"
logging:
  level: debug
  format: json
server:
  bind_addr: "0.0.0.0:8443"
  request_timeout_secs: 10
  public_routes:
    - { method: GET, path: /v1/docs }
  authorization_rules:
    - method: GET
      path: /v1/namespaces/{namespace}/offerings
      kind: Offering
      verb: list
      namespace_param: namespace
cluster:
  server: https://api.cluster.local:6443
rest_mappings:
  - { kind: Offering, group: catalog.kubecarrier.io, version: v1alpha1 }
"#,
            )?;
            jail.set_env("CARRIER__SERVER__REQUEST_TIMEOUT_SECS", "5");

            let cfg = load_config(Some(Path::new("carrier.yaml"))).unwrap();
            assert_eq!(cfg.logging.level, "debug");
            assert_eq!(cfg.logging.format, LogFormat::Json);
            assert_eq!(cfg.server.bind_addr, "0.0.0.0:8443");
            assert_eq!(cfg.server.request_timeout_secs, 5);
            assert_eq!(cfg.server.public_routes.len(), 1);
            assert_eq!(cfg.server.authorization_rules[0].kind, "Offering");
            assert_eq!(cfg.cluster.server, "https://api.cluster.local:6443");
            assert_eq!(cfg.rest_mappings[0].resource, None);
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_and_missing_files_are_errors() {
        Jail::expect_with(|jail| {
            jail.create_file("carrier.yaml", "server:\n  auth_disabled: true\n")?;
            assert!(load_config(Some(Path::new("carrier.yaml"))).is_err());
            assert!(load_config(Some(Path::new("missing.yaml"))).is_err());
            Ok(())
        });
    }
}
