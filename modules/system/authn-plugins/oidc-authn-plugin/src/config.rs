//! Command line options for the OIDC provider and their validation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use carrier_auth::InitError;
use clap::Args;
use jsonwebtoken::Algorithm;
use url::{Host, Url};

/// Prefix value that disables prefixing.
pub const NO_PREFIX: &str = "-";

const EMAIL_CLAIM: &str = "email";

#[derive(Debug, Clone, Args)]
pub struct OidcArgs {
    /// URL of the OIDC issuer. Only https is accepted, except for loopback hosts.
    #[arg(long = "oidc-issuer-url")]
    pub oidc_issuer_url: Option<String>,

    /// Client ID tokens must be issued for (the `aud` claim).
    #[arg(long = "oidc-client-id")]
    pub oidc_client_id: Option<String>,

    /// PEM bundle used to verify the issuer's certificate instead of the system roots.
    #[arg(long = "oidc-ca-file")]
    pub oidc_ca_file: Option<PathBuf>,

    /// Claim used as the user name.
    #[arg(long = "oidc-username-claim", default_value = "sub")]
    pub oidc_username_claim: String,

    /// Prefix for user names. When empty, claims other than `email` get the
    /// issuer URL as prefix; `-` disables prefixing.
    #[arg(long = "oidc-username-prefix", default_value = "")]
    pub oidc_username_prefix: String,

    /// Claim holding the user's groups, a string or a list of strings.
    #[arg(long = "oidc-groups-claim")]
    pub oidc_groups_claim: Option<String>,

    /// Prefix for group names; `-` disables prefixing.
    #[arg(long = "oidc-groups-prefix", default_value = "")]
    pub oidc_groups_prefix: String,

    /// Accepted asymmetric JOSE signing algorithms.
    #[arg(long = "oidc-signing-algs", value_delimiter = ',', default_value = "RS256")]
    pub oidc_signing_algs: Vec<String>,

    /// `key=value` claim every token must carry. Repeatable.
    #[arg(long = "oidc-required-claim", value_parser = parse_required_claim)]
    pub oidc_required_claim: Vec<(String, String)>,
}

fn parse_required_claim(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

/// Validated provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcOptions {
    pub issuer_url: String,
    pub client_id: String,
    pub ca_file: Option<PathBuf>,
    pub username_claim: String,
    /// Effective prefix, already resolved from the flag value.
    pub username_prefix: Option<String>,
    pub groups_claim: Option<String>,
    pub groups_prefix: Option<String>,
    pub signing_algs: Vec<Algorithm>,
    pub required_claims: BTreeMap<String, String>,
}

impl OidcOptions {
    /// Options with defaults for the given issuer and client.
    #[must_use]
    pub fn new(issuer_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        let issuer_url = issuer_url.into();
        Self {
            username_prefix: Some(format!("{issuer_url}#")),
            issuer_url,
            client_id: client_id.into(),
            ca_file: None,
            username_claim: "sub".to_owned(),
            groups_claim: None,
            groups_prefix: None,
            signing_algs: vec![Algorithm::RS256],
            required_claims: BTreeMap::new(),
        }
    }
}

fn is_asymmetric(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
            | Algorithm::ES256
            | Algorithm::ES384
            | Algorithm::EdDSA
    )
}

fn validate_issuer(raw: &str) -> Result<(), InitError> {
    let url = Url::parse(raw).map_err(|e| InitError::Config(format!("--oidc-issuer-url {raw}: {e}")))?;
    let loopback = match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        scheme => Err(InitError::Config(format!(
            "--oidc-issuer-url must use https, got {scheme}"
        ))),
    }
}

fn required(value: Option<String>, flag: &str) -> Result<String, InitError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| InitError::Config(format!("--{flag} is required")))
}

impl TryFrom<OidcArgs> for OidcOptions {
    type Error = InitError;

    fn try_from(args: OidcArgs) -> Result<Self, Self::Error> {
        let issuer_url = required(args.oidc_issuer_url, "oidc-issuer-url")?;
        validate_issuer(&issuer_url)?;
        let client_id = required(args.oidc_client_id, "oidc-client-id")?;

        let mut signing_algs = Vec::with_capacity(args.oidc_signing_algs.len());
        for name in &args.oidc_signing_algs {
            let alg = Algorithm::from_str(name.trim())
                .map_err(|_| InitError::Config(format!("unknown signing algorithm {name}")))?;
            if !is_asymmetric(alg) {
                return Err(InitError::Config(format!(
                    "signing algorithm {name} is not an asymmetric algorithm"
                )));
            }
            if !signing_algs.contains(&alg) {
                signing_algs.push(alg);
            }
        }
        if signing_algs.is_empty() {
            return Err(InitError::Config("--oidc-signing-algs must not be empty".to_owned()));
        }

        let username_prefix = match args.oidc_username_prefix.as_str() {
            NO_PREFIX => None,
            "" if args.oidc_username_claim == EMAIL_CLAIM => None,
            "" => Some(format!("{issuer_url}#")),
            prefix => Some(prefix.to_owned()),
        };
        let groups_prefix = match args.oidc_groups_prefix.as_str() {
            NO_PREFIX | "" => None,
            prefix => Some(prefix.to_owned()),
        };

        Ok(Self {
            issuer_url,
            client_id,
            ca_file: args.oidc_ca_file,
            username_claim: args.oidc_username_claim,
            username_prefix,
            groups_claim: args.oidc_groups_claim.filter(|c| !c.is_empty()),
            groups_prefix,
            signing_algs,
            required_claims: args.oidc_required_claim.into_iter().collect(),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use clap::{FromArgMatches, Command};

    use super::*;

    fn parse(args: &[&str]) -> Result<OidcOptions, InitError> {
        let cmd = OidcArgs::augment_args(Command::new("test"));
        let matches = cmd
            .try_get_matches_from(std::iter::once("test").chain(args.iter().copied()))
            .unwrap();
        OidcOptions::try_from(OidcArgs::from_arg_matches(&matches).unwrap())
    }

    #[test]
    fn defaults_prefix_username_with_issuer() {
        let opts = parse(&["--oidc-issuer-url", "https://id.example", "--oidc-client-id", "carrier"]).unwrap();
        assert_eq!(opts.username_claim, "sub");
        assert_eq!(opts.username_prefix.as_deref(), Some("https://id.example#"));
        assert_eq!(opts.groups_prefix, None);
        assert_eq!(opts.signing_algs, vec![Algorithm::RS256]);
    }

    #[test]
    fn email_claim_and_dash_disable_prefix() {
        let email = parse(&[
            "--oidc-issuer-url",
            "https://id.example",
            "--oidc-client-id",
            "c",
            "--oidc-username-claim",
            "email",
        ])
        .unwrap();
        assert_eq!(email.username_prefix, None);

        let dash = parse(&[
            "--oidc-issuer-url",
            "https://id.example",
            "--oidc-client-id",
            "c",
            "--oidc-username-prefix",
            "-",
            "--oidc-groups-prefix",
            "-",
        ])
        .unwrap();
        assert_eq!(dash.username_prefix, None);
        assert_eq!(dash.groups_prefix, None);
    }

    #[test]
    fn parses_algorithms_and_required_claims() {
        let opts = parse(&[
            "--oidc-issuer-url",
            "https://id.example",
            "--oidc-client-id",
            "c",
            "--oidc-signing-algs",
            "RS256,ES256",
            "--oidc-required-claim",
            "tenant=acme",
            "--oidc-required-claim",
            "hd=example.com",
        ])
        .unwrap();
        assert_eq!(opts.signing_algs, vec![Algorithm::RS256, Algorithm::ES256]);
        assert_eq!(opts.required_claims.get("tenant").map(String::as_str), Some("acme"));
        assert_eq!(opts.required_claims.len(), 2);
    }

    #[test]
    fn rejects_symmetric_algorithms_and_plain_http() {
        let hs = parse(&[
            "--oidc-issuer-url",
            "https://id.example",
            "--oidc-client-id",
            "c",
            "--oidc-signing-algs",
            "HS256",
        ]);
        assert!(matches!(hs, Err(InitError::Config(_))));

        let http = parse(&["--oidc-issuer-url", "http://id.example", "--oidc-client-id", "c"]);
        assert!(matches!(http, Err(InitError::Config(_))));

        let loopback = parse(&["--oidc-issuer-url", "http://127.0.0.1:5556", "--oidc-client-id", "c"]);
        assert!(loopback.is_ok());
    }

    #[test]
    fn issuer_and_client_are_required() {
        assert!(matches!(parse(&["--oidc-client-id", "c"]), Err(InitError::Config(_))));
        assert!(matches!(
            parse(&["--oidc-issuer-url", "https://id.example"]),
            Err(InitError::Config(_))
        ));
    }

    #[test]
    fn malformed_required_claim_is_a_flag_error() {
        let cmd = OidcArgs::augment_args(Command::new("test"));
        assert!(cmd.try_get_matches_from(["test", "--oidc-required-claim", "novalue"]).is_err());
    }
}
