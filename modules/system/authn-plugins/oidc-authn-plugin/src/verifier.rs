//! ID token verification and claim mapping.

use carrier_auth::{AuthError, UserInfo};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};
use serde_json::{Map, Value};

use crate::config::OidcOptions;
use crate::jwks::KeyCache;

type Claims = Map<String, Value>;

const EMAIL_CLAIM: &str = "email";
const EMAIL_VERIFIED_CLAIM: &str = "email_verified";

#[derive(Debug)]
pub struct TokenVerifier {
    options: OidcOptions,
    keys: KeyCache,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(options: OidcOptions, keys: KeyCache) -> Self {
        Self { options, keys }
    }

    /// Verify `token` and map its claims to a user.
    ///
    /// # Errors
    /// - [`AuthError::Unauthenticated`] for any token that does not validate
    /// - [`AuthError::Internal`] if signing keys cannot be refreshed
    pub async fn verify(&self, token: &str) -> Result<UserInfo, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "malformed token header");
            AuthError::unauthenticated("malformed token")
        })?;
        if !self.options.signing_algs.contains(&header.alg) {
            return Err(AuthError::unauthenticated(format!(
                "signing algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let mut keys = candidate_keys(&self.keys.keys(), &header);
        if keys.is_empty() && header.kid.is_some() {
            let refreshed = self.keys.refresh().await.map_err(|e| {
                tracing::error!(error = %e, "refreshing OIDC signing keys failed");
                AuthError::internal("cannot refresh signing keys")
            })?;
            if let Some(set) = refreshed {
                keys = candidate_keys(&set, &header);
            }
        }
        if keys.is_empty() {
            return Err(AuthError::unauthenticated("no signing key matches the token"));
        }

        let claims = self.decode_with(token, header.alg, &keys)?;
        self.map_claims(&claims)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.options.issuer_url]);
        validation.set_audience(&[&self.options.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation
    }

    fn decode_with(&self, token: &str, alg: Algorithm, keys: &[DecodingKey]) -> Result<Claims, AuthError> {
        let validation = self.validation(alg);
        let mut last = None;
        for key in keys {
            match decode::<Claims>(token, key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => last = Some(e),
                Err(e) => {
                    tracing::debug!(error = %e, "token rejected");
                    return Err(AuthError::unauthenticated(format!("invalid token: {e}")));
                }
            }
        }
        let reason = last.map_or_else(|| "no usable key".to_owned(), |e| e.to_string());
        tracing::debug!(reason = %reason, "token signature rejected");
        Err(AuthError::unauthenticated("invalid token signature"))
    }

    fn map_claims(&self, claims: &Claims) -> Result<UserInfo, AuthError> {
        for (key, expected) in &self.options.required_claims {
            match claims.get(key) {
                Some(Value::String(actual)) if actual == expected => {}
                Some(_) => {
                    return Err(AuthError::unauthenticated(format!(
                        "required claim {key} does not match"
                    )));
                }
                None => {
                    return Err(AuthError::unauthenticated(format!("required claim {key} is missing")));
                }
            }
        }

        let claim = &self.options.username_claim;
        let username = claims
            .get(claim)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AuthError::unauthenticated(format!("claim {claim} is missing or not a string")))?;
        if claim == EMAIL_CLAIM
            && let Some(verified) = claims.get(EMAIL_VERIFIED_CLAIM)
            && verified.as_bool() != Some(true)
        {
            return Err(AuthError::unauthenticated("email not verified"));
        }

        let name = match &self.options.username_prefix {
            Some(prefix) => format!("{prefix}{username}"),
            None => username.to_owned(),
        };

        let groups = match &self.options.groups_claim {
            Some(groups_claim) => groups_from(claims.get(groups_claim))?,
            None => Vec::new(),
        };
        let groups = groups.into_iter().map(|group| match &self.options.groups_prefix {
            Some(prefix) => format!("{prefix}{group}"),
            None => group,
        });

        Ok(UserInfo::new(name).with_groups(groups))
    }
}

fn groups_from(value: Option<&Value>) -> Result<Vec<String>, AuthError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(group)) => Ok(vec![group.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| AuthError::unauthenticated("groups claim must hold strings"))
            })
            .collect(),
        Some(_) => Err(AuthError::unauthenticated("groups claim must be a string or a list")),
    }
}

/// Keys that may have signed a token with `header`: the one matching its
/// `kid`, or every key when the token names none.
fn candidate_keys(set: &JwkSet, header: &Header) -> Vec<DecodingKey> {
    let jwks = set.keys.iter().filter(|jwk| match &header.kid {
        Some(kid) => jwk.common.key_id.as_deref() == Some(kid.as_str()),
        None => true,
    });
    jwks.filter_map(|jwk| match DecodingKey::from_jwk(jwk) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::debug!(kid = ?jwk.common.key_id, error = %e, "skipping unusable JWK");
            None
        }
    })
    .collect()
}
