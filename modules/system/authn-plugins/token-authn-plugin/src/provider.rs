use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use carrier_auth::{AuthError, AuthProvider, BEARER, CallContext, InitError, UserInfo, extract_credential};
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::config::{TokenArgs, TokenOptions};
use crate::review::{TokenReviewStatus, TokenReviewer};

pub const WRONG_AUDIENCE: &str = "wrong API audience";

const NOT_AUTHENTICATED: &str = "token not authenticated";

/// Bearer-token provider delegating to a token review oracle.
pub struct TokenProvider {
    reviewer: Arc<dyn TokenReviewer>,
    options: OnceLock<TokenOptions>,
}

impl TokenProvider {
    #[must_use]
    pub fn new(reviewer: Arc<dyn TokenReviewer>) -> Self {
        Self {
            reviewer,
            options: OnceLock::new(),
        }
    }

    /// # Errors
    /// Returns [`InitError::AlreadyInitialized`] on a second call.
    pub fn configure(&self, options: TokenOptions) -> Result<(), InitError> {
        self.options
            .set(options)
            .map_err(|_| InitError::AlreadyInitialized)
    }

    fn check(&self, status: TokenReviewStatus) -> Result<UserInfo, AuthError> {
        let options = self
            .options
            .get()
            .ok_or_else(|| AuthError::internal("token provider used before init"))?;

        if !status.authenticated {
            let message = if status.error.is_empty() {
                NOT_AUTHENTICATED.to_owned()
            } else {
                status.error
            };
            return Err(AuthError::Unauthenticated(message));
        }

        if !options.audiences.is_empty()
            && !status.audiences.iter().any(|a| options.audiences.contains(a))
        {
            tracing::debug!(audiences = ?status.audiences, "token bound to foreign audiences");
            return Err(AuthError::unauthenticated(WRONG_AUDIENCE));
        }

        let user = status.user;
        let info = UserInfo::new(user.username)
            .with_uid(user.uid)
            .with_groups(user.groups);
        Ok(user
            .extra
            .into_iter()
            .fold(info, |info, (key, values)| info.with_extra(key, values)))
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("options", &self.options.get())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for TokenProvider {
    fn name(&self) -> &'static str {
        "Token"
    }

    fn add_flags(&self, cmd: Command) -> Command {
        TokenArgs::augment_args(cmd)
    }

    async fn init(&self, flags: &ArgMatches) -> Result<(), InitError> {
        let args = TokenArgs::from_arg_matches(flags).map_err(|e| InitError::Config(e.to_string()))?;
        self.configure(TokenOptions::from(args))
    }

    async fn authenticate(&self, ctx: &CallContext) -> Result<UserInfo, AuthError> {
        let token = extract_credential(ctx.metadata(), BEARER)?;
        let status = ctx.run(self.reviewer.review(token)).await?.map_err(|e| {
            tracing::error!(error = %e, "token review failed");
            AuthError::internal("token review failed")
        })?;
        self.check(status)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::BTreeSet;

    use http::{HeaderMap, HeaderValue, header};
    use parking_lot::Mutex;

    use super::*;
    use crate::review::{ReviewError, ReviewedUser};

    struct Scripted {
        answer: Result<TokenReviewStatus, String>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(answer: Result<TokenReviewStatus, String>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TokenReviewer for Scripted {
        async fn review(&self, token: &str) -> Result<TokenReviewStatus, ReviewError> {
            self.seen.lock().push(token.to_owned());
            self.answer.clone().map_err(ReviewError)
        }
    }

    fn authenticated(audiences: &[&str]) -> TokenReviewStatus {
        TokenReviewStatus {
            authenticated: true,
            user: ReviewedUser {
                username: "system:serviceaccount:acme:robot".to_owned(),
                uid: "uid-1".to_owned(),
                groups: vec!["system:serviceaccounts".to_owned()],
                extra: [("scope".to_owned(), vec!["read".to_owned()])].into(),
            },
            audiences: audiences.iter().map(|a| (*a).to_owned()).collect(),
            error: String::new(),
        }
    }

    fn bearer(token: &str) -> CallContext {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        CallContext::new(headers)
    }

    fn provider(reviewer: Arc<Scripted>, audiences: &[&str]) -> TokenProvider {
        let provider = TokenProvider::new(reviewer);
        provider
            .configure(TokenOptions::with_audiences(audiences.iter().copied()))
            .unwrap();
        provider
    }

    #[tokio::test]
    async fn reviewed_user_becomes_identity() {
        let reviewer = Scripted::new(Ok(authenticated(&["api"])));
        let provider = provider(Arc::clone(&reviewer), &[]);

        let user = provider.authenticate(&bearer("sa-token")).await.unwrap();

        assert_eq!(reviewer.seen.lock().as_slice(), ["sa-token".to_owned()]);
        assert_eq!(user.name, "system:serviceaccount:acme:robot");
        assert_eq!(user.uid, "uid-1");
        assert_eq!(user.groups, vec!["system:serviceaccounts".to_owned()]);
        assert_eq!(user.extra["scope"], vec!["read".to_owned()]);
    }

    #[tokio::test]
    async fn disjoint_audiences_are_rejected() {
        let provider = provider(Scripted::new(Ok(authenticated(&["b"]))), &["a"]);

        let err = provider.authenticate(&bearer("t")).await.unwrap_err();
        assert_eq!(err, AuthError::unauthenticated(WRONG_AUDIENCE));
    }

    #[tokio::test]
    async fn overlapping_audiences_are_accepted() {
        let provider = provider(Scripted::new(Ok(authenticated(&["b", "a"]))), &["a", "c"]);

        assert!(provider.authenticate(&bearer("t")).await.is_ok());
    }

    #[tokio::test]
    async fn unauthenticated_review_surfaces_oracle_message() {
        let status = TokenReviewStatus {
            error: "token expired".to_owned(),
            ..TokenReviewStatus::default()
        };
        let provider = provider(Scripted::new(Ok(status)), &[]);

        let err = provider.authenticate(&bearer("t")).await.unwrap_err();
        assert_eq!(err, AuthError::unauthenticated("token expired"));
    }

    #[tokio::test]
    async fn oracle_failure_is_internal() {
        let provider = provider(Scripted::new(Err("connection refused".to_owned())), &[]);

        let err = provider.authenticate(&bearer("t")).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn missing_bearer_skips_the_oracle() {
        let reviewer = Scripted::new(Ok(authenticated(&[])));
        let provider = provider(Arc::clone(&reviewer), &[]);

        let err = provider.authenticate(&CallContext::default()).await.unwrap_err();
        assert!(err.is_unauthenticated());
        assert!(reviewer.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn init_parses_comma_separated_audiences() {
        let provider = TokenProvider::new(Scripted::new(Ok(authenticated(&[]))));
        let matches = provider
            .add_flags(Command::new("test"))
            .try_get_matches_from(["test", "--token-api-audiences", "a,b", "--token-api-audiences", "c"])
            .unwrap();

        provider.init(&matches).await.unwrap();
        assert_eq!(
            provider.options.get().unwrap().audiences,
            BTreeSet::from(["a".to_owned(), "b".to_owned(), "c".to_owned()])
        );
    }
}
