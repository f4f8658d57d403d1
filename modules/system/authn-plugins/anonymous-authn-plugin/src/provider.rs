use async_trait::async_trait;
use carrier_auth::{AuthError, AuthProvider, CallContext, InitError, UserInfo};
use clap::ArgMatches;

pub const ANONYMOUS_USER: &str = "system:anonymous";
pub const ANONYMOUS_GROUP: &str = "system:unauthenticated";

#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousProvider;

#[async_trait]
impl AuthProvider for AnonymousProvider {
    fn name(&self) -> &'static str {
        "Anonymous"
    }

    async fn init(&self, _flags: &ArgMatches) -> Result<(), InitError> {
        Ok(())
    }

    async fn authenticate(&self, _ctx: &CallContext) -> Result<UserInfo, AuthError> {
        Ok(UserInfo::new(ANONYMOUS_USER).with_groups([ANONYMOUS_GROUP]))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use carrier_auth::AuthChain;
    use http::{HeaderMap, HeaderValue, header};

    use super::*;

    #[tokio::test]
    async fn anonymous_alone_always_authenticates() {
        let chain = AuthChain::new(vec![Arc::new(AnonymousProvider) as Arc<dyn AuthProvider>]).unwrap();

        let mut with_garbage = HeaderMap::new();
        with_garbage.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"));

        for headers in [HeaderMap::new(), with_garbage] {
            let ctx = chain.authenticate(CallContext::new(headers)).await.unwrap();
            let identity = ctx.extract_identity().unwrap();
            assert_eq!(identity.name(), ANONYMOUS_USER);
            assert_eq!(identity.groups(), &[ANONYMOUS_GROUP]);
            assert!(identity.uid().is_empty());
        }
    }
}
