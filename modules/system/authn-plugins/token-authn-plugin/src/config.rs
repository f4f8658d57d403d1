//! Command line options for the token provider.

use std::collections::BTreeSet;

use clap::Args;

#[derive(Debug, Clone, Default, Args)]
pub struct TokenArgs {
    /// Identifiers of this API. Tokens must be bound to at least one of them.
    /// Repeatable or comma separated; empty accepts any audience.
    #[arg(long = "token-api-audiences", value_delimiter = ',')]
    pub token_api_audiences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOptions {
    pub audiences: BTreeSet<String>,
}

impl TokenOptions {
    #[must_use]
    pub fn with_audiences<I, S>(audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            audiences: audiences.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TokenArgs> for TokenOptions {
    fn from(args: TokenArgs) -> Self {
        Self::with_audiences(
            args.token_api_audiences
                .into_iter()
                .map(|a| a.trim().to_owned())
                .filter(|a| !a.is_empty()),
        )
    }
}
