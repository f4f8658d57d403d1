//! Domain models for authorization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operation a caller wants to perform on a resource.
///
/// Deserialization accepts any letter case; serialization is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Verb {
    Get,
    List,
    Watch,
    Create,
    Delete,
}

impl Verb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Watch => "watch",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown verb: {0}")]
pub struct ParseVerbError(pub String);

impl FromStr for Verb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "list" => Ok(Self::List),
            "watch" => Ok(Self::Watch),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            _ => Err(ParseVerbError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Verb {
    type Error = ParseVerbError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// What a handler asks to be authorized for. Built per call and consumed
/// by a single authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationOption {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub verb: Verb,
}

impl AuthorizationOption {
    #[must_use]
    pub fn new(verb: Verb) -> Self {
        Self {
            name: None,
            namespace: None,
            verb,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Group, version and plural resource name of an API type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn new(group: impl Into<String>, version: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }
}

/// Question put to the access review oracle: may this user perform `verb`
/// on this resource?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReviewRequest {
    pub resource: ResourceDescriptor,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub verb: Verb,
    pub user: String,
    pub groups: Vec<String>,
    pub uid: String,
    pub extra: BTreeMap<String, Vec<String>>,
}

/// The oracle's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessReviewStatus {
    pub allowed: bool,
    pub denied: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
    NoOpinion,
}

impl AccessReviewStatus {
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            ..Self::default()
        }
    }

    /// An explicit deny wins over an allow.
    #[must_use]
    pub fn decision(&self) -> Decision {
        if self.denied {
            Decision::Denied
        } else if self.allowed {
            Decision::Allowed
        } else {
            Decision::NoOpinion
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn verbs_round_trip_through_strings() {
        for verb in [Verb::Get, Verb::List, Verb::Watch, Verb::Create, Verb::Delete] {
            assert_eq!(verb.to_string().parse::<Verb>(), Ok(verb));
        }
        assert_eq!("LIST".parse::<Verb>(), Ok(Verb::List));
        assert!("update".parse::<Verb>().is_err());
        assert_eq!(serde_json::to_string(&Verb::Watch).unwrap(), "\"watch\"");
    }

    #[test]
    fn verbs_deserialize_in_any_case() {
        for raw in ["\"list\"", "\"LIST\"", "\"List\""] {
            assert_eq!(serde_json::from_str::<Verb>(raw).unwrap(), Verb::List, "{raw}");
        }
        let err = serde_json::from_str::<Verb>("\"patch\"").unwrap_err();
        assert!(err.to_string().contains("unknown verb: patch"), "{err}");
    }

    #[test]
    fn deny_wins_then_allow_then_no_opinion() {
        let both = AccessReviewStatus {
            allowed: true,
            denied: true,
            ..AccessReviewStatus::default()
        };
        assert_eq!(both.decision(), Decision::Denied);
        assert_eq!(AccessReviewStatus::allowed().decision(), Decision::Allowed);
        assert_eq!(AccessReviewStatus::default().decision(), Decision::NoOpinion);
    }

    #[test]
    fn option_builder_sets_scope() {
        let option = AuthorizationOption::new(Verb::Get).namespace("acme").name("small");
        assert_eq!(option.namespace.as_deref(), Some("acme"));
        assert_eq!(option.name.as_deref(), Some("small"));
        assert_eq!(option.verb, Verb::Get);
    }
}
