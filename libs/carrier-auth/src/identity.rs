use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What a provider reports about the caller it authenticated.
///
/// This is plain data. It becomes an [`Identity`] only when the chain accepts
/// it, which is the single place identities are created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, Vec<String>>,
}

impl UserInfo {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.extra.insert(key.into(), values);
        self
    }
}

/// The authenticated principal of a call.
///
/// Immutable and only obtainable from a [`crate::CallContext`] that went
/// through the [`crate::AuthChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    uid: String,
    groups: Vec<String>,
    extra: BTreeMap<String, Vec<String>>,
}

impl Identity {
    /// Groups keep the provider's order; repeats are dropped.
    pub(crate) fn from_user_info(info: UserInfo) -> Self {
        let mut groups: Vec<String> = Vec::with_capacity(info.groups.len());
        for group in info.groups {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        Self {
            name: info.name,
            uid: info.uid,
            groups,
            extra: info.extra,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[must_use]
    pub fn extra(&self) -> &BTreeMap<String, Vec<String>> {
        &self.extra
    }
}
