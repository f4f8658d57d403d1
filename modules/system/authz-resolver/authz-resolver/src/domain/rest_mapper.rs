//! Static type tag to API resource mapping.

use std::collections::HashMap;

use authz_resolver_sdk::{ResourceDescriptor, RestMapper};

use crate::config::RestMappingConfig;

const LIST_SUFFIX: &str = "List";

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("quiz", "quizzes"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "metadata",
    "equipment",
    "information",
    "money",
    "news",
    "series",
    "species",
    "sheep",
    "fish",
    "deer",
];

/// English plural of a lower-cased kind, following the usual API naming.
///
/// Irregular and uncountable nouns are matched as whole words only; set
/// `resource` explicitly for compound kinds ending in one of them.
#[must_use]
pub fn pluralize(singular: &str) -> String {
    if UNCOUNTABLE.iter().any(|word| *word == singular) {
        return singular.to_owned();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(one, _)| *one == singular) {
        return (*plural).to_owned();
    }
    if let Some(stem) = singular.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{stem}ies");
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| singular.ends_with(end)) {
        return format!("{singular}es");
    }
    format!("{singular}s")
}

/// Mapping table built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticRestMapper {
    kinds: HashMap<String, ResourceDescriptor>,
}

impl StaticRestMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, kind: impl Into<String>, descriptor: ResourceDescriptor) -> Self {
        self.kinds.insert(kind.into(), descriptor);
        self
    }

    #[must_use]
    pub fn from_config(mappings: &[RestMappingConfig]) -> Self {
        let kinds = mappings
            .iter()
            .map(|m| {
                let resource = m
                    .resource
                    .clone()
                    .unwrap_or_else(|| pluralize(&m.kind.to_lowercase()));
                (
                    m.kind.clone(),
                    ResourceDescriptor::new(m.group.clone(), m.version.clone(), resource),
                )
            })
            .collect();
        Self { kinds }
    }
}

impl RestMapper for StaticRestMapper {
    /// Looks up `type_tag`; a `FooList` tag resolves like `Foo`.
    fn resolve(&self, type_tag: &str) -> Option<ResourceDescriptor> {
        self.kinds
            .get(type_tag)
            .or_else(|| {
                type_tag
                    .strip_suffix(LIST_SUFFIX)
                    .and_then(|kind| self.kinds.get(kind))
            })
            .cloned()
    }
}
