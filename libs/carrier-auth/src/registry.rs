use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use clap::Command;

use crate::error::RegistryError;
use crate::provider::AuthProvider;

/// Name-keyed set of the providers this process knows about.
///
/// Built once at startup and read-only afterwards; cloning shares the same
/// providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<BTreeMap<&'static str, Arc<dyn AuthProvider>>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Look up a provider by its mode name.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn AuthProvider>, RegistryError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }

    /// Fold every provider's flags into `cmd`.
    #[must_use]
    pub fn add_flags(&self, cmd: Command) -> Command {
        self.providers
            .values()
            .fold(cmd, |cmd, provider| provider.add_flags(cmd))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: BTreeMap<&'static str, Arc<dyn AuthProvider>>,
}

impl ProviderRegistryBuilder {
    /// Add a provider under its own name.
    ///
    /// # Errors
    /// Returns [`RegistryError::Duplicate`] if the name is already taken.
    pub fn register(mut self, provider: Arc<dyn AuthProvider>) -> Result<Self, RegistryError> {
        let name = provider.name();
        if self.providers.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_owned()));
        }
        self.providers.insert(name, provider);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: Arc::new(self.providers),
        }
    }
}
