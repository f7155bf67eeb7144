//! The published environment snapshot.

use crate::builder::EnvironmentBuilder;
use crate::environment::Environment;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use structura_types::Result;
use tracing::{info, warn};

/// Holds the current [`Environment`] and swaps in replacements.
///
/// Readers take a cheap `Arc` handle with [`snapshot`](Self::snapshot) and
/// keep it as long as they like. Updates are serialized; a reader never
/// sees a half-applied change.
#[derive(Debug)]
pub struct EnvironmentCache {
    current: RwLock<Arc<Environment>>,
    writer: Mutex<()>,
}

impl Default for EnvironmentCache {
    fn default() -> Self {
        Self::new(Environment::empty())
    }
}

impl EnvironmentCache {
    #[must_use]
    pub fn new(initial: Environment) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            writer: Mutex::new(()),
        }
    }

    /// The currently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Environment> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    /// Publishes `env` as the current snapshot.
    ///
    /// The version never goes backwards: an older snapshot is republished
    /// with the next version number.
    pub fn publish(&self, env: Environment) -> Arc<Environment> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap(env)
    }

    fn swap(&self, mut env: Environment) -> Arc<Environment> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if env.version <= current.version() {
            env.version = current.version() + 1;
        }
        let env = Arc::new(env);
        *current = Arc::clone(&env);
        info!(version = env.version(), "Environment published");
        env
    }

    /// Applies `change` to a builder opened from the current snapshot and
    /// publishes the result.
    ///
    /// If `change` or the build fails, the current snapshot stays in place
    /// and the error is returned.
    pub fn update<F>(&self, change: F) -> Result<Arc<Environment>>
    where
        F: FnOnce(&mut EnvironmentBuilder) -> Result<()>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.snapshot();
        let mut builder = base.to_builder();
        let built = change(&mut builder).and_then(|()| builder.build());
        match built {
            Ok(env) => Ok(self.swap(env)),
            Err(e) => {
                warn!(version = base.version(), "Environment update rejected: {}", e);
                Err(e)
            }
        }
    }
}
