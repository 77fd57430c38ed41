//! Handler resolution.
//!
//! The chain builder only knows route ids such as `"auth"` or
//! `"show_user"`. A [`Resolver`] turns those ids into invokable
//! [`Middleware`] instances. [`HandlerRegistry`] is the bundled
//! implementation: a map from id to either a shared instance or a factory
//! that produces a fresh instance for every request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::DispatchError;
use crate::middleware::Middleware;

/// Maps opaque handler ids to invokable handlers.
pub trait Resolver: Send + Sync {
    /// Resolve `id`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnresolvedHandler`] if `id` is unknown.
    fn resolve(&self, id: &str) -> Result<Arc<dyn Middleware>, DispatchError>;
}

type Factory = Box<dyn Fn() -> Arc<dyn Middleware> + Send + Sync>;

enum Provider {
    /// One instance for every request; must not hold request data
    Shared(Arc<dyn Middleware>),
    /// A new instance per resolution
    Factory(Factory),
}

/// In-memory resolver populated at startup.
#[derive(Default)]
pub struct HandlerRegistry {
    providers: HashMap<String, Provider>,
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, id: &str, provider: Provider) {
        if self.providers.insert(id.to_string(), provider).is_some() {
            warn!(handler_id = %id, "Replaced existing handler registration");
        } else {
            info!(
                handler_id = %id,
                total_handlers = self.providers.len(),
                "Handler registered"
            );
        }
    }

    /// Register one instance shared by every request.
    pub fn register_shared(&mut self, id: &str, handler: Arc<dyn Middleware>) {
        self.insert(id, Provider::Shared(handler));
    }

    /// Register a value as a shared instance.
    pub fn register<M>(&mut self, id: &str, handler: M)
    where
        M: Middleware + 'static,
    {
        self.register_shared(id, Arc::new(handler));
    }

    /// Register a factory called on every resolution, for handlers that keep
    /// per-request state.
    pub fn register_factory<F, M>(&mut self, id: &str, factory: F)
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        self.insert(
            id,
            Provider::Factory(Box::new(move || Arc::new(factory()) as Arc<dyn Middleware>)),
        );
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Resolver for HandlerRegistry {
    fn resolve(&self, id: &str) -> Result<Arc<dyn Middleware>, DispatchError> {
        match self.providers.get(id) {
            Some(Provider::Shared(handler)) => Ok(Arc::clone(handler)),
            Some(Provider::Factory(factory)) => Ok(factory()),
            None => Err(DispatchError::UnresolvedHandler { id: id.to_string() }),
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
