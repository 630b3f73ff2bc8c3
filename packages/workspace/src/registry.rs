//! # Save Handler Registry
//!
//! Editor panels that keep state the document does not (pending uploads,
//! card ordering, rich-text drafts) publish a save handler under a fixed
//! name when they mount. The orchestrator looks handlers up by name when a
//! save runs.
//!
//! Registering returns a [`Registration`]. Dropping it (the panel unmounts)
//! removes the handler, unless a newer registration under the same name has
//! replaced it since. A handler can therefore never be called after its panel
//! is gone.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use folio_editor::Document;
use futures::future::BoxFuture;

use crate::errors::PersistenceError;

/// Persists whatever an editor panel currently holds
#[async_trait]
pub trait SaveHandler: Send + Sync {
    /// `document` is the freshest snapshot at the time of the call
    async fn save(&self, document: &Document) -> Result<(), PersistenceError>;
}

/// Adapter for closures returning boxed futures
pub struct FnHandler<F>(F);

/// Wrap a closure as a [`SaveHandler`]
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Document) -> BoxFuture<'static, Result<(), PersistenceError>> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> SaveHandler for FnHandler<F>
where
    F: Fn(Document) -> BoxFuture<'static, Result<(), PersistenceError>> + Send + Sync,
{
    async fn save(&self, document: &Document) -> Result<(), PersistenceError> {
        (self.0)(document.clone()).await
    }
}

struct Slot {
    token: u64,
    handler: Arc<dyn SaveHandler>,
}

#[derive(Default)]
struct RegistryInner {
    slots: HashMap<String, Slot>,
    next_token: u64,
}

/// Name-keyed table of save handlers, shared by cloning
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `handler` under `name`, replacing any earlier one
    pub fn register<H>(&self, name: impl Into<String>, handler: H) -> Registration
    where
        H: SaveHandler + 'static,
    {
        self.register_arc(name, Arc::new(handler))
    }

    pub fn register_arc(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn SaveHandler>,
    ) -> Registration {
        let name = name.into();
        let mut inner = lock(&self.inner);

        inner.next_token += 1;
        let token = inner.next_token;

        let previous = inner.slots.insert(name.clone(), Slot { token, handler });
        if previous.is_some() {
            tracing::debug!("[CallbackRegistry] replaced handler {}", name);
        } else {
            tracing::debug!("[CallbackRegistry] registered handler {}", name);
        }

        Registration {
            registry: Arc::downgrade(&self.inner),
            name,
            token,
            released: false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.inner).slots.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.inner).slots.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the handler registered under `name`; `None` if there is none
    pub async fn invoke(
        &self,
        name: &str,
        document: &Document,
    ) -> Option<Result<(), PersistenceError>> {
        let handler = self.lookup(name)?;
        Some(handler.save(document).await)
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn SaveHandler>> {
        lock(&self.inner)
            .slots
            .get(name)
            .map(|slot| Arc::clone(&slot.handler))
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Keeps a handler registered; dropping it unregisters
#[must_use = "dropping a Registration unregisters its handler"]
pub struct Registration {
    registry: Weak<Mutex<RegistryInner>>,
    name: String,
    token: u64,
    released: bool,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Still the handler the registry would call
    pub fn is_current(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let inner = lock(&inner);
        inner
            .slots
            .get(&self.name)
            .is_some_and(|slot| slot.token == self.token)
    }

    /// Unregister now rather than on drop
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut inner = lock(&inner);
        if inner
            .slots
            .get(&self.name)
            .is_some_and(|slot| slot.token == self.token)
        {
            inner.slots.remove(&self.name);
            tracing::debug!("[CallbackRegistry] released handler {}", self.name);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("token", &self.token)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
