//! Endpoint registry: the concurrency-safe store of mock endpoint definitions.
//!
//! Owns the canonical copy of every definition. Callers always receive
//! clones, never references into the store.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors returned by registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The definition is malformed or violates a constraint.
    #[error("invalid definition: {0}")]
    Validation(String),

    /// Another live definition already claims this path.
    #[error("path {0:?} is already registered")]
    DuplicatePath(String),

    /// No live definition with this id.
    #[error("no endpoint with id {0}")]
    NotFound(u64),
}

/// A single virtual endpoint: a path plus the canned response to serve for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDefinition {
    /// Assigned by the registry on creation; ignored on input.
    #[serde(default)]
    pub id: u64,

    /// Request path to answer. Exact, case-sensitive match.
    pub path: String,

    /// Lower bound of the artificial delay, in milliseconds.
    #[serde(default)]
    pub delay_min_ms: u64,

    /// Upper bound of the artificial delay. Equal to the minimum for a
    /// fixed delay; greater for a uniform draw from `[min, max)`.
    #[serde(default)]
    pub delay_max_ms: u64,

    /// HTTP status code to return.
    pub return_code: u16,

    /// Response body, emitted verbatim. Empty means no payload.
    #[serde(default)]
    pub return_body: String,

    /// Response headers, applied verbatim over any defaults.
    #[serde(default)]
    pub return_headers: HashMap<String, Vec<String>>,
}

impl EndpointDefinition {
    /// Validate the definition against the registry's acceptance rules.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.path.is_empty() {
            return Err(RegistryError::Validation("path cannot be empty".into()));
        }
        if !self.path.starts_with('/') {
            return Err(RegistryError::Validation(format!(
                "path {:?} must begin with '/'",
                self.path
            )));
        }
        if self.delay_max_ms < self.delay_min_ms {
            return Err(RegistryError::Validation(format!(
                "delayMaxMs ({}) must be >= delayMinMs ({})",
                self.delay_max_ms, self.delay_min_ms
            )));
        }
        if !(100..=599).contains(&self.return_code) {
            return Err(RegistryError::Validation(format!(
                "invalid status code: {}",
                self.return_code
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Inner {
    /// Live definitions keyed by id. Ids are monotonic, so iteration
    /// order equals insertion order.
    endpoints: BTreeMap<u64, EndpointDefinition>,
    /// Path index for exact-match lookup.
    by_path: HashMap<String, u64>,
    /// Last id handed out. Never decremented, so ids are never reused.
    last_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Concurrency-safe CRUD store of endpoint definitions.
///
/// Cheap to clone; all clones share the same underlying store. Mutations
/// take the write lock for the whole check-then-act sequence, so the path
/// index and the definition map are never observed out of sync.
#[derive(Clone, Default)]
pub struct EndpointRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new definition, assigning it a fresh id.
    pub async fn add(
        &self,
        mut def: EndpointDefinition,
    ) -> Result<EndpointDefinition, RegistryError> {
        def.validate()?;
        let mut inner = self.inner.write().await;
        if inner.by_path.contains_key(&def.path) {
            return Err(RegistryError::DuplicatePath(def.path));
        }
        def.id = inner.next_id();
        inner.by_path.insert(def.path.clone(), def.id);
        inner.endpoints.insert(def.id, def.clone());
        Ok(def)
    }

    /// Replace the definition stored under `id`, preserving the id.
    ///
    /// The path may change, but must not collide with any other live
    /// definition.
    pub async fn update(
        &self,
        id: u64,
        mut def: EndpointDefinition,
    ) -> Result<EndpointDefinition, RegistryError> {
        def.validate()?;
        let mut inner = self.inner.write().await;
        let old_path = match inner.endpoints.get(&id) {
            Some(existing) => existing.path.clone(),
            None => return Err(RegistryError::NotFound(id)),
        };
        if let Some(&holder) = inner.by_path.get(&def.path) {
            if holder != id {
                return Err(RegistryError::DuplicatePath(def.path));
            }
        }
        inner.by_path.remove(&old_path);
        def.id = id;
        inner.by_path.insert(def.path.clone(), id);
        inner.endpoints.insert(id, def.clone());
        Ok(def)
    }

    /// Remove the definition stored under `id`. The id is never handed
    /// out again.
    pub async fn delete(&self, id: u64) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().await;
        match inner.endpoints.remove(&id) {
            Some(removed) => {
                inner.by_path.remove(&removed.path);
                Ok(())
            }
            None => Err(RegistryError::NotFound(id)),
        }
    }

    /// Snapshot of all live definitions in insertion order.
    pub async fn list(&self) -> Vec<EndpointDefinition> {
        let inner = self.inner.read().await;
        inner.endpoints.values().cloned().collect()
    }

    /// Look up the definition registered for `path`, if any.
    ///
    /// A miss is a normal outcome, not an error.
    pub async fn get_by_path(&self, path: &str) -> Option<EndpointDefinition> {
        let inner = self.inner.read().await;
        let id = inner.by_path.get(path)?;
        inner.endpoints.get(id).cloned()
    }

    /// Number of live definitions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.endpoints.len()
    }

    /// Whether the registry holds no definitions.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
