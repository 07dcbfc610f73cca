use super::sandbox::SandboxPolicy;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A single lexical scope: its own bindings plus an optional parent and policy.
struct Scope<T> {
    bindings: RwLock<IndexMap<String, T>>,
    parent: Option<Environment<T>>,
    policy: Option<Arc<dyn SandboxPolicy>>,
}

/// Chained scopes mapping names to values (in the evaluator) or types (in the checker).
///
/// Cloning an `Environment` clones the handle, not the bindings. Children hold
/// their parent; parents never reference children. Writes only ever touch the
/// scope they are made on, so a spawned task writing into its own child scope
/// never mutates an ancestor.
pub struct Environment<T> {
    scope: Arc<Scope<T>>,
}

/// Returned when a sandbox policy along the chain forbids a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub name: String,
}

impl<T> Clone for Environment<T> {
    fn clone(&self) -> Self {
        Self {
            scope: Arc::clone(&self.scope),
        }
    }
}

impl<T: Clone> Environment<T> {
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// A root scope guarded by a sandbox policy.
    pub fn with_policy(policy: Arc<dyn SandboxPolicy>) -> Self {
        Self::build(None, Some(policy))
    }

    fn build(parent: Option<Environment<T>>, policy: Option<Arc<dyn SandboxPolicy>>) -> Self {
        Self {
            scope: Arc::new(Scope {
                bindings: RwLock::new(IndexMap::new()),
                parent,
                policy,
            }),
        }
    }

    /// Opens a fresh child scope whose parent is `self`.
    pub fn child(&self) -> Self {
        Self::build(Some(self.clone()), None)
    }

    /// A child scope carrying its own policy in addition to any inherited ones.
    pub fn child_with_policy(&self, policy: Arc<dyn SandboxPolicy>) -> Self {
        Self::build(Some(self.clone()), Some(policy))
    }

    pub fn parent(&self) -> Option<&Environment<T>> {
        self.scope.parent.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, T>> {
        self.scope.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, T>> {
        self.scope.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks a name up, walking outward from this scope to the root.
    pub fn get(&self, name: &str) -> Option<T> {
        let mut env = Some(self);
        while let Some(current) = env {
            if let Some(value) = current.read().get(name) {
                return Some(value.clone());
            }
            env = current.parent();
        }
        None
    }

    pub fn get_local(&self, name: &str) -> Option<T> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether any policy attached along the chain restricts `name`.
    pub fn is_restricted(&self, name: &str) -> bool {
        let mut env = Some(self);
        while let Some(current) = env {
            if let Some(policy) = &current.scope.policy {
                if policy.is_restricted(name) {
                    return true;
                }
            }
            env = current.parent();
        }
        false
    }

    /// Writes into this scope without consulting any policy. Used for seeding.
    pub fn set(&self, name: impl Into<String>, value: T) {
        self.write().insert(name.into(), value);
    }

    /// Writes into this scope after checking every policy along the chain.
    pub fn define(&self, name: &str, value: T) -> Result<(), AccessDenied> {
        if self.is_restricted(name) {
            return Err(AccessDenied {
                name: name.to_string(),
            });
        }
        self.set(name, value);
        Ok(())
    }

    /// Names bound directly in this scope, in insertion order.
    pub fn local_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of scopes between this one and the root, inclusive.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut env = self.parent();
        while let Some(current) = env {
            depth += 1;
            env = current.parent();
        }
        depth
    }
}

impl<T: Clone> Default for Environment<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> fmt::Debug for Environment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .field("names", &self.local_names())
            .field("sandboxed", &self.scope.policy.is_some())
            .finish()
    }
}
