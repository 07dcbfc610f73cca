//! Write restrictions consulted before a binding is committed.

use super::builtins::Builtins;
use indexmap::IndexSet;
use std::fmt;

/// Answers a single question: may `name` be written in this scope?
pub trait SandboxPolicy: Send + Sync {
    fn is_restricted(&self, name: &str) -> bool;
}

/// A policy that restricts a fixed set of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyList {
    names: IndexSet<String>,
}

impl DenyList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Protects every builtin name from being rebound.
    pub fn builtins(table: &Builtins) -> Self {
        Self::new(table.names())
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SandboxPolicy for DenyList {
    fn is_restricted(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl fmt::Display for DenyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "deny[{}]", names.join(", "))
    }
}
