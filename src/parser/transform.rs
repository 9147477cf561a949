//! Named value transforms applied after field extraction
//!
//! A transform is a plain `fn(&str) -> String` registered under a name.
//! Site definitions refer to transforms by name; configuration validation
//! rejects names that are not registered.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::utils::{normalize_whitespace, strip_query};

/// Signature of a value transform
pub type TransformFn = fn(&str) -> String;

lazy_static! {
    static ref BUILTIN: TransformRegistry = TransformRegistry::with_builtins();
}

/// Table of named transforms
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in transforms
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("trim", |v| v.trim().to_string());
        registry.register("lowercase", |v| v.to_lowercase());
        registry.register("uppercase", |v| v.to_uppercase());
        registry.register("collapse_whitespace", normalize_whitespace);
        registry.register("digits", |v| v.chars().filter(char::is_ascii_digit).collect());
        registry.register("strip_query", strip_query);
        registry
    }

    /// Shared registry of built-in transforms
    pub fn builtin() -> &'static TransformRegistry {
        &BUILTIN
    }

    /// Register or replace a transform
    pub fn register(&mut self, name: impl Into<String>, transform: TransformFn) {
        self.transforms.insert(name.into(), transform);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Apply a transform by name; unregistered names pass the value through.
    pub fn apply(&self, name: &str, value: String) -> String {
        match self.transforms.get(name) {
            Some(transform) => transform(&value),
            None => {
                tracing::debug!(transform = name, "Unregistered transform, value unchanged");
                value
            }
        }
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.names())
            .finish()
    }
}
