use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;

use log::debug;

use crate::data::Dataset;

/// Maps a live dataset to the name used when labelling its charts.
pub trait DataframeRegistry {
    fn get_or_register_varname(&mut self, df: &Arc<Dataset>) -> String;
}

/// Name → live dataset lookup provided by the host environment.
pub trait Namespace {
    fn get(&self, name: &str) -> Option<Arc<Dataset>>;
}

impl<S: BuildHasher> Namespace for HashMap<String, Arc<Dataset>, S> {
    fn get(&self, name: &str) -> Option<Arc<Dataset>> {
        HashMap::get(self, name).cloned()
    }
}

// ---------------------------------------------------------------------------
// VarnameRegistry – namespace-backed naming
// ---------------------------------------------------------------------------

/// Names datasets after the namespace variable that holds them, registering
/// unknown datasets under `_df_<n>`.
///
/// Lookup is by identity, not by content: two equal datasets behind different
/// `Arc`s get different names.
#[derive(Debug, Default)]
pub struct VarnameRegistry {
    namespace: HashMap<String, Arc<Dataset>>,
    next_id: usize,
}

impl VarnameRegistry {
    pub fn new(namespace: HashMap<String, Arc<Dataset>>) -> Self {
        Self {
            namespace,
            next_id: 0,
        }
    }

    /// Bind `name` to `df`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, df: Arc<Dataset>) {
        self.namespace.insert(name.into(), df);
    }

    pub fn len(&self) -> usize {
        self.namespace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl DataframeRegistry for VarnameRegistry {
    fn get_or_register_varname(&mut self, df: &Arc<Dataset>) -> String {
        // Several names may alias one dataset; pick the smallest for stable labels.
        let existing = self
            .namespace
            .iter()
            .filter(|(_, bound)| Arc::ptr_eq(bound, df))
            .map(|(name, _)| name)
            .min();
        if let Some(name) = existing {
            return name.clone();
        }

        loop {
            let name = format!("_df_{}", self.next_id);
            self.next_id += 1;
            if !self.namespace.contains_key(&name) {
                debug!("registered dataset as '{name}'");
                self.namespace.insert(name.clone(), Arc::clone(df));
                return name;
            }
        }
    }
}

impl Namespace for VarnameRegistry {
    fn get(&self, name: &str) -> Option<Arc<Dataset>> {
        self.namespace.get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// FixedDataframeRegistry
// ---------------------------------------------------------------------------

/// Labels every dataset with one fixed name.
#[derive(Debug, Clone)]
pub struct FixedDataframeRegistry {
    name: String,
}

impl FixedDataframeRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DataframeRegistry for FixedDataframeRegistry {
    fn get_or_register_varname(&mut self, _df: &Arc<Dataset>) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_datasets_keep_their_variable_name() {
        let df = Arc::new(Dataset::default());
        let mut registry = VarnameRegistry::default();
        registry.insert("sales", Arc::clone(&df));
        assert_eq!(registry.get_or_register_varname(&df), "sales");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_datasets_are_registered_once() {
        let first = Arc::new(Dataset::default());
        let second = Arc::new(Dataset::default());
        let mut registry = VarnameRegistry::default();
        registry.insert("_df_0", Arc::new(Dataset::default()));

        assert_eq!(registry.get_or_register_varname(&first), "_df_1");
        assert_eq!(registry.get_or_register_varname(&first), "_df_1");
        assert_eq!(registry.get_or_register_varname(&second), "_df_2");
        assert!(registry.get("_df_1").is_some_and(|df| Arc::ptr_eq(&df, &first)));
    }

    #[test]
    fn fixed_registry_ignores_the_dataset() {
        let mut registry = FixedDataframeRegistry::new("df");
        assert_eq!(registry.get_or_register_varname(&Arc::new(Dataset::default())), "df");
    }
}
