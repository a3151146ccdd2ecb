//! The struct registry: declared struct types.
//!
//! Struct types stay file-local — the import mechanism merges function
//! records only.

use crate::value::StructType;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct StructRegistry {
    types: Vec<Rc<StructType>>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, namespace: String, name: String, members: Vec<String>) {
        self.types.push(Rc::new(StructType {
            namespace,
            name,
            members,
        }));
    }

    /// Exact `(namespace, name)` lookup, newest declaration first.
    pub fn resolve(&self, namespace: &str, name: &str) -> Option<Rc<StructType>> {
        self.types
            .iter()
            .rev()
            .find(|t| t.namespace == namespace && t.name == name)
            .cloned()
    }
}
