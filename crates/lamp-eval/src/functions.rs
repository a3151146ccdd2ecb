//! The function registry: declared callables and their lookup rules.

use lamp_types::ast::Stmt;

/// What a function record executes: a native statement body, or a foreign
/// descriptor naming the language runtime and the module that exports the
/// callable.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Native(Vec<Stmt>),
    Foreign {
        language: String,
        module_path: String,
    },
}

/// One declared callable.
///
/// `module` is the declaring module path; an unfiltered import overwrites it
/// with the resolved module identity so later reloads resolve against the
/// right file.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub namespace: String,
    pub name: String,
    pub params: Vec<String>,
    pub body: FunctionBody,
    pub module: String,
}

/// Append-only list of function records.
///
/// Records are never deduplicated — re-importing a module grows the
/// registry — and lookups scan newest-first so a redeclaration shadows.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    records: Vec<FunctionRecord>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FunctionRecord) {
        self.records.push(record);
    }

    /// Exact `(namespace, name)` lookup. Unqualified call sites pass the
    /// caller's own file identity as the namespace.
    pub fn resolve(&self, namespace: &str, name: &str) -> Option<&FunctionRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.namespace == namespace && r.name == name)
    }

    pub fn append(&mut self, records: impl IntoIterator<Item = FunctionRecord>) {
        self.records.extend(records);
    }

    pub fn into_records(self) -> Vec<FunctionRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.records.iter()
    }
}
