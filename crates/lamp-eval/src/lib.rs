//! The Lamp tree-walking evaluator.
//!
//! Executes parsed programs against one `(Environment, FunctionRegistry,
//! StructRegistry)` triple per module or session. Imports run nested,
//! disposable evaluators and fold their function records back into the
//! caller; foreign calls cross into an embedded language runtime through
//! the provider interface in [`foreign`].

pub mod env;
pub mod evaluator;
pub mod foreign;
pub mod functions;
pub mod modules;
pub mod structs;
pub mod value;

pub use env::Environment;
pub use evaluator::Evaluator;
pub use foreign::{provider_for, ForeignProvider};
pub use functions::{FunctionBody, FunctionRecord, FunctionRegistry};
pub use structs::StructRegistry;
pub use value::{StructInstance, StructType, Value};

pub use lamp_types::{ErrorKind, LampError, LampResult};
