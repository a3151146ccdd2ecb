//! Shared types for the Lamp interpreter.
//!
//! This crate holds everything both sides of the parser boundary agree on:
//! the syntax tree (`ast`) produced by `lamp-parser` and consumed by
//! `lamp-eval`, and the typed error model (`error`) every crate reports
//! through.

pub mod ast;
pub mod error;

pub use ast::{BinOp, CmpOp, Expr, Program, Stmt};
pub use error::{ErrorKind, LampError, LampResult};
