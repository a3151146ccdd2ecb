//! The Lamp parser boundary.
//!
//! The grammar lives in `lamp.pest` and is compiled by the pest parser
//! generator; this crate only runs it and lowers the resulting parse tree
//! into the `lamp-types` syntax tree. Parse failures come back as
//! [`ErrorKind::Syntax`] carrying pest's rendered diagnostic (expected-token
//! set, line and column).

use lamp_types::{ErrorKind, LampError, LampResult, Program};
use pest::Parser;
use pest_derive::Parser;

mod lower;

#[derive(Parser)]
#[grammar = "lamp.pest"]
struct LampParser;

/// Parse one source unit into a [`Program`].
///
/// `file` is the identity attached to any syntax error — the script path,
/// the import path, or the REPL session name.
pub fn parse(source: &str, file: &str) -> LampResult<Program> {
    let mut pairs = LampParser::parse(Rule::program, source)
        .map_err(|e| LampError::new(ErrorKind::Syntax(e.to_string()), file))?;
    let program = pairs
        .next()
        .expect("a successful parse yields a program node");
    lower::program(program, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_an_empty_program() {
        let program = parse("", "test.lmp").unwrap();
        assert!(program.stmts.is_empty());
    }

    #[test]
    fn syntax_error_reports_location() {
        let err = parse("1 +", "test.lmp").unwrap_err();
        assert_eq!(err.file, "test.lmp");
        match err.kind {
            ErrorKind::Syntax(msg) => assert!(msg.contains("1:"), "missing location: {msg}"),
            other => panic!("expected Syntax, got {other:?}"),
        }
    }
}
