//! The `lamp` command.
//!
//! With a file argument it runs the script; without one it opens an
//! interactive session. `--repl TEXT` evaluates a single expression
//! non-interactively and prints its value. Typed failures are formatted as
//! `On file: ... / ERROR (...)` reports and exit 1; `--error` disables the
//! formatter and re-raises the failure raw.

use clap::Parser;
use lamp_eval::Evaluator;
use lamp_types::{ErrorKind, LampError};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

/// Lamp is a small dynamically-typed scripting language built around a
/// tree-walking evaluator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script file to execute. Omit it to start an interactive session.
    file: Option<PathBuf>,

    /// Evaluate one expression, print its value, and exit.
    #[arg(short, long, value_name = "TEXT")]
    repl: Option<String>,

    /// Disable the friendly error formatter and propagate failures raw.
    #[arg(short, long)]
    error: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if args.error {
                panic!("{err:?}");
            }
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(text) = &args.repl {
        return eval_once(text);
    }
    match &args.file {
        Some(path) => run_script(path),
        None => run_session(),
    }
}

/// `--repl TEXT`: one non-interactive evaluation, last value printed.
fn eval_once(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut evaluator = Evaluator::new("repl", "repl", false);
    let program = lamp_parser::parse(text, evaluator.file())?;
    let value = evaluator.run(&program)?;
    if !value.is_null() {
        println!("{value}");
    }
    Ok(())
}

fn run_script(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let display = path.display().to_string();
    let source = fs::read_to_string(path)
        .map_err(|_| LampError::new(ErrorKind::MissingFile(display.clone()), display))?;
    let mut evaluator = Evaluator::for_script(path);
    let program = lamp_parser::parse(&source, evaluator.file())?;
    evaluator.run(&program)?;
    Ok(())
}

/// The interactive session: one shared evaluator for all lines; any typed
/// failure aborts the whole process.
fn run_session() -> Result<(), Box<dyn std::error::Error>> {
    let mut editor = DefaultEditor::new()?;
    let mut evaluator = Evaluator::interactive_session();
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                let program = lamp_parser::parse(&line, evaluator.file())?;
                let value = evaluator.run(&program)?;
                if !value.is_null() {
                    println!("{value}");
                }
            }
            // End of input terminates the session cleanly.
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
