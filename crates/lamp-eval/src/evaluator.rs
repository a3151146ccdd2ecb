//! The tree-walking evaluator.
//!
//! One `Evaluator` owns the `(Environment, FunctionRegistry, StructRegistry)`
//! triple for a single module, script, or REPL session. Evaluation is
//! strictly depth-first, left-to-right; argument evaluation order and print
//! ordering are user-observable. Nothing recovers internally — every failure
//! unwinds to the driver as a [`LampError`].

use crate::env::Environment;
use crate::foreign::provider_for;
use crate::functions::{FunctionBody, FunctionRecord, FunctionRegistry};
use crate::modules;
use crate::structs::StructRegistry;
use crate::value::{dict_insert, flatten, StructInstance, Value};
use lamp_types::ast::*;
use lamp_types::{ErrorKind, LampError, LampResult};
use std::fs;
use std::path::Path;

/// The evaluator engine for one module or session.
pub struct Evaluator {
    /// Flat variable table.
    pub env: Environment,
    /// Declared callables, including merged imports.
    pub functions: FunctionRegistry,
    /// Declared struct types (file-local, never merged).
    pub structs: StructRegistry,
    /// Current file identity: unqualified calls resolve against it and
    /// errors carry it.
    namespace: String,
    /// Display identity for error reports.
    file: String,
    /// REPL sessions print differently: `out` yields its value instead of
    /// printing, `for` auto-prints per iteration.
    interactive: bool,
}

impl Evaluator {
    pub fn new(namespace: impl Into<String>, file: impl Into<String>, interactive: bool) -> Self {
        Self {
            env: Environment::new(),
            functions: FunctionRegistry::new(),
            structs: StructRegistry::new(),
            namespace: namespace.into(),
            file: file.into(),
            interactive,
        }
    }

    /// Evaluator for a script file: namespace is the file stem, output goes
    /// to stdout.
    pub fn for_script(path: &Path) -> Self {
        let display = path.display().to_string();
        Self::new(modules::file_stem(&display), display, false)
    }

    /// The shared evaluator of an interactive session.
    pub fn interactive_session() -> Self {
        Self::new("repl", "repl", true)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Execute a program and return its last non-null statement value
    /// (`Null` when there is none). The driver decides whether to print it.
    pub fn run(&mut self, program: &Program) -> LampResult<Value> {
        let mut last = Value::Null;
        for stmt in &program.stmts {
            let value = self.eval_stmt(stmt)?;
            if !value.is_null() {
                last = value;
            }
        }
        Ok(last)
    }

    fn err(&self, kind: ErrorKind) -> LampError {
        LampError::new(kind, &self.file)
    }

    // ── Statements ────────────────────────────────────────────────────────

    fn eval_stmt(&mut self, stmt: &Stmt) -> LampResult<Value> {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr),
            Stmt::AssignVar { name, value } => self.eval_assign_var(name, value),
            Stmt::AssignStruct {
                target,
                member,
                value,
            } => self.eval_assign_struct(target, member, value),
            Stmt::IfBlock { cond, body } => self.eval_if_block(cond, body),
            Stmt::RepeatBlock { count, body } => self.eval_repeat_block(count, body),
            Stmt::ForBlock {
                var,
                iterable,
                body,
            } => self.eval_for_block(var, iterable, body),
            Stmt::FuncBlock { name, params, body } => {
                self.functions.push(FunctionRecord {
                    namespace: self.namespace.clone(),
                    name: name.clone(),
                    params: params.clone(),
                    body: FunctionBody::Native(body.clone()),
                    module: self.file.clone(),
                });
                Ok(Value::Null)
            }
            Stmt::StructBlock { name, members } => self.eval_struct_block(name, members),
            Stmt::Import { path, filter } => self.eval_import(path, filter.as_deref()),
            Stmt::MetaFunction {
                language,
                module,
                symbol,
            } => self.eval_meta_function(language, module, symbol),
        }
    }

    fn eval_assign_var(&mut self, name: &str, value: &Expr) -> LampResult<Value> {
        let value = self.eval_expr(value)?;
        self.env.set(name, value.clone());
        Ok(value)
    }

    fn eval_assign_struct(&mut self, target: &str, member: &str, value: &Expr) -> LampResult<Value> {
        let value = self.eval_expr(value)?;
        let current = self
            .env
            .get(target)
            .ok_or_else(|| self.err(ErrorKind::InvalidVariable(target.to_string())))?;
        let instance = match current {
            Value::Struct(instance) => instance.clone(),
            other => {
                let message = format!("cannot assign property {member} on {}", other.type_name());
                return Err(self.err(ErrorKind::TypeMismatch(message)));
            }
        };
        if !instance.set(member, value.clone()) {
            return Err(self.err(ErrorKind::InvalidProperty {
                member: member.to_string(),
                struct_id: instance.ty().identity(),
            }));
        }
        Ok(value)
    }

    fn eval_if_block(&mut self, cond: &Expr, body: &[Stmt]) -> LampResult<Value> {
        let cond = self.eval_expr(cond)?;
        // Only the boolean false value and the absence of a value skip the
        // body; numeric zero is truthy.
        if matches!(cond, Value::Bool(false) | Value::Null) {
            return Ok(Value::Null);
        }
        self.block_value(body)
    }

    fn eval_repeat_block(&mut self, count: &Expr, body: &[Stmt]) -> LampResult<Value> {
        // The count expression is evaluated exactly once.
        let count = match self.eval_expr(count)? {
            Value::Int(n) => n,
            Value::Float(f) if f.fract() == 0.0 => f as i64,
            other => {
                let message = format!("repeat count must be a whole number, not {}", other.type_name());
                return Err(self.err(ErrorKind::TypeMismatch(message)));
            }
        };
        for _ in 0..count.max(0) {
            let value = self.block_value(body)?;
            // This block auto-prints in every mode, unlike `out`.
            if !value.is_null() {
                println!("{value}");
            }
        }
        Ok(Value::Null)
    }

    fn eval_for_block(&mut self, var: &str, iterable: &Expr, body: &[Stmt]) -> LampResult<Value> {
        let items = match self.eval_expr(iterable)? {
            Value::List(items) => items,
            other => {
                let message = format!("for expects a list, not {}", other.type_name());
                return Err(self.err(ErrorKind::TypeMismatch(message)));
            }
        };
        for item in items {
            // Flat scope: the loop variable stays bound after the loop.
            self.env.set(var, item);
            let value = self.block_value(body)?;
            if self.interactive && !value.is_null() {
                println!("{value}");
            }
        }
        Ok(Value::Null)
    }

    fn eval_struct_block(&mut self, name: &str, members: &[String]) -> LampResult<Value> {
        for (i, member) in members.iter().enumerate() {
            if members[..i].contains(member) {
                return Err(self.err(ErrorKind::InvalidProperty {
                    member: member.clone(),
                    struct_id: format!("{}:{}", self.namespace, name),
                }));
            }
        }
        self.structs
            .declare(self.namespace.clone(), name.to_string(), members.to_vec());
        Ok(Value::Null)
    }

    fn eval_meta_function(
        &mut self,
        language: &str,
        module: &str,
        symbol: &str,
    ) -> LampResult<Value> {
        let provider = provider_for(language).ok_or_else(|| {
            self.err(ErrorKind::ForeignError(format!(
                "unsupported extern language: {language}"
            )))
        })?;
        let params = provider
            .params(module, symbol)
            .map_err(|kind| self.err(kind))?;
        self.functions.push(FunctionRecord {
            namespace: self.namespace.clone(),
            name: symbol.to_string(),
            params,
            body: FunctionBody::Foreign {
                language: language.to_string(),
                module_path: module.to_string(),
            },
            module: self.file.clone(),
        });
        Ok(Value::Null)
    }

    // ── Imports ───────────────────────────────────────────────────────────

    fn eval_import(&mut self, path: &str, filter: Option<&[String]>) -> LampResult<Value> {
        let resolved = modules::resolve(path).map_err(|kind| self.err(kind))?;
        let source = fs::read_to_string(&resolved.file_path)
            .map_err(|_| self.err(ErrorKind::MissingFile(path.to_string())))?;
        // A fresh parser pass and a fresh, disposable evaluator per import;
        // only its function records survive.
        let program = lamp_parser::parse(&source, &resolved.identity)?;
        let mut nested = Evaluator::new(resolved.namespace.clone(), resolved.identity.clone(), false);
        nested.run(&program)?;

        let mut records = nested.functions.into_records();
        match filter {
            Some(names) => {
                // Records from the target's own namespace must be listed;
                // transitively imported records pass through unfiltered.
                records.retain(|r| r.namespace != resolved.namespace || names.contains(&r.name));
            }
            None => {
                for record in &mut records {
                    record.module = resolved.identity.clone();
                }
            }
        }
        self.functions.append(records);
        Ok(Value::Null)
    }

    // ── Expressions ───────────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr) -> LampResult<Value> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element)?);
                }
                Ok(Value::list_from(values))
            }
            Expr::Dict(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval_expr(key)?;
                    let value = self.eval_expr(value)?;
                    dict_insert(&mut pairs, key, value);
                }
                Ok(Value::Dict(pairs))
            }
            Expr::Var(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| self.err(ErrorKind::InvalidVariable(name.clone()))),
            Expr::Neg(inner) => match self.eval_expr(inner)? {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(n) => Ok(Value::Float(-n)),
                other => {
                    let message = format!("cannot negate {}", other.type_name());
                    Err(self.err(ErrorKind::TypeMismatch(message)))
                }
            },
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                self.eval_binary(*op, lhs, rhs)
            }
            Expr::Compare { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                self.eval_compare(*op, lhs, rhs)
            }
            Expr::Out(inner) => {
                let value = self.eval_expr(inner)?;
                if self.interactive {
                    // The REPL returns the value for the driver to print.
                    Ok(value)
                } else {
                    if !value.is_null() {
                        println!("{value}");
                    }
                    Ok(Value::Null)
                }
            }
            Expr::Sqrt(inner) => {
                let value = self.eval_expr(inner)?;
                let x = self.expect_number("sqrt", value)?;
                Ok(demote(x.sqrt()))
            }
            Expr::Pow(base, exponent) => {
                let base = self.eval_expr(base)?;
                let exponent = self.eval_expr(exponent)?;
                self.eval_pow(base, exponent)
            }
            Expr::DefaultFunc { name, args } => {
                let args = self.eval_args(args)?;
                let namespace = self.namespace.clone();
                self.call_function(&namespace, name, args)
            }
            Expr::NamespaceFunc {
                namespace,
                name,
                args,
            } => {
                let args = self.eval_args(args)?;
                self.call_function(namespace, name, args)
            }
            Expr::StructRef { namespace, name } => {
                let ty = self.structs.resolve(namespace, name).ok_or_else(|| {
                    self.err(ErrorKind::InvalidFunction(format!("{namespace}:{name}")))
                })?;
                Ok(Value::Struct(StructInstance::instantiate(ty)))
            }
            Expr::StructVal { target, member } => self.eval_struct_val(target, member),
        }
    }

    fn eval_struct_val(&mut self, target: &str, member: &str) -> LampResult<Value> {
        let current = self
            .env
            .get(target)
            .ok_or_else(|| self.err(ErrorKind::InvalidVariable(target.to_string())))?;
        let instance = match current {
            Value::Struct(instance) => instance.clone(),
            other => {
                let message = format!("cannot read property {member} of {}", other.type_name());
                return Err(self.err(ErrorKind::TypeMismatch(message)));
            }
        };
        instance.get(member).ok_or_else(|| {
            self.err(ErrorKind::InvalidProperty {
                member: member.to_string(),
                struct_id: instance.ty().identity(),
            })
        })
    }

    fn eval_args(&mut self, args: &[Expr]) -> LampResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        Ok(values)
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn call_function(&mut self, namespace: &str, name: &str, args: Vec<Value>) -> LampResult<Value> {
        let record = self
            .functions
            .resolve(namespace, name)
            .cloned()
            .ok_or_else(|| {
                let shown = if namespace == self.namespace {
                    name.to_string()
                } else {
                    format!("{namespace}:{name}")
                };
                self.err(ErrorKind::InvalidFunction(shown))
            })?;

        if args.len() != record.params.len() {
            return Err(self.err(ErrorKind::ArgumentError {
                received: args.len(),
                expected: record.params.len(),
                func: record.name.clone(),
            }));
        }

        match &record.body {
            FunctionBody::Native(body) => self.call_native(&record.params, body, args),
            FunctionBody::Foreign {
                language,
                module_path,
            } => {
                let provider = provider_for(language).ok_or_else(|| {
                    self.err(ErrorKind::ForeignError(format!(
                        "unsupported extern language: {language}"
                    )))
                })?;
                let result = provider
                    .call(module_path, &record.name, &args)
                    .map_err(|kind| self.err(kind))?;
                Ok(call_result(vec![result]))
            }
        }
    }

    fn call_native(
        &mut self,
        params: &[String],
        body: &[Stmt],
        args: Vec<Value>,
    ) -> LampResult<Value> {
        // Flat scope: save exactly the parameter slots, bind, run, restore.
        let saved: Vec<(String, Option<Value>)> = params
            .iter()
            .map(|p| (p.clone(), self.env.remove(p)))
            .collect();
        for (param, arg) in params.iter().zip(args) {
            self.env.set(param, arg);
        }

        let result = self.eval_block(body);

        for (param, old) in saved {
            match old {
                Some(value) => self.env.set(&param, value),
                None => {
                    self.env.remove(&param);
                }
            }
        }

        Ok(call_result(result?))
    }

    // ── Blocks ────────────────────────────────────────────────────────────

    /// Evaluate a statement block, collecting its non-null results into one
    /// flattened list.
    fn eval_block(&mut self, body: &[Stmt]) -> LampResult<Vec<Value>> {
        let mut results = Vec::new();
        for stmt in body {
            let value = self.eval_stmt(stmt)?;
            if !value.is_null() {
                results.push(value);
            }
        }
        Ok(flatten(results))
    }

    /// A block's value: the first of its flattened results, or null.
    fn block_value(&mut self, body: &[Stmt]) -> LampResult<Value> {
        Ok(self
            .eval_block(body)?
            .into_iter()
            .next()
            .unwrap_or(Value::Null))
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn eval_binary(&self, op: BinOp, lhs: Value, rhs: Value) -> LampResult<Value> {
        // Integer pairs stay in machine-integer space, except division,
        // which is computed wide and demoted when integral.
        if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
            let (a, b) = (*a, *b);
            return Ok(match op {
                BinOp::Add => Value::Int(a.wrapping_add(b)),
                BinOp::Sub => Value::Int(a.wrapping_sub(b)),
                BinOp::Mul => Value::Int(a.wrapping_mul(b)),
                BinOp::Div => demote(a as f64 / b as f64),
                BinOp::Mod if b != 0 => Value::Int(floored_rem(a, b)),
                BinOp::Mod => Value::Float(f64::NAN),
            });
        }

        let a = self.number_operand(op, &lhs, &rhs)?;
        let b = self.number_operand(op, &rhs, &lhs)?;
        Ok(match op {
            BinOp::Add => Value::Float(a + b),
            BinOp::Sub => Value::Float(a - b),
            BinOp::Mul => Value::Float(a * b),
            BinOp::Div => demote(a / b),
            // Floored remainder, matching the sign of the divisor.
            BinOp::Mod => Value::Float(a - b * (a / b).floor()),
        })
    }

    fn number_operand(&self, op: BinOp, value: &Value, other: &Value) -> LampResult<f64> {
        match value {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(n) => Ok(*n),
            _ => {
                let message = format!(
                    "cannot apply '{}' to {} and {}",
                    op.symbol(),
                    value.type_name(),
                    other.type_name()
                );
                Err(self.err(ErrorKind::TypeMismatch(message)))
            }
        }
    }

    fn eval_pow(&self, base: Value, exponent: Value) -> LampResult<Value> {
        match (&base, &exponent) {
            (Value::Int(a), Value::Int(b)) if *b >= 0 => {
                let exp = u32::try_from(*b)
                    .unwrap_or(u32::MAX);
                Ok(Value::Int(a.wrapping_pow(exp)))
            }
            _ => {
                let a = self.pow_operand(&base, &exponent)?;
                let b = self.pow_operand(&exponent, &base)?;
                Ok(Value::Float(a.powf(b)))
            }
        }
    }

    fn pow_operand(&self, value: &Value, other: &Value) -> LampResult<f64> {
        match value {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(n) => Ok(*n),
            _ => {
                let message = format!(
                    "cannot apply 'pow' to {} and {}",
                    value.type_name(),
                    other.type_name()
                );
                Err(self.err(ErrorKind::TypeMismatch(message)))
            }
        }
    }

    fn expect_number(&self, what: &str, value: Value) -> LampResult<f64> {
        match value {
            Value::Int(n) => Ok(n as f64),
            Value::Float(n) => Ok(n),
            other => {
                let message = format!("cannot apply '{what}' to {}", other.type_name());
                Err(self.err(ErrorKind::TypeMismatch(message)))
            }
        }
    }

    fn eval_compare(&self, op: CmpOp, lhs: Value, rhs: Value) -> LampResult<Value> {
        let result = match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => compare_ord(op, a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = numeric(&lhs);
                let b = numeric(&rhs);
                match op {
                    CmpOp::Eq => a == b,
                    CmpOp::Ne => a != b,
                    CmpOp::Lt => a < b,
                    CmpOp::Le => a <= b,
                    CmpOp::Gt => a > b,
                    CmpOp::Ge => a >= b,
                }
            }
            (Value::Str(a), Value::Str(b)) => compare_ord(op, a.cmp(b)),
            (Value::Bool(_), Value::Bool(_))
            | (Value::List(_), Value::List(_))
            | (Value::Dict(_), Value::Dict(_))
            | (Value::Struct(_), Value::Struct(_)) => match op {
                CmpOp::Eq => lhs == rhs,
                CmpOp::Ne => lhs != rhs,
                _ => {
                    let message = format!(
                        "cannot apply '{}' to {} and {}",
                        op.symbol(),
                        lhs.type_name(),
                        rhs.type_name()
                    );
                    return Err(self.err(ErrorKind::TypeMismatch(message)));
                }
            },
            _ => {
                let message = format!(
                    "cannot compare {} and {}",
                    lhs.type_name(),
                    rhs.type_name()
                );
                return Err(self.err(ErrorKind::TypeMismatch(message)));
            }
        };
        Ok(Value::Bool(result))
    }
}

/// Apply a comparison operator to a total ordering.
fn compare_ord(op: CmpOp, ord: std::cmp::Ordering) -> bool {
    match op {
        CmpOp::Eq => ord.is_eq(),
        CmpOp::Ne => ord.is_ne(),
        CmpOp::Lt => ord.is_lt(),
        CmpOp::Le => ord.is_le(),
        CmpOp::Gt => ord.is_gt(),
        CmpOp::Ge => ord.is_ge(),
    }
}

fn numeric(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => f64::NAN,
    }
}

/// Floored remainder: the result takes the sign of the divisor.
fn floored_rem(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

/// The numeric normalization invariant: division and square-root results
/// that are mathematically integral are demoted to integers.
fn demote(x: f64) -> Value {
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Value::Int(x as i64)
    } else {
        Value::Float(x)
    }
}

/// A call's value: the first element of the flattened result list, never
/// the list itself.
fn call_result(values: Vec<Value>) -> Value {
    flatten(values).into_iter().next().unwrap_or(Value::Null)
}
