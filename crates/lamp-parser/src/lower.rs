//! Lowering from the pest parse tree to the `lamp-types` syntax tree.

use crate::Rule;
use lamp_types::{BinOp, CmpOp, ErrorKind, Expr, LampError, LampResult, Program, Stmt};
use pest::iterators::Pair;

/// Lower the `program` node.
pub(crate) fn program(pair: Pair<'_, Rule>, file: &str) -> LampResult<Program> {
    let stmts = pair
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| stmt(p, file))
        .collect::<LampResult<Vec<_>>>()?;
    Ok(Program { stmts })
}

fn stmt(pair: Pair<'_, Rule>, file: &str) -> LampResult<Stmt> {
    match pair.as_rule() {
        Rule::import_stmt => {
            let mut path = String::new();
            let mut filter = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::import_kw => {}
                    Rule::path => path = p.as_str().to_string(),
                    Rule::filter => {
                        filter = Some(p.into_inner().map(|n| n.as_str().to_string()).collect());
                    }
                    _ => unreachable!("unexpected node under import_stmt"),
                }
            }
            Ok(Stmt::Import { path, filter })
        }
        Rule::meta_function => {
            let mut inner = pair.into_inner();
            let keyword = next_text(&mut inner);
            if keyword != "extern" {
                return Err(LampError::new(
                    ErrorKind::Syntax(format!("unknown meta keyword: @{keyword}")),
                    file,
                ));
            }
            let language = next_string(&mut inner);
            let module = next_string(&mut inner);
            let symbol = next_string(&mut inner);
            Ok(Stmt::MetaFunction {
                language,
                module,
                symbol,
            })
        }
        Rule::struct_block => {
            let mut inner = pair.into_inner();
            let name = next_text(&mut inner);
            let members = inner.map(|n| n.as_str().to_string()).collect();
            Ok(Stmt::StructBlock { name, members })
        }
        Rule::func_block => {
            let mut name = String::new();
            let mut params = Vec::new();
            let mut body = Vec::new();
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::name => name = p.as_str().to_string(),
                    Rule::params => {
                        params = p.into_inner().map(|n| n.as_str().to_string()).collect();
                    }
                    Rule::block => body = block(p, file)?,
                    _ => unreachable!("unexpected node under func_block"),
                }
            }
            Ok(Stmt::FuncBlock { name, params, body })
        }
        Rule::if_block => {
            let mut inner = pair.into_inner();
            let cond = expr(next_pair(&mut inner));
            let body = block(next_pair(&mut inner), file)?;
            Ok(Stmt::IfBlock { cond, body })
        }
        Rule::repeat_block => {
            let mut inner = pair.into_inner();
            let count = expr(next_pair(&mut inner));
            let body = block(next_pair(&mut inner), file)?;
            Ok(Stmt::RepeatBlock { count, body })
        }
        Rule::for_block => {
            let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::in_kw);
            let var = inner
                .next()
                .expect("for_block starts with its loop variable")
                .as_str()
                .to_string();
            let iterable = expr(inner.next().expect("for_block carries an iterable"));
            let body = block(inner.next().expect("for_block carries a body"), file)?;
            Ok(Stmt::ForBlock {
                var,
                iterable,
                body,
            })
        }
        Rule::assign_struct => {
            let mut inner = pair.into_inner();
            let target = next_text(&mut inner);
            let member = next_text(&mut inner);
            let value = expr(next_pair(&mut inner));
            Ok(Stmt::AssignStruct {
                target,
                member,
                value,
            })
        }
        Rule::assign_var => {
            let mut inner = pair.into_inner();
            let name = next_text(&mut inner);
            let value = expr(next_pair(&mut inner));
            Ok(Stmt::AssignVar { name, value })
        }
        _ => Ok(Stmt::Expr(expr(pair))),
    }
}

fn block(pair: Pair<'_, Rule>, file: &str) -> LampResult<Vec<Stmt>> {
    pair.into_inner().map(|p| stmt(p, file)).collect()
}

fn expr(pair: Pair<'_, Rule>) -> Expr {
    match pair.as_rule() {
        Rule::compare => fold_compare(pair),
        Rule::sum | Rule::product => fold_binary(pair),
        Rule::float => Expr::Float(
            pair.as_str()
                .parse()
                .expect("grammar guarantees a float literal"),
        ),
        // Integer literals wider than i64 fall back to floats.
        Rule::int => match pair.as_str().parse::<i64>() {
            Ok(n) => Expr::Int(n),
            Err(_) => Expr::Float(pair.as_str().parse().unwrap_or(f64::INFINITY)),
        },
        Rule::string => Expr::Str(string_text(pair)),
        Rule::bool_lit => Expr::Bool(pair.as_str() == "true"),
        Rule::list => Expr::List(pair.into_inner().map(expr).collect()),
        Rule::dict => Expr::Dict(
            pair.into_inner()
                .map(|p| {
                    let mut kv = p.into_inner();
                    let key = expr(next_pair(&mut kv));
                    let value = expr(next_pair(&mut kv));
                    (key, value)
                })
                .collect(),
        ),
        Rule::neg => Expr::Neg(Box::new(expr(next_pair(&mut pair.into_inner())))),
        Rule::out_call => Expr::Out(Box::new(expr(next_pair(&mut pair.into_inner())))),
        Rule::sqrt_call => Expr::Sqrt(Box::new(expr(next_pair(&mut pair.into_inner())))),
        Rule::pow_call => {
            let mut inner = pair.into_inner();
            let base = expr(next_pair(&mut inner));
            let exponent = expr(next_pair(&mut inner));
            Expr::Pow(Box::new(base), Box::new(exponent))
        }
        Rule::namespace_func => {
            let mut inner = pair.into_inner();
            let namespace = next_text(&mut inner);
            let name = next_text(&mut inner);
            let args = inner.next().map(call_args).unwrap_or_default();
            Expr::NamespaceFunc {
                namespace,
                name,
                args,
            }
        }
        Rule::struct_ref => {
            let mut inner = pair.into_inner();
            let namespace = next_text(&mut inner);
            let name = next_text(&mut inner);
            Expr::StructRef { namespace, name }
        }
        Rule::default_func => {
            let mut inner = pair.into_inner();
            let name = next_text(&mut inner);
            let args = inner.next().map(call_args).unwrap_or_default();
            Expr::DefaultFunc { name, args }
        }
        Rule::struct_val => {
            let mut inner = pair.into_inner();
            let target = next_text(&mut inner);
            let member = next_text(&mut inner);
            Expr::StructVal { target, member }
        }
        Rule::var => Expr::Var(pair.as_str().to_string()),
        other => unreachable!("rule {other:?} is not an expression"),
    }
}

/// Left-fold a `compare` chain into nested [`Expr::Compare`] nodes.
fn fold_compare(pair: Pair<'_, Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let mut lhs = expr(next_pair(&mut inner));
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            "<=" => CmpOp::Le,
            ">=" => CmpOp::Ge,
            "<" => CmpOp::Lt,
            ">" => CmpOp::Gt,
            other => unreachable!("unknown comparison operator {other}"),
        };
        let rhs = expr(next_pair(&mut inner));
        lhs = Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }
    lhs
}

/// Left-fold a `sum` or `product` chain into nested [`Expr::Binary`] nodes.
fn fold_binary(pair: Pair<'_, Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let mut lhs = expr(next_pair(&mut inner));
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            other => unreachable!("unknown binary operator {other}"),
        };
        let rhs = expr(next_pair(&mut inner));
        lhs = Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }
    lhs
}

fn call_args(pair: Pair<'_, Rule>) -> Vec<Expr> {
    pair.into_inner().map(expr).collect()
}

fn next_pair<'a>(inner: &mut impl Iterator<Item = Pair<'a, Rule>>) -> Pair<'a, Rule> {
    inner.next().expect("grammar guarantees this child node")
}

fn next_text<'a>(inner: &mut impl Iterator<Item = Pair<'a, Rule>>) -> String {
    next_pair(inner).as_str().to_string()
}

fn next_string<'a>(inner: &mut impl Iterator<Item = Pair<'a, Rule>>) -> String {
    string_text(next_pair(inner))
}

/// Extract and unescape the text of a `string` node.
fn string_text(pair: Pair<'_, Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}
