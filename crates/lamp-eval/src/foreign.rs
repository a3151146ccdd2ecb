//! The foreign-call boundary.
//!
//! An `@extern` declaration names a language tag, a module path, and an
//! exported symbol. Each supported language has a [`ForeignProvider`] that
//! can introspect the callable's declared parameters and invoke it with Lamp
//! values. Loaded modules live in a process-wide cache keyed by module path,
//! so repeated calls (and repeated evaluator instances) reuse them.

use crate::value::{dict_insert, Value};
use lamp_types::ErrorKind;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyList, PyModule, PyTuple};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Capability interface for one foreign language runtime.
pub trait ForeignProvider {
    /// The callable's declared parameter names, in order. Loads the module
    /// through the process-wide cache as a side effect.
    fn params(&self, module_path: &str, symbol: &str) -> Result<Vec<String>, ErrorKind>;

    /// Invoke the callable positionally and adapt its result back into the
    /// value model.
    fn call(&self, module_path: &str, symbol: &str, args: &[Value]) -> Result<Value, ErrorKind>;
}

/// Look up the provider for a language tag.
pub fn provider_for(language: &str) -> Option<&'static dyn ForeignProvider> {
    match language {
        "python" => Some(&PythonProvider),
        _ => None,
    }
}

/// Python, embedded through pyo3.
pub struct PythonProvider;

/// Loaded Python modules, keyed by module path. Process-wide so every
/// evaluator instance shares the same loaded units.
static LOADED_UNITS: OnceLock<Mutex<HashMap<String, Py<PyModule>>>> = OnceLock::new();

impl ForeignProvider for PythonProvider {
    fn params(&self, module_path: &str, symbol: &str) -> Result<Vec<String>, ErrorKind> {
        Python::with_gil(|py| {
            let callable = resolve_callable(py, module_path, symbol)?;
            let code = callable
                .as_ref(py)
                .getattr("__code__")
                .map_err(|e| ErrorKind::ForeignError(e.to_string()))?;
            let argcount: usize = code
                .getattr("co_argcount")
                .and_then(|v| v.extract())
                .map_err(|e| ErrorKind::ForeignError(e.to_string()))?;
            let varnames: Vec<String> = code
                .getattr("co_varnames")
                .and_then(|v| v.extract())
                .map_err(|e| ErrorKind::ForeignError(e.to_string()))?;
            Ok(varnames.into_iter().take(argcount).collect())
        })
    }

    fn call(&self, module_path: &str, symbol: &str, args: &[Value]) -> Result<Value, ErrorKind> {
        Python::with_gil(|py| {
            let callable = resolve_callable(py, module_path, symbol)?;
            let mut converted = Vec::with_capacity(args.len());
            for arg in args {
                converted.push(value_to_py(py, arg)?);
            }
            let result = callable
                .as_ref(py)
                .call1(PyTuple::new(py, &converted))
                .map_err(|e| ErrorKind::ForeignError(e.to_string()))?;
            Ok(py_to_value(result))
        })
    }
}

fn resolve_callable(
    py: Python<'_>,
    module_path: &str,
    symbol: &str,
) -> Result<Py<PyAny>, ErrorKind> {
    let module = load_module(py, module_path)?;
    let callable = module
        .as_ref(py)
        .getattr(symbol)
        .map_err(|_| ErrorKind::InvalidFunction(symbol.to_string()))?;
    Ok(callable.into())
}

fn load_module(py: Python<'_>, module_path: &str) -> Result<Py<PyModule>, ErrorKind> {
    let cache = LOADED_UNITS.get_or_init(Default::default);
    let mut units = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(module) = units.get(module_path) {
        return Ok(module.clone_ref(py));
    }
    let code = fs::read_to_string(module_path)
        .map_err(|_| ErrorKind::MissingFile(module_path.to_string()))?;
    let stem = Path::new(module_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    let module = PyModule::from_code(py, &code, module_path, &stem)
        .map_err(|e| ErrorKind::ForeignError(e.to_string()))?;
    let owned: Py<PyModule> = module.into();
    units.insert(module_path.to_string(), owned.clone_ref(py));
    Ok(owned)
}

fn value_to_py(py: Python<'_>, value: &Value) -> Result<PyObject, ErrorKind> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Int(n) => n.to_object(py),
        Value::Float(n) => n.to_object(py),
        Value::Str(s) => s.to_object(py),
        Value::Bool(b) => b.to_object(py),
        Value::List(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                converted.push(value_to_py(py, item)?);
            }
            PyList::new(py, &converted).to_object(py)
        }
        Value::Dict(pairs) => {
            let dict = PyDict::new(py);
            for (k, v) in pairs {
                dict.set_item(value_to_py(py, k)?, value_to_py(py, v)?)
                    .map_err(|e| ErrorKind::ForeignError(e.to_string()))?;
            }
            dict.to_object(py)
        }
        Value::Struct(instance) => {
            return Err(ErrorKind::ForeignError(format!(
                "struct {} cannot cross the foreign boundary",
                instance.ty().identity()
            )));
        }
    })
}

/// Structural mapping back into the value model: list-likes become lists
/// (flattened, like any list construction), everything else a scalar.
/// Unrecognized objects fall back to their string form.
fn py_to_value(obj: &PyAny) -> Value {
    if obj.is_none() {
        return Value::Null;
    }
    // Bool first: Python bools extract as ints too.
    if obj.is_instance_of::<PyBool>() {
        if let Ok(b) = obj.extract::<bool>() {
            return Value::Bool(b);
        }
    }
    if let Ok(n) = obj.extract::<i64>() {
        return Value::Int(n);
    }
    if let Ok(n) = obj.extract::<f64>() {
        return Value::Float(n);
    }
    if let Ok(s) = obj.extract::<String>() {
        return Value::Str(s);
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return Value::list_from(list.iter().map(py_to_value).collect());
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return Value::list_from(tuple.iter().map(py_to_value).collect());
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut pairs = Vec::new();
        for (k, v) in dict.iter() {
            dict_insert(&mut pairs, py_to_value(k), py_to_value(v));
        }
        return Value::Dict(pairs);
    }
    match obj.str() {
        Ok(s) => Value::Str(s.to_string_lossy().into_owned()),
        Err(_) => Value::Null,
    }
}
