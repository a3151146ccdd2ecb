//! The runtime value model.
//!
//! Every Lamp value is a [`Value`] variant; operators are defined over fixed
//! operand-type pairs and the evaluator rejects everything else. Struct
//! instances are shared references with interior mutability so that aliasing
//! a struct value aliases its members, matching the reference semantics of
//! the original runtime.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A declared struct type: identity is `(namespace, name)`, members are an
/// ordered list of unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub namespace: String,
    pub name: String,
    pub members: Vec<String>,
}

impl StructType {
    /// The `namespace:name` identity used in error messages.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }
}

/// A live struct instance: a back-reference to its type plus one slot per
/// declared member. Slots start unset and read back as [`Value::Null`].
#[derive(Debug)]
pub struct StructInstance {
    ty: Rc<StructType>,
    fields: RefCell<Vec<Option<Value>>>,
}

impl StructInstance {
    /// Instantiate with every declared member unset.
    pub fn instantiate(ty: Rc<StructType>) -> Rc<Self> {
        let fields = RefCell::new(vec![None; ty.members.len()]);
        Rc::new(Self { ty, fields })
    }

    pub fn ty(&self) -> &StructType {
        &self.ty
    }

    /// Read a member. `None` means the member is not declared on the type;
    /// an unset member reads as [`Value::Null`].
    pub fn get(&self, member: &str) -> Option<Value> {
        let idx = self.ty.members.iter().position(|m| m == member)?;
        Some(self.fields.borrow()[idx].clone().unwrap_or(Value::Null))
    }

    /// Write a member. Returns `false` when the member is not declared.
    pub fn set(&self, member: &str, value: Value) -> bool {
        match self.ty.members.iter().position(|m| m == member) {
            Some(idx) => {
                self.fields.borrow_mut()[idx] = Some(value);
                true
            }
            None => false,
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absence of a value: statements with no result, `out(...)` in
    /// script mode, unset struct members.
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// Always flat; construction splices nested lists.
    List(Vec<Value>),
    /// Association pairs in insertion order; keys are unique
    /// (last write wins at construction).
    Dict(Vec<(Value, Value)>),
    Struct(Rc<StructInstance>),
}

impl Value {
    /// Build a list, splicing any list elements so the result stays flat.
    pub fn list_from(elements: Vec<Value>) -> Value {
        Value::List(flatten(elements))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type name used in mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Struct(_) => "struct",
        }
    }
}

/// Splice one level of list nesting. Construction-time flattening keeps
/// every list flat by induction, so one level is all there ever is.
pub fn flatten(values: Vec<Value>) -> Vec<Value> {
    let mut flat = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::List(items) => flat.extend(items),
            other => flat.push(other),
        }
    }
    flat
}

/// Insert a pair into an association list, replacing the value of an equal
/// key (last write wins).
pub fn dict_insert(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    for (existing, slot) in pairs.iter_mut() {
        if *existing == key {
            *slot = value;
            return;
        }
    }
    pairs.push((key, value));
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Dicts compare as key-value sets; insertion order is
            // irrelevant for semantics.
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            // Struct values compare by identity.
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Struct(instance) => write!(f, "<struct {}>", instance.ty().identity()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_flatten_on_construction() {
        let inner = Value::List(vec![Value::Int(2), Value::Int(3)]);
        let list = Value::list_from(vec![Value::Int(1), inner, Value::Int(4)]);
        assert_eq!(
            list,
            Value::List(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4)
            ])
        );
    }

    #[test]
    fn list_display() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn dict_last_write_wins_and_order_insensitive_eq() {
        let mut pairs = Vec::new();
        dict_insert(&mut pairs, Value::Str("a".into()), Value::Int(1));
        dict_insert(&mut pairs, Value::Str("b".into()), Value::Int(2));
        dict_insert(&mut pairs, Value::Str("a".into()), Value::Int(3));
        let d1 = Value::Dict(pairs);
        assert_eq!(d1.to_string(), "{a: 3, b: 2}");

        let d2 = Value::Dict(vec![
            (Value::Str("b".into()), Value::Int(2)),
            (Value::Str("a".into()), Value::Int(3)),
        ]);
        assert_eq!(d1, d2);
    }

    #[test]
    fn unset_members_read_as_null() {
        let ty = Rc::new(StructType {
            namespace: "main".into(),
            name: "Point".into(),
            members: vec!["x".into(), "y".into()],
        });
        let inst = StructInstance::instantiate(ty);
        assert_eq!(inst.get("x"), Some(Value::Null));
        assert!(inst.set("x", Value::Int(5)));
        assert_eq!(inst.get("x"), Some(Value::Int(5)));
        assert_eq!(inst.get("z"), None);
        assert!(!inst.set("z", Value::Int(1)));
    }
}
