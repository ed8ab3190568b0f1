use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::ast::FuncDecl;
use crate::object::ObjectRef;

/// A runtime value.
///
/// `Int`, `Bool`, `String` and `Nil` have copy semantics: cloning duplicates
/// the value. `Object` and `Lambda` are shared handles, so cloning shares
/// identity. `Function` refers to an immutable top-level declaration.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Nil,
    Object(ObjectRef),
    Function(Rc<FuncDecl>),
    Lambda(Rc<Closure>),
}

impl Value {
    /// Kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Nil => "nil",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Lambda(_) => "lambda",
        }
    }

    /// Boolean view under the "nonzero ⇒ true" coercion. `None` for kinds
    /// that cannot be used where a Bool is required.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(n) => Some(*n != 0),
            _ => None,
        }
    }

    /// `==` semantics. Heterogeneous kinds are unequal, never an error.
    pub fn equals(&self, other: &Value) -> bool {
        debug!("Checking equality: {} == {}", self, other);

        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(n), Value::Bool(b)) | (Value::Bool(b), Value::Int(n)) => (*n != 0) == *b,
            (Value::Nil, Value::Nil) => true,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),

            Value::Bool(b) => write!(f, "{}", b),

            Value::String(s) => write!(f, "{}", s),

            Value::Nil => write!(f, "nil"),

            Value::Object(_) => write!(f, "<object>"),

            Value::Function(decl) => write!(f, "<function {}>", decl.display_name()),

            Value::Lambda(_) => write!(f, "<lambda>"),
        }
    }
}

// Objects and closures can reference themselves, so Debug stays shallow.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Nil => write!(f, "Nil"),
            Value::Object(obj) => write!(f, "Object({:p})", Rc::as_ptr(obj)),
            Value::Function(decl) => write!(f, "Function({})", decl.display_name()),
            Value::Lambda(closure) => write!(f, "Lambda({:p})", Rc::as_ptr(closure)),
        }
    }
}

/// A lambda value: the literal's AST paired with the variables it captured.
pub struct Closure {
    pub decl: Rc<FuncDecl>,

    /// Snapshot taken when the literal was evaluated. Scalars were copied;
    /// objects and lambdas are shared with the scope they came from. Kept in
    /// capture order, innermost scope first.
    pub captured: RefCell<IndexMap<String, Value>>,
}

impl Closure {
    pub fn new(decl: Rc<FuncDecl>, captured: IndexMap<String, Value>) -> Self {
        Self {
            decl,
            captured: RefCell::new(captured),
        }
    }

    /// Look `name` up in the captured map, then one level into the captured
    /// lambdas' own maps, earliest capture first.
    pub fn capture_lookup(&self, name: &str) -> Option<Value> {
        let captured = self.captured.borrow();

        if let Some(value) = captured.get(name) {
            return Some(value.clone());
        }

        captured.values().find_map(|value| match value {
            Value::Lambda(inner) => inner.captured.borrow().get(name).cloned(),
            _ => None,
        })
    }

    pub fn captures(&self, name: &str) -> bool {
        self.captured.borrow().contains_key(name)
    }

    /// Overwrite an existing captured entry. Returns `false` when `name` was
    /// never captured.
    pub fn update_capture(&self, name: &str, value: Value) -> bool {
        match self.captured.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.captured.borrow().keys().cloned().collect();
        names.sort();

        f.debug_struct("Closure")
            .field("params", &self.decl.params)
            .field("captured", &names)
            .finish()
    }
}
