//! Prototype-based objects.
//!
//! An object is a mutable field map shared through an [`ObjectRef`]. The
//! reserved field `proto` may hold another object; reads that miss on the
//! object itself continue along that chain, writes always land on the object.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::error::{BrewinError, Result};
use crate::value::{Closure, Value};

/// Name of the delegation field.
pub const PROTO: &str = "proto";

pub type ObjectRef = Rc<RefCell<Object>>;

#[derive(Default)]
pub struct Object {
    fields: HashMap<String, Value>,
}

impl Object {
    /// A fresh, empty object with its own identity.
    pub fn new_ref() -> ObjectRef {
        Rc::new(RefCell::new(Object::default()))
    }

    pub fn own_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn proto(&self) -> Option<ObjectRef> {
        match self.fields.get(PROTO) {
            Some(Value::Object(parent)) => Some(Rc::clone(parent)),
            _ => None,
        }
    }
}

/// Read `field` from `obj`, walking the `proto` chain. A cyclic chain stops
/// the walk.
pub fn get_field(obj: &ObjectRef, field: &str) -> Option<Value> {
    let mut current: ObjectRef = Rc::clone(obj);
    let mut seen: HashSet<*const RefCell<Object>> = HashSet::new();

    loop {
        if !seen.insert(Rc::as_ptr(&current)) {
            debug!("Prototype cycle while looking up '{}'", field);
            return None;
        }

        let next: ObjectRef = {
            let object = current.borrow();

            if let Some(value) = object.own_field(field) {
                return Some(value.clone());
            }

            object.proto()?
        };

        debug!("Field '{}' not found, descending into proto", field);
        current = next;
    }
}

/// Write `field` directly into `obj`'s own map. `proto` only accepts an
/// object or nil.
pub fn set_field(obj: &ObjectRef, field: &str, value: Value) -> Result<()> {
    if field == PROTO && !matches!(value, Value::Object(_) | Value::Nil) {
        return Err(BrewinError::type_error(format!(
            "proto must be an object or nil, got {}",
            value.kind()
        )));
    }

    obj.borrow_mut().fields.insert(field.to_string(), value);

    Ok(())
}

/// Structural copy of `value`. Objects and closures reachable from it are
/// duplicated; sharing and cycles inside the copied graph are preserved.
/// Scalars and function references come back as plain clones.
pub fn deep_copy(value: &Value) -> Value {
    DeepCopier::default().copy(value)
}

#[derive(Default)]
struct DeepCopier {
    objects: HashMap<*const RefCell<Object>, ObjectRef>,
    closures: HashMap<*const Closure, Rc<Closure>>,
}

impl DeepCopier {
    fn copy(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(obj) => Value::Object(self.copy_object(obj)),
            Value::Lambda(closure) => Value::Lambda(self.copy_closure(closure)),
            other => other.clone(),
        }
    }

    fn copy_object(&mut self, obj: &ObjectRef) -> ObjectRef {
        if let Some(done) = self.objects.get(&Rc::as_ptr(obj)) {
            return Rc::clone(done);
        }

        let fresh: ObjectRef = Object::new_ref();
        self.objects.insert(Rc::as_ptr(obj), Rc::clone(&fresh));

        let fields: Vec<(String, Value)> = obj
            .borrow()
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (name, field) in fields {
            let copied = self.copy(&field);
            fresh.borrow_mut().fields.insert(name, copied);
        }

        fresh
    }

    fn copy_closure(&mut self, closure: &Rc<Closure>) -> Rc<Closure> {
        if let Some(done) = self.closures.get(&Rc::as_ptr(closure)) {
            return Rc::clone(done);
        }

        let fresh = Rc::new(Closure::new(Rc::clone(&closure.decl), IndexMap::new()));
        self.closures.insert(Rc::as_ptr(closure), Rc::clone(&fresh));

        let captured: Vec<(String, Value)> = closure
            .captured
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (name, value) in captured {
            let copied = self.copy(&value);
            fresh.captured.borrow_mut().insert(name, copied);
        }

        fresh
    }
}
