//! Call resolution and invocation.
//!
//! A call site `name(args)` resolves, in order, to a built-in, to the
//! top-level function declared with that name and arity, or to a variable
//! holding a `Function` or `Lambda`. A method call `obj.name(args)` resolves
//! `name` through `obj`'s prototype chain instead.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use super::{ActiveClosure, IResult, InterpretError, Interpreter};
use crate::ast::{Call, Expr, FuncDecl};
use crate::environment::Slot;
use crate::error::{BrewinError, Result};
use crate::object::{self, deep_copy};
use crate::value::{Closure, Value};

/// Implicit receiver parameter of method calls.
const THIS: &str = "this";

/// Top-level function declarations keyed by name, overloaded by arity.
#[derive(Debug, Default)]
pub struct FunctionCatalog {
    by_name: HashMap<String, Vec<Rc<FuncDecl>>>,
}

impl FunctionCatalog {
    pub fn new(functions: &[Rc<FuncDecl>]) -> Self {
        let mut by_name: HashMap<String, Vec<Rc<FuncDecl>>> = HashMap::new();

        for decl in functions {
            if let Some(name) = &decl.name {
                by_name.entry(name.clone()).or_default().push(Rc::clone(decl));
            }
        }

        Self { by_name }
    }

    /// The declaration of `name` taking `arity` parameters. A later
    /// declaration with the same signature wins.
    pub fn find(&self, name: &str, arity: usize) -> Option<Rc<FuncDecl>> {
        self.by_name
            .get(name)?
            .iter()
            .rev()
            .find(|decl| decl.arity() == arity)
            .cloned()
    }

    /// The single declaration named `name`, for use as a bare value.
    /// Overloaded names cannot be referenced this way.
    pub fn unique(&self, name: &str) -> Result<Option<Rc<FuncDecl>>> {
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([decl]) => Ok(Some(Rc::clone(decl))),
            Some(_) => Err(BrewinError::name(format!(
                "function {} is overloaded and cannot be used as a value",
                name
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Builtin {
    Print,
    InputI,
    InputS,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Builtin::Print),
            "inputi" => Some(Builtin::InputI),
            "inputs" => Some(Builtin::InputS),
            _ => None,
        }
    }
}

/// What a user-level call site resolved to.
enum Callee {
    Function(Rc<FuncDecl>),
    Lambda(Rc<Closure>),
}

/// A parameter ready to be bound in the callee's frame.
pub(super) enum Binding {
    Value { name: String, value: Value },
    Alias { name: String, target: String, slot: Slot },
}

impl<'io> Interpreter<'io> {
    /// Evaluate a function or method call.
    pub(super) fn evaluate_call(&mut self, call: &Call) -> IResult<Value> {
        match call {
            Call::Function { name, args } => {
                debug!("Calling '{}' with {} arguments", name, args.len());

                if let Some(builtin) = Builtin::from_name(name) {
                    return self.call_builtin(builtin, args);
                }

                match self.resolve(name, args.len())? {
                    Callee::Function(decl) => {
                        let bindings = self.bind_arguments(&decl, args)?;
                        Ok(self.call_function(&decl, None, bindings)?)
                    }
                    Callee::Lambda(closure) => {
                        let decl = Rc::clone(&closure.decl);
                        let bindings = self.bind_arguments(&decl, args)?;
                        Ok(self.call_function(&decl, Some(closure), bindings)?)
                    }
                }
            }

            Call::Method { objref, name, args } => self.call_method(objref, name, args),
        }
    }

    fn resolve(&self, name: &str, argc: usize) -> IResult<Callee> {
        if let Some(decl) = self.functions.find(name, argc) {
            return Ok(Callee::Function(decl));
        }

        match self.probe_variable(name) {
            Some(value) => callable(name, value, argc),
            None => Err(BrewinError::name(format!(
                "function {} taking {} arguments has not been defined",
                name, argc
            ))
            .into()),
        }
    }

    fn call_method(&mut self, objref: &str, name: &str, args: &[Expr]) -> IResult<Value> {
        debug!("Calling method '{}.{}'", objref, name);

        let receiver = self.object_named(objref)?;
        let method = object::get_field(&receiver, name).ok_or_else(|| {
            BrewinError::name(format!("method {} does not exist on {}", name, objref))
        })?;

        let (decl, closure) = match callable(name, method, args.len())? {
            Callee::Function(decl) => (decl, None),
            Callee::Lambda(closure) => (Rc::clone(&closure.decl), Some(closure)),
        };

        let mut bindings = self.bind_arguments(&decl, args)?;

        bindings.push(match self.variable_slot(objref) {
            Some(slot) => Binding::Alias {
                name: THIS.to_string(),
                target: objref.to_string(),
                slot,
            },
            None => Binding::Value {
                name: THIS.to_string(),
                value: Value::Object(receiver),
            },
        });

        Ok(self.call_function(&decl, closure, bindings)?)
    }

    /// Evaluate arguments in the caller's scope. By-value parameters get a
    /// deep copy; `ref` parameters alias the caller's variable when the
    /// argument is a plain name with storage.
    fn bind_arguments(&mut self, decl: &FuncDecl, args: &[Expr]) -> IResult<Vec<Binding>> {
        let mut bindings: Vec<Binding> = Vec::with_capacity(args.len());

        for (param, arg) in decl.params.iter().zip(args) {
            if param.by_ref {
                if let Expr::Variable(target) = arg {
                    if let Some(slot) = self.variable_slot(target) {
                        bindings.push(Binding::Alias {
                            name: param.name.clone(),
                            target: target.clone(),
                            slot,
                        });
                        continue;
                    }
                }

                let value = self.evaluate(arg)?;
                bindings.push(Binding::Value {
                    name: param.name.clone(),
                    value,
                });
            } else {
                let value = deep_copy(&self.evaluate(arg)?);
                bindings.push(Binding::Value {
                    name: param.name.clone(),
                    value,
                });
            }
        }

        Ok(bindings)
    }

    /// Run `decl`'s body in a fresh frame holding `bindings`. `closure` is the
    /// lambda being invoked, if any. A `return` ends here, so only faults
    /// escape.
    pub(super) fn call_function(
        &mut self,
        decl: &Rc<FuncDecl>,
        closure: Option<Rc<Closure>>,
        bindings: Vec<Binding>,
    ) -> Result<Value> {
        debug!("Entering function '{}'", decl.display_name());

        let active = closure.map(|closure| ActiveClosure {
            closure,
            base: self.env.depth(),
        });
        let saved = std::mem::replace(&mut self.active, active);

        let result = self.with_scope(|this| {
            for binding in bindings {
                match binding {
                    Binding::Value { name, value } => this.env.define(&name, value),
                    Binding::Alias { name, target, slot } => {
                        this.env.bind_alias(&name, &target, slot)
                    }
                }
            }

            this.execute_block(&decl.body)
        });

        self.active = saved;

        match result {
            Ok(()) => {
                info!("Function '{}' returned nil", decl.display_name());
                Ok(Value::Nil)
            }
            Err(InterpretError::ReturnSignal(value)) => {
                info!("Function '{}' returned: {}", decl.display_name(), value);
                Ok(value)
            }
            Err(InterpretError::Fault(e)) => Err(e),
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, args: &[Expr]) -> IResult<Value> {
        match builtin {
            Builtin::Print => {
                let mut line = String::new();
                for arg in args {
                    line.push_str(&self.evaluate(arg)?.to_string());
                }
                self.console.output(&line)?;
                Ok(Value::Nil)
            }

            Builtin::InputI | Builtin::InputS => {
                let name = if matches!(builtin, Builtin::InputI) {
                    "inputi"
                } else {
                    "inputs"
                };

                match args {
                    [] => {}
                    [prompt] => {
                        let prompt = self.evaluate(prompt)?;
                        self.console.output(&prompt.to_string())?;
                    }
                    _ => {
                        return Err(BrewinError::name(format!(
                            "{}() takes at most one argument",
                            name
                        ))
                        .into())
                    }
                }

                let line = self.console.input()?.ok_or_else(|| {
                    BrewinError::type_error(format!("{}() reached end of input", name))
                })?;

                if matches!(builtin, Builtin::InputS) {
                    return Ok(Value::String(line));
                }

                // Digits only: no sign, no surrounding whitespace.
                if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(BrewinError::type_error(format!(
                        "inputi() expected an integer, got {:?}",
                        line
                    ))
                    .into());
                }

                line.parse::<i64>().map(Value::Int).map_err(|_| {
                    InterpretError::from(BrewinError::type_error(format!(
                        "inputi() value out of range: {}",
                        line
                    )))
                })
            }
        }
    }
}

/// Check that `value` can be called with `argc` arguments.
fn callable(name: &str, value: Value, argc: usize) -> IResult<Callee> {
    let (callee, arity) = match value {
        Value::Function(decl) => {
            let arity = decl.arity();
            (Callee::Function(decl), arity)
        }
        Value::Lambda(closure) => {
            let arity = closure.decl.arity();
            (Callee::Lambda(closure), arity)
        }
        other => {
            return Err(BrewinError::type_error(format!(
                "{} is a {}, which is not callable",
                name,
                other.kind()
            ))
            .into())
        }
    };

    if arity != argc {
        return Err(BrewinError::type_error(format!(
            "{} expects {} arguments but got {}",
            name, arity, argc
        ))
        .into());
    }

    Ok(callee)
}
