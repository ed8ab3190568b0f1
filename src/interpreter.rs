//! Tree-walking evaluator for Brewin programs.
//!
//! The [`Interpreter`] is an explicit context object: it owns the scope stack,
//! the function catalog, the console and the closure currently executing.
//! Statements run through [`Interpreter::execute`], expressions through
//! [`Interpreter::evaluate`]; calls are resolved in [`call`], operators in
//! [`operators`].
//!
//! Name resolution for a plain identifier:
//!
//! 1. frames pushed since the current lambda invocation began,
//! 2. the lambda's captured variables (one level into captured lambdas),
//! 3. the remaining frames, innermost first,
//! 4. a uniquely named top-level function, as a `Function` value.
//!
//! A name shared by several top-level overloads is a NameError before any of
//! these steps.
//!
//! Outside a lambda invocation steps 1–3 collapse into a plain scan of all
//! frames.

mod call;
mod operators;

use std::ops::Range;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, FuncDecl, Program, Stmt, Target};
use crate::console::Console;
use crate::environment::{Environment, Slot};
use crate::error::{BrewinError, Result};
use crate::object::{self, deep_copy, Object, ObjectRef};
use crate::value::{Closure, Value};

pub use call::FunctionCatalog;

/// Non-local exits from statement execution.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Fault(#[from] BrewinError),

    #[error("return {0}")]
    ReturnSignal(Value),
}

pub type IResult<T> = std::result::Result<T, InterpretError>;

/// The lambda whose body is executing, and the index of its invocation frame.
struct ActiveClosure {
    closure: Rc<Closure>,
    base: usize,
}

pub struct Interpreter<'io> {
    env: Environment,
    functions: FunctionCatalog,
    console: Console<'io>,
    active: Option<ActiveClosure>,
}

impl<'io> Interpreter<'io> {
    pub fn new(program: &Program, console: Console<'io>) -> Self {
        info!(
            "Initializing Interpreter with {} functions",
            program.functions.len()
        );

        Self {
            env: Environment::new(),
            functions: FunctionCatalog::new(&program.functions),
            console,
            active: None,
        }
    }

    /// Run `main()` to completion. The first Name or Type error aborts the run.
    pub fn run(&mut self) -> Result<()> {
        let main: Rc<FuncDecl> = self
            .functions
            .find("main", 0)
            .ok_or_else(|| BrewinError::name("No main() function was found"))?;

        info!("Running main()");

        self.call_function(&main, None, Vec::new())?;
        info!("Program executed successfully");

        Ok(())
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    // ───────────────────────────── statements ─────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Assign { target, value } => {
                let value = self.evaluate(value)?;
                self.assign(target, value)?;
                Ok(())
            }

            Stmt::Call(call) => {
                debug!(
                    "Executing call statement '{}' with {} arguments",
                    call.name(),
                    call.args().len()
                );
                self.evaluate_call(call)?;
                Ok(())
            }

            Stmt::Return(expr) => {
                let value = match expr {
                    Some(e) => deep_copy(&self.evaluate(e)?),
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Err(InterpretError::ReturnSignal(value))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                debug!("Evaluating if condition");
                if self.condition(condition, "if")? {
                    self.execute_scoped(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_scoped(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.condition(condition, "while")? {
                    self.execute_scoped(body)?;
                }
                info!("Exited while loop");
                Ok(())
            }
        }
    }

    /// Run `statements` in a fresh frame, popping it however the block exits.
    pub fn execute_scoped(&mut self, statements: &[Stmt]) -> IResult<()> {
        self.with_scope(|this| this.execute_block(statements))
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> IResult<()> {
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> IResult<T>) -> IResult<T> {
        self.env.push_scope();
        let result = f(self);
        self.env.pop_scope();
        result
    }

    fn condition(&mut self, expr: &Expr, context: &str) -> IResult<bool> {
        let value = self.evaluate(expr)?;

        value.as_bool().ok_or_else(|| {
            InterpretError::from(BrewinError::type_error(format!(
                "{} condition must be bool or int, got {}",
                context,
                value.kind()
            )))
        })
    }

    fn assign(&mut self, target: &Target, value: Value) -> IResult<()> {
        match target {
            Target::Variable(name) => {
                debug!("Assigning {} to '{}'", value, name);
                self.write_variable(name, value);
                Ok(())
            }

            Target::Field { object, field } => {
                debug!("Assigning {} to '{}.{}'", value, object, field);
                let obj = self.object_named(object)?;
                object::set_field(&obj, field, value)?;
                Ok(())
            }
        }
    }

    // ───────────────────────────── expressions ────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        let value = match expr {
            Expr::Int(n) => Value::Int(*n),
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Nil => Value::Nil,

            Expr::Variable(name) => self.read_variable(name)?,

            Expr::Field { object, field } => {
                let obj = self.object_named(object)?;
                object::get_field(&obj, field).ok_or_else(|| {
                    BrewinError::name(format!("field {} does not exist on {}", field, object))
                })?
            }

            Expr::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                operators::binary(*op, left, right)?
            }

            Expr::Unary { op, operand } => {
                let operand = self.evaluate(operand)?;
                operators::unary(*op, operand)?
            }

            Expr::Call(call) => self.evaluate_call(call)?,

            Expr::Object => {
                debug!("Allocating object");
                Value::Object(Object::new_ref())
            }

            Expr::Lambda(decl) => Value::Lambda(Rc::new(self.capture(decl))),
        };

        debug!("Expression evaluated to: {}", value);
        Ok(value)
    }

    /// Build a closure over every visible variable except `decl`'s parameters.
    /// Entries are ordered innermost scope first; an inner name shadows any
    /// outer one.
    fn capture(&self, decl: &Rc<FuncDecl>) -> Closure {
        let mut captured: IndexMap<String, Value> = match &self.active {
            Some(active) => {
                let mut layered = self.env.visible_in(active.base..self.env.depth());
                let enclosing = active.closure.captured.borrow().clone();
                let outer = self.env.visible_in(0..active.base);

                for (name, value) in enclosing.into_iter().chain(outer) {
                    layered.entry(name).or_insert(value);
                }
                layered
            }
            None => self.env.visible_in(0..self.env.depth()),
        };

        captured.retain(|name, _| !decl.params.iter().any(|p| &p.name == name));

        debug!("Lambda captured {} variables", captured.len());

        Closure::new(Rc::clone(decl), captured)
    }

    // ───────────────────────────── name resolution ────────────────────────

    /// Frames that belong to the running lambda invocation, and those below.
    fn layers(&self) -> Option<(Range<usize>, Range<usize>, &Rc<Closure>)> {
        self.active.as_ref().map(|active| {
            (
                active.base..self.env.depth(),
                0..active.base,
                &active.closure,
            )
        })
    }

    /// Variable-only lookup, without falling back to top-level functions.
    fn probe_variable(&self, name: &str) -> Option<Value> {
        match self.layers() {
            Some((local, outer, closure)) => self
                .env
                .probe_in(name, local)
                .or_else(|| closure.capture_lookup(name))
                .or_else(|| self.env.probe_in(name, outer)),
            None => self.env.probe(name),
        }
    }

    /// Storage slot a `ref` parameter or `this` should alias. Captured
    /// variables have none and are passed by value.
    fn variable_slot(&self, name: &str) -> Option<Slot> {
        match self.layers() {
            Some((local, outer, closure)) => {
                if let Some((_, slot)) = self.env.slot_in(name, local) {
                    return Some(slot);
                }
                if closure.captures(name) {
                    return None;
                }
                self.env.slot_in(name, outer).map(|(_, slot)| slot)
            }
            None => self.env.slot(name).map(|(_, slot)| slot),
        }
    }

    /// A bare name that is an overloaded function is ambiguous even when a
    /// variable of that name exists.
    fn read_variable(&self, name: &str) -> IResult<Value> {
        let function = self.functions.unique(name)?;

        if let Some(value) = self.probe_variable(name) {
            return Ok(value);
        }

        match function {
            Some(decl) => Ok(Value::Function(decl)),
            None => Err(BrewinError::name(format!("variable {} has not been defined", name)).into()),
        }
    }

    fn write_variable(&mut self, name: &str, value: Value) {
        let layers = self
            .layers()
            .map(|(local, _, closure)| (local, Rc::clone(closure)));

        if let Some((local, closure)) = layers {
            if self.env.assign_in(name, value.clone(), local) {
                return;
            }
            // Captured scalars are updated in the closure only.
            if closure.update_capture(name, value.clone()) {
                debug!("Updated captured variable '{}'", name);
                return;
            }
        }

        self.env.assign(name, value);
    }

    fn object_named(&self, name: &str) -> IResult<ObjectRef> {
        match self.read_variable(name)? {
            Value::Object(obj) => Ok(obj),
            other => Err(BrewinError::type_error(format!(
                "{} is a {}, not an object",
                name,
                other.kind()
            ))
            .into()),
        }
    }
}
