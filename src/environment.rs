//! Variable storage: a stack of scope frames.
//!
//! Every frame carries both its bindings and its alias table, so the two
//! stacks are pushed and popped together. A binding is a shared [`Slot`]; a
//! `ref` parameter (or a method's `this`) is bound to the *same* slot as the
//! caller variable it aliases, which makes a write through any name in an
//! alias chain immediately visible through every other name in that chain.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::error::{BrewinError, Result};
use crate::value::Value;

/// Storage cell for one variable.
pub type Slot = Rc<RefCell<Value>>;

#[derive(Debug, Default)]
struct Frame {
    /// Insertion-ordered so closure captures are built deterministically.
    bindings: IndexMap<String, Slot>,

    /// Local name → name of the caller variable it aliases.
    aliases: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
        debug!("Pushed scope, depth now {}", self.frames.len());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
        debug!("Popped scope, depth now {}", self.frames.len());
    }

    /// Innermost binding of `name` among `frames[range]`, with its frame index.
    pub fn slot_in(&self, name: &str, range: Range<usize>) -> Option<(usize, Slot)> {
        let end = range.end.min(self.frames.len());
        let start = range.start.min(end);

        self.frames[start..end]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, frame)| {
                frame
                    .bindings
                    .get(name)
                    .map(|slot| (start + i, Rc::clone(slot)))
            })
    }

    /// Innermost binding of `name` in any frame.
    pub fn slot(&self, name: &str) -> Option<(usize, Slot)> {
        self.slot_in(name, 0..self.frames.len())
    }

    /// Gentle lookup restricted to `frames[range]`.
    pub fn probe_in(&self, name: &str, range: Range<usize>) -> Option<Value> {
        self.slot_in(name, range)
            .map(|(_, slot)| slot.borrow().clone())
    }

    /// Gentle lookup: `None` instead of a NameError.
    pub fn probe(&self, name: &str) -> Option<Value> {
        self.probe_in(name, 0..self.frames.len())
    }

    /// Read `name`, innermost frame first. Aliases read their ultimate owner's
    /// current value because they share its slot.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        self.probe(name)
            .ok_or_else(|| BrewinError::name(format!("variable {} has not been defined", name)))
    }

    /// Overwrite the innermost binding of `name` among `frames[range]`.
    /// Returns `false` when no such binding exists.
    pub fn assign_in(&mut self, name: &str, value: Value, range: Range<usize>) -> bool {
        match self.slot_in(name, range) {
            Some((index, slot)) => {
                self.log_write(name, index);
                *slot.borrow_mut() = value;
                true
            }
            None => false,
        }
    }

    /// Overwrite the innermost binding of `name`, or create it in the
    /// innermost frame. The write reaches every alias of the variable.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.slot(name) {
            Some((index, slot)) => {
                self.log_write(name, index);
                *slot.borrow_mut() = value;
            }
            None => self.define(name, value),
        }
    }

    /// Bind `name` to a fresh slot in the innermost frame.
    pub fn define(&mut self, name: &str, value: Value) {
        let depth = self.frames.len();

        if let Some(frame) = self.frames.last_mut() {
            debug!("Defining '{}' in frame {}", name, depth - 1);
            frame.aliases.remove(name);
            frame
                .bindings
                .insert(name.to_string(), Rc::new(RefCell::new(value)));
        }
    }

    /// Bind `name` in the innermost frame as an alias of the caller variable
    /// `target`, sharing its storage.
    pub fn bind_alias(&mut self, name: &str, target: &str, slot: Slot) {
        if let Some(frame) = self.frames.last_mut() {
            debug!("Binding '{}' as alias of '{}'", name, target);
            frame.bindings.insert(name.to_string(), slot);
            frame.aliases.insert(name.to_string(), target.to_string());
        }
    }

    /// Walk the alias chain starting at the innermost binding of `name` and
    /// return the ultimate owner's frame index and name.
    pub fn owner_of(&self, name: &str) -> Option<(usize, String)> {
        let (mut index, _) = self.slot(name)?;
        let mut current: String = name.to_string();

        while let Some(target) = self.frames[index].aliases.get(&current) {
            // The aliased variable lives somewhere below this frame.
            let (below, _) = self.slot_in(target, 0..index)?;
            current = target.clone();
            index = below;
        }

        Some((index, current))
    }

    fn log_write(&self, name: &str, index: usize) {
        match self.owner_of(name) {
            Some((owner_index, owner)) if owner != name => debug!(
                "Writing '{}' in frame {} through alias of '{}' in frame {}",
                name, index, owner, owner_index
            ),
            _ => debug!("Writing '{}' in frame {}", name, index),
        }
    }

    /// Every (name, value) pair visible from `frames[range]`; inner frames
    /// shadow outer ones. Ordered innermost frame first, then by definition
    /// order within a frame.
    pub fn visible_in(&self, range: Range<usize>) -> IndexMap<String, Value> {
        let end = range.end.min(self.frames.len());
        let start = range.start.min(end);
        let mut visible: IndexMap<String, Value> = IndexMap::new();

        for frame in self.frames[start..end].iter().rev() {
            for (name, slot) in &frame.bindings {
                visible
                    .entry(name.clone())
                    .or_insert_with(|| slot.borrow().clone());
            }
        }

        visible
    }
}
