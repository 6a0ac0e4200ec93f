use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::{Rc, Weak};

use crate::runtime::class::{Class, ClassInstance};
use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;

/// Local environment of a method invocation or of the top-level program:
/// identifier text mapped to value handles. There is no nested scope chain;
/// assignment always writes into the current closure.
pub type Closure = HashMap<String, ObjectHolder>;

/// Outcome of executing a single AST node.
///
/// `Return` is the non-local exit raised by a `return` statement. Every
/// composite node forwards it unchanged; only a method body translates it
/// back into a plain value. It deliberately lives on the value channel, not
/// the error channel.
#[derive(Debug)]
pub enum Flow {
    Value(ObjectHolder),
    Return(ObjectHolder),
}

pub type ExecResult = Result<Flow, RuntimeError>;

/// Anything the runtime can execute against a closure and a context. Method
/// bodies are stored behind this trait so the object model does not depend
/// on the concrete statement set.
pub trait Executable: fmt::Debug {
    fn execute(&self, closure: &mut Closure, context: &mut dyn Context) -> ExecResult;
}

/// A runtime value.
#[derive(Debug)]
pub enum Object {
    Number(i64),
    String(String),
    Bool(bool),
    Class(Rc<Class>),
    Instance(ClassInstance),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Number(_) => "number",
            Object::String(_) => "string",
            Object::Bool(_) => "bool",
            Object::Class(_) => "class",
            Object::Instance(_) => "class instance",
        }
    }

    /// Renders the value into `out`. Class instances dispatch to their
    /// `__str__` method and print nothing when the class chain does not
    /// define one.
    pub fn print(&self, out: &mut dyn Write, context: &mut dyn Context) -> Result<(), RuntimeError> {
        match self {
            Object::Number(value) => write_output(out, format_args!("{value}")),
            Object::String(value) => write_output(out, format_args!("{value}")),
            Object::Bool(true) => write_output(out, format_args!("True")),
            Object::Bool(false) => write_output(out, format_args!("False")),
            Object::Class(class) => write_output(out, format_args!("Class {}", class.name())),
            Object::Instance(instance) => instance.print(out, context),
        }
    }
}

pub(crate) fn write_output(out: &mut dyn Write, args: fmt::Arguments<'_>) -> Result<(), RuntimeError> {
    out.write_fmt(args).map_err(|_| RuntimeError::OutputWrite)
}

/// Shared handle to a runtime value.
///
/// A holder is absent (the `None` value), an owning handle, or a non-owning
/// back-reference. The back-reference form exists for the `self` binding:
/// an instance's own field store points at the instance without keeping it
/// alive, so dropping the last external holder drops the instance.
#[derive(Debug, Clone, Default)]
pub struct ObjectHolder {
    handle: Handle,
}

#[derive(Debug, Clone, Default)]
enum Handle {
    #[default]
    None,
    Owned(Rc<Object>),
    Backref(Weak<Object>),
}

impl ObjectHolder {
    /// The absent value.
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps a fresh value in an owning handle.
    pub fn own(object: Object) -> Self {
        Self::from_rc(Rc::new(object))
    }

    pub fn from_rc(object: Rc<Object>) -> Self {
        Self {
            handle: Handle::Owned(object),
        }
    }

    /// Non-owning handle that resolves for as long as the referent is alive.
    pub fn backref(object: Weak<Object>) -> Self {
        Self {
            handle: Handle::Backref(object),
        }
    }

    /// Resolves the handle. `None` for the absent value and for a
    /// back-reference whose referent has been dropped.
    pub fn get(&self) -> Option<Rc<Object>> {
        match &self.handle {
            Handle::None => None,
            Handle::Owned(object) => Some(Rc::clone(object)),
            Handle::Backref(object) => object.upgrade(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.get().is_none()
    }

    pub fn type_name(&self) -> &'static str {
        match self.get() {
            Some(object) => object.type_name(),
            None => "None",
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self.get().as_deref() {
            Some(Object::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.get().as_deref() {
            Some(Object::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self.get().as_deref() {
            Some(Object::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Whether both handles resolve to the same underlying object.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(lhs), Some(rhs)) => Rc::ptr_eq(&lhs, &rhs),
            _ => false,
        }
    }

    /// Prints through the holder, rendering the absent value as `None`.
    pub fn print(&self, out: &mut dyn Write, context: &mut dyn Context) -> Result<(), RuntimeError> {
        match self.get() {
            Some(object) => object.print(out, context),
            None => write_output(out, format_args!("None")),
        }
    }
}

/// Truthiness: booleans are themselves, numbers are true when non-zero,
/// strings when non-empty; everything else, the absent value included, is
/// false.
pub fn is_true(object: &ObjectHolder) -> bool {
    match object.get().as_deref() {
        Some(Object::Bool(value)) => *value,
        Some(Object::Number(value)) => *value != 0,
        Some(Object::String(value)) => !value.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::context::BufferContext;

    fn rendered(holder: &ObjectHolder) -> String {
        let mut context = BufferContext::new();
        let mut out = Vec::new();
        holder
            .print(&mut out, &mut context)
            .expect("print should succeed");
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn truthiness_follows_value_kind() {
        assert!(is_true(&ObjectHolder::own(Object::Bool(true))));
        assert!(!is_true(&ObjectHolder::own(Object::Bool(false))));
        assert!(is_true(&ObjectHolder::own(Object::Number(-3))));
        assert!(!is_true(&ObjectHolder::own(Object::Number(0))));
        assert!(is_true(&ObjectHolder::own(Object::String("x".to_string()))));
        assert!(!is_true(&ObjectHolder::own(Object::String(String::new()))));
        assert!(!is_true(&ObjectHolder::none()));
        let class = Rc::new(Class::new("C".to_string(), Vec::new(), None));
        assert!(!is_true(&ObjectHolder::own(Object::Class(class))));
    }

    #[test]
    fn prints_primitive_values() {
        assert_eq!(rendered(&ObjectHolder::own(Object::Number(42))), "42");
        assert_eq!(
            rendered(&ObjectHolder::own(Object::String("hi".to_string()))),
            "hi"
        );
        assert_eq!(rendered(&ObjectHolder::own(Object::Bool(true))), "True");
        assert_eq!(rendered(&ObjectHolder::own(Object::Bool(false))), "False");
        assert_eq!(rendered(&ObjectHolder::none()), "None");
    }

    #[test]
    fn prints_class_with_its_name() {
        let class = Rc::new(Class::new("Point".to_string(), Vec::new(), None));
        assert_eq!(rendered(&ObjectHolder::own(Object::Class(class))), "Class Point");
    }

    #[test]
    fn backref_resolves_only_while_referent_lives() {
        let object = Rc::new(Object::Number(1));
        let holder = ObjectHolder::backref(Rc::downgrade(&object));
        assert_eq!(holder.as_number(), Some(1));
        drop(object);
        assert!(holder.is_none());
        assert_eq!(holder.type_name(), "None");
    }

    #[test]
    fn is_same_distinguishes_referents() {
        let object = Rc::new(Object::Number(1));
        let first = ObjectHolder::from_rc(Rc::clone(&object));
        let second = ObjectHolder::from_rc(object);
        let other = ObjectHolder::own(Object::Number(1));
        assert!(first.is_same(&second));
        assert!(!first.is_same(&other));
        assert!(!ObjectHolder::none().is_same(&ObjectHolder::none()));
    }
}
