use std::cell::RefCell;
use std::io::Write;
use std::rc::{Rc, Weak};

use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::object::{Closure, Executable, Flow, Object, ObjectHolder};

pub(crate) const STR_METHOD: &str = "__str__";
pub(crate) const SELF_NAME: &str = "self";

/// A method attached to a class: name, formal parameters in declaration
/// order, and the owned body. Immutable after construction.
#[derive(Debug)]
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Box<dyn Executable>,
}

/// A user-defined class: named methods and an optional parent. Immutable
/// after construction; class graphs are acyclic, so parent edges can be
/// plain shared handles.
#[derive(Debug)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(name: String, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Self {
        Self {
            name,
            methods,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First definition found walking this class, then the parent chain.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.method(name)))
    }

    pub fn has_method(&self, name: &str, argument_count: usize) -> bool {
        self.method(name)
            .is_some_and(|method| method.formal_params.len() == argument_count)
    }
}

/// A live object of a user-defined class.
#[derive(Debug)]
pub struct ClassInstance {
    class: Rc<Class>,
    myself: Weak<Object>,
    fields: RefCell<Closure>,
}

impl ClassInstance {
    /// Allocates a fresh instance. The field store starts out holding
    /// `self` as a non-owning back-reference, so the instance is dropped as
    /// soon as the last external handle goes away.
    pub fn new(class: Rc<Class>) -> Rc<Object> {
        Rc::new_cyclic(|myself: &Weak<Object>| {
            let mut fields = Closure::new();
            fields.insert(SELF_NAME.to_string(), ObjectHolder::backref(myself.clone()));
            Object::Instance(ClassInstance {
                class,
                myself: myself.clone(),
                fields: RefCell::new(fields),
            })
        })
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn field(&self, name: &str) -> Option<ObjectHolder> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: String, value: ObjectHolder) {
        self.fields.borrow_mut().insert(name, value);
    }

    pub fn has_method(&self, method: &str, argument_count: usize) -> bool {
        self.class.has_method(method, argument_count)
    }

    /// Dispatches `method` along the class chain with a fresh closure
    /// holding `self` and the bound arguments.
    pub fn call(
        &self,
        method: &str,
        actual_args: &[ObjectHolder],
        context: &mut dyn Context,
    ) -> Result<ObjectHolder, RuntimeError> {
        let found = self
            .class
            .method(method)
            .ok_or_else(|| RuntimeError::UnknownMethod {
                method: method.to_string(),
                class: self.class.name().to_string(),
            })?;
        if found.formal_params.len() != actual_args.len() {
            return Err(RuntimeError::MethodArityMismatch {
                method: method.to_string(),
                expected: found.formal_params.len(),
                found: actual_args.len(),
            });
        }

        let mut closure = Closure::new();
        closure.insert(SELF_NAME.to_string(), ObjectHolder::backref(self.myself.clone()));
        for (formal, actual) in found.formal_params.iter().zip(actual_args) {
            closure.insert(formal.clone(), actual.clone());
        }

        // Bodies are wrapped in a MethodBody node which already translates
        // the return marker; a stray marker still ends the call with its
        // carried value.
        match found.body.execute(&mut closure, context)? {
            Flow::Value(value) | Flow::Return(value) => Ok(value),
        }
    }

    pub(crate) fn print(
        &self,
        out: &mut dyn Write,
        context: &mut dyn Context,
    ) -> Result<(), RuntimeError> {
        if !self.has_method(STR_METHOD, 0) {
            return Ok(());
        }
        let rendered = self.call(STR_METHOD, &[], context)?;
        rendered.print(out, context)
    }
}
