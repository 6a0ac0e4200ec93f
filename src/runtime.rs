//! Runtime object model shared by the evaluator: values and their shared
//! handles, classes and instances, comparison, truthiness, and the host
//! `Context` the interpreter writes output through.

pub mod class;
pub mod compare;
pub mod context;
pub mod error;
pub mod object;

pub use class::{Class, ClassInstance, Method};
pub use compare::Comparator;
pub use context::{BufferContext, Context, StandardContext};
pub use error::RuntimeError;
pub use object::{Closure, ExecResult, Executable, Flow, Object, ObjectHolder, is_true};
