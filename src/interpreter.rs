//! Tree-walking evaluator.
//!
//! Executes `ast::Statement` nodes against a closure and a `Context`. The
//! return signal travels as `Flow::Return` through every composite node and
//! is translated back into a plain value at the `MethodBody` boundary;
//! errors use the ordinary `Result` channel and are never caught here.

use std::io::Write;
use std::rc::Rc;

use crate::ast::{Program, Statement};
use crate::runtime::class::ClassInstance;
use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::object::{Closure, ExecResult, Executable, Flow, Object, ObjectHolder};

const ADD_METHOD: &str = "__add__";
const INIT_METHOD: &str = "__init__";

/// Unwraps a sub-node's flow, forwarding a return marker to the caller
/// unchanged.
macro_rules! value_of {
    ($flow:expr) => {
        match $flow {
            Flow::Value(value) => value,
            Flow::Return(value) => return Ok(Flow::Return(value)),
        }
    };
}

/// Executes a parsed program against `closure`, writing through `context`.
/// A `return` escaping the top level is an error.
pub fn run_program(
    program: &Program,
    closure: &mut Closure,
    context: &mut dyn Context,
) -> Result<(), RuntimeError> {
    for statement in &program.statements {
        match statement.execute(closure, context)? {
            Flow::Value(_) => {}
            Flow::Return(_) => return Err(RuntimeError::ReturnOutsideMethod),
        }
    }
    Ok(())
}

impl Executable for Statement {
    fn execute(&self, closure: &mut Closure, context: &mut dyn Context) -> ExecResult {
        match self {
            Statement::NumericConst(value) => value_flow(ObjectHolder::own(Object::Number(*value))),
            Statement::StringConst(value) => {
                value_flow(ObjectHolder::own(Object::String(value.clone())))
            }
            Statement::BoolConst(value) => value_flow(ObjectHolder::own(Object::Bool(*value))),
            Statement::None => value_flow(ObjectHolder::none()),
            Statement::VariableValue { dotted_ids } => variable_value(dotted_ids, closure),
            Statement::Assignment { var, value } => {
                let value = value_of!(value.execute(closure, context)?);
                closure.insert(var.clone(), value.clone());
                value_flow(value)
            }
            Statement::FieldAssignment {
                object,
                field,
                value,
            } => {
                let target = value_of!(object.execute(closure, context)?);
                let value = value_of!(value.execute(closure, context)?);
                with_instance(&target, |instance| {
                    instance.set_field(field.clone(), value.clone());
                })?;
                value_flow(value)
            }
            Statement::Print { args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(value_of!(arg.execute(closure, context)?));
                }
                print_values(&values, context)?;
                value_flow(ObjectHolder::none())
            }
            Statement::Stringify { arg } => {
                let value = value_of!(arg.execute(closure, context)?);
                let text = stringify(&value, context)?;
                value_flow(ObjectHolder::own(Object::String(text)))
            }
            Statement::Add { lhs, rhs } => {
                let lhs = value_of!(lhs.execute(closure, context)?);
                let rhs = value_of!(rhs.execute(closure, context)?);
                value_flow(add_values(&lhs, &rhs, context)?)
            }
            Statement::Sub { lhs, rhs } => {
                let lhs = value_of!(lhs.execute(closure, context)?);
                let rhs = value_of!(rhs.execute(closure, context)?);
                let (a, b) = numeric_operands(&lhs, &rhs, "-")?;
                value_flow(ObjectHolder::own(Object::Number(a - b)))
            }
            Statement::Mult { lhs, rhs } => {
                let lhs = value_of!(lhs.execute(closure, context)?);
                let rhs = value_of!(rhs.execute(closure, context)?);
                let (a, b) = numeric_operands(&lhs, &rhs, "*")?;
                value_flow(ObjectHolder::own(Object::Number(a * b)))
            }
            Statement::Div { lhs, rhs } => {
                let lhs = value_of!(lhs.execute(closure, context)?);
                let rhs = value_of!(rhs.execute(closure, context)?);
                let (a, b) = numeric_operands(&lhs, &rhs, "/")?;
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                value_flow(ObjectHolder::own(Object::Number(a / b)))
            }
            Statement::Or { lhs, rhs } => {
                let left = value_of!(lhs.execute(closure, context)?);
                if expect_bool(&left, "or")? {
                    // Short-circuit: the right operand is not evaluated.
                    return value_flow(ObjectHolder::own(Object::Bool(true)));
                }
                let right = value_of!(rhs.execute(closure, context)?);
                let verdict = expect_bool(&right, "or")?;
                value_flow(ObjectHolder::own(Object::Bool(verdict)))
            }
            Statement::And { lhs, rhs } => {
                let left = value_of!(lhs.execute(closure, context)?);
                if !expect_bool(&left, "and")? {
                    // Short-circuit: the right operand is not evaluated.
                    return value_flow(ObjectHolder::own(Object::Bool(false)));
                }
                let right = value_of!(rhs.execute(closure, context)?);
                let verdict = expect_bool(&right, "and")?;
                value_flow(ObjectHolder::own(Object::Bool(verdict)))
            }
            Statement::Not { arg } => {
                let value = value_of!(arg.execute(closure, context)?);
                let verdict = expect_bool(&value, "not")?;
                value_flow(ObjectHolder::own(Object::Bool(!verdict)))
            }
            Statement::Comparison {
                comparator,
                lhs,
                rhs,
            } => {
                let lhs = value_of!(lhs.execute(closure, context)?);
                let rhs = value_of!(rhs.execute(closure, context)?);
                let verdict = comparator.apply(&lhs, &rhs, context)?;
                value_flow(ObjectHolder::own(Object::Bool(verdict)))
            }
            Statement::IfElse {
                condition,
                if_body,
                else_body,
            } => {
                let condition = value_of!(condition.execute(closure, context)?);
                let chosen = condition
                    .as_bool()
                    .ok_or(RuntimeError::ConditionNotBool {
                        type_name: condition.type_name(),
                    })?;
                if chosen {
                    if_body.execute(closure, context)
                } else if let Some(else_body) = else_body {
                    else_body.execute(closure, context)
                } else {
                    value_flow(ObjectHolder::none())
                }
            }
            Statement::Compound { statements } => {
                for statement in statements {
                    value_of!(statement.execute(closure, context)?);
                }
                value_flow(ObjectHolder::none())
            }
            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                let object = value_of!(object.execute(closure, context)?);
                let mut actual_args = Vec::with_capacity(args.len());
                for arg in args {
                    actual_args.push(value_of!(arg.execute(closure, context)?));
                }
                let result =
                    with_instance(&object, |instance| instance.call(method, &actual_args, context))??;
                value_flow(result)
            }
            Statement::NewInstance { class, args } => {
                let mut actual_args = Vec::with_capacity(args.len());
                for arg in args {
                    actual_args.push(value_of!(arg.execute(closure, context)?));
                }
                let instance_object = ClassInstance::new(Rc::clone(class));
                if let Object::Instance(instance) = &*instance_object
                    && instance.has_method(INIT_METHOD, actual_args.len())
                {
                    instance.call(INIT_METHOD, &actual_args, context)?;
                }
                value_flow(ObjectHolder::from_rc(instance_object))
            }
            Statement::ClassDefinition { class } => {
                let holder = ObjectHolder::own(Object::Class(Rc::clone(class)));
                closure.insert(class.name().to_string(), holder.clone());
                value_flow(holder)
            }
            Statement::MethodBody { body } => match body.execute(closure, context)? {
                Flow::Return(value) => Ok(Flow::Value(value)),
                Flow::Value(_) => value_flow(ObjectHolder::none()),
            },
            Statement::Return { value } => {
                let value = value_of!(value.execute(closure, context)?);
                Ok(Flow::Return(value))
            }
        }
    }
}

fn value_flow(value: ObjectHolder) -> ExecResult {
    Ok(Flow::Value(value))
}

fn variable_value(dotted_ids: &[String], closure: &Closure) -> ExecResult {
    let mut value = closure
        .get(&dotted_ids[0])
        .cloned()
        .ok_or_else(|| RuntimeError::UndefinedVariable {
            name: dotted_ids[0].clone(),
        })?;
    for field in &dotted_ids[1..] {
        value = with_instance(&value, |instance| instance.field(field))?.ok_or_else(|| {
            RuntimeError::UndefinedField {
                field: field.clone(),
            }
        })?;
    }
    Ok(Flow::Value(value))
}

fn with_instance<R>(
    holder: &ObjectHolder,
    action: impl FnOnce(&ClassInstance) -> R,
) -> Result<R, RuntimeError> {
    let object = holder.get().ok_or(RuntimeError::NotAnInstance {
        type_name: holder.type_name(),
    })?;
    match &*object {
        Object::Instance(instance) => Ok(action(instance)),
        _ => Err(RuntimeError::NotAnInstance {
            type_name: holder.type_name(),
        }),
    }
}

fn print_values(values: &[ObjectHolder], context: &mut dyn Context) -> Result<(), RuntimeError> {
    // The line is rendered into a local buffer first: printing an instance
    // may execute its __str__ method, which needs the context.
    let mut line: Vec<u8> = Vec::new();
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            line.push(b' ');
        }
        value.print(&mut line, context)?;
    }
    line.push(b'\n');
    context
        .output_stream()
        .write_all(&line)
        .map_err(|_| RuntimeError::OutputWrite)
}

fn stringify(value: &ObjectHolder, context: &mut dyn Context) -> Result<String, RuntimeError> {
    let mut rendered: Vec<u8> = Vec::new();
    value.print(&mut rendered, context)?;
    Ok(String::from_utf8_lossy(&rendered).into_owned())
}

fn add_values(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<ObjectHolder, RuntimeError> {
    let left = lhs.get();
    let right = rhs.get();
    match (left.as_deref(), right.as_deref()) {
        (Some(Object::Number(a)), Some(Object::Number(b))) => {
            return Ok(ObjectHolder::own(Object::Number(a + b)));
        }
        (Some(Object::String(a)), Some(Object::String(b))) => {
            return Ok(ObjectHolder::own(Object::String(format!("{a}{b}"))));
        }
        (Some(Object::Instance(instance)), _) if instance.has_method(ADD_METHOD, 1) => {
            return instance.call(ADD_METHOD, std::slice::from_ref(rhs), context);
        }
        _ => {}
    }
    Err(unsupported("+", lhs, rhs))
}

fn numeric_operands(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    operation: &'static str,
) -> Result<(i64, i64), RuntimeError> {
    match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(operation, lhs, rhs)),
    }
}

fn expect_bool(value: &ObjectHolder, operation: &'static str) -> Result<bool, RuntimeError> {
    value.as_bool().ok_or(RuntimeError::NotABool {
        operation,
        type_name: value.type_name(),
    })
}

fn unsupported(operation: &'static str, lhs: &ObjectHolder, rhs: &ObjectHolder) -> RuntimeError {
    RuntimeError::UnsupportedOperands {
        operation,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}
