use thiserror::Error;

/// Typed failures raised while evaluating a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined field '{field}'")]
    UndefinedField { field: String },
    #[error("Expected a class instance, got {type_name}")]
    NotAnInstance { type_name: &'static str },
    #[error("Unknown method '{method}' of class '{class}'")]
    UnknownMethod { method: String, class: String },
    #[error("Method '{method}' expected {expected} arguments, got {found}")]
    MethodArityMismatch {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("Operation '{operation}' is not supported for {lhs} and {rhs}")]
    UnsupportedOperands {
        operation: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Operation '{operation}' expects a boolean operand, got {type_name}")]
    NotABool {
        operation: &'static str,
        type_name: &'static str,
    },
    #[error("Condition must evaluate to a boolean, got {type_name}")]
    ConditionNotBool { type_name: &'static str },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Cannot compare objects for {comparison}")]
    Uncomparable { comparison: &'static str },
    #[error("Return outside of a method body")]
    ReturnOutsideMethod,
    #[error("Failed to write program output")]
    OutputWrite,
}
