//! Polymorphic comparison. `equal` and `less` are the primitives; the other
//! four comparators are derived from them.

use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::object::{Object, ObjectHolder, is_true};

const EQ_METHOD: &str = "__eq__";
const LESS_METHOD: &str = "__lt__";

/// Comparator selected by a comparison expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl Comparator {
    pub fn apply(
        self,
        lhs: &ObjectHolder,
        rhs: &ObjectHolder,
        context: &mut dyn Context,
    ) -> Result<bool, RuntimeError> {
        match self {
            Comparator::Equal => equal(lhs, rhs, context),
            Comparator::NotEqual => not_equal(lhs, rhs, context),
            Comparator::Less => less(lhs, rhs, context),
            Comparator::Greater => greater(lhs, rhs, context),
            Comparator::LessOrEqual => less_or_equal(lhs, rhs, context),
            Comparator::GreaterOrEqual => greater_or_equal(lhs, rhs, context),
        }
    }
}

pub fn equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    let left = lhs.get();
    let right = rhs.get();
    match (left.as_deref(), right.as_deref()) {
        (Some(Object::Number(a)), Some(Object::Number(b))) => return Ok(a == b),
        (Some(Object::String(a)), Some(Object::String(b))) => return Ok(a == b),
        (Some(Object::Bool(a)), Some(Object::Bool(b))) => return Ok(a == b),
        (None, None) => return Ok(true),
        _ => {}
    }
    if let Some(object) = &left
        && let Object::Instance(instance) = &**object
    {
        let verdict = instance.call(EQ_METHOD, std::slice::from_ref(rhs), context)?;
        return Ok(is_true(&verdict));
    }
    if lhs.is_same(rhs) {
        return Ok(true);
    }
    Err(RuntimeError::Uncomparable {
        comparison: "equality",
    })
}

pub fn less(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    let left = lhs.get();
    let right = rhs.get();
    match (left.as_deref(), right.as_deref()) {
        (Some(Object::Number(a)), Some(Object::Number(b))) => return Ok(a < b),
        (Some(Object::String(a)), Some(Object::String(b))) => return Ok(a < b),
        (Some(Object::Bool(a)), Some(Object::Bool(b))) => return Ok(a < b),
        _ => {}
    }
    if let Some(object) = &left
        && let Object::Instance(instance) = &**object
    {
        let verdict = instance.call(LESS_METHOD, std::slice::from_ref(rhs), context)?;
        return Ok(is_true(&verdict));
    }
    Err(RuntimeError::Uncomparable { comparison: "less" })
}

pub fn not_equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    Ok(!equal(lhs, rhs, context)?)
}

/// `greater` resurfaces any failure of its primitives under its own name.
pub fn greater(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    let outcome = match less(lhs, rhs, context) {
        Ok(true) => Ok(false),
        Ok(false) => equal(lhs, rhs, context).map(|eq| !eq),
        Err(error) => Err(error),
    };
    outcome.map_err(|_| RuntimeError::Uncomparable {
        comparison: "greater",
    })
}

pub fn less_or_equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    if less(lhs, rhs, context)? {
        return Ok(true);
    }
    equal(lhs, rhs, context)
}

pub fn greater_or_equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, context)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::context::BufferContext;
    use std::rc::Rc;

    fn number(value: i64) -> ObjectHolder {
        ObjectHolder::own(Object::Number(value))
    }

    fn text(value: &str) -> ObjectHolder {
        ObjectHolder::own(Object::String(value.to_string()))
    }

    fn boolean(value: bool) -> ObjectHolder {
        ObjectHolder::own(Object::Bool(value))
    }

    #[test]
    fn compares_matching_primitive_kinds_directly() {
        let mut context = BufferContext::new();
        assert_eq!(equal(&number(2), &number(2), &mut context), Ok(true));
        assert_eq!(equal(&number(2), &number(3), &mut context), Ok(false));
        assert_eq!(equal(&text("a"), &text("a"), &mut context), Ok(true));
        assert_eq!(equal(&boolean(true), &boolean(false), &mut context), Ok(false));
        assert_eq!(less(&number(2), &number(3), &mut context), Ok(true));
        assert_eq!(less(&text("a"), &text("b"), &mut context), Ok(true));
        assert_eq!(less(&boolean(false), &boolean(true), &mut context), Ok(true));
    }

    #[test]
    fn two_absent_values_are_equal() {
        let mut context = BufferContext::new();
        assert_eq!(
            equal(&ObjectHolder::none(), &ObjectHolder::none(), &mut context),
            Ok(true)
        );
    }

    #[test]
    fn identical_referents_are_equal_even_without_eq_method() {
        let mut context = BufferContext::new();
        let class = Rc::new(crate::runtime::class::Class::new(
            "C".to_string(),
            Vec::new(),
            None,
        ));
        let object = Rc::new(Object::Class(class));
        let first = ObjectHolder::from_rc(Rc::clone(&object));
        let second = ObjectHolder::from_rc(object);
        assert_eq!(equal(&first, &second, &mut context), Ok(true));
    }

    #[test]
    fn mismatched_kinds_are_uncomparable() {
        let mut context = BufferContext::new();
        assert_eq!(
            equal(&number(1), &text("1"), &mut context),
            Err(RuntimeError::Uncomparable {
                comparison: "equality"
            })
        );
        assert_eq!(
            less(&number(1), &ObjectHolder::none(), &mut context),
            Err(RuntimeError::Uncomparable { comparison: "less" })
        );
    }

    #[test]
    fn derivatives_follow_their_definitions() {
        let mut context = BufferContext::new();
        assert_eq!(not_equal(&number(1), &number(2), &mut context), Ok(true));
        assert_eq!(greater(&number(3), &number(2), &mut context), Ok(true));
        assert_eq!(greater(&number(2), &number(2), &mut context), Ok(false));
        assert_eq!(less_or_equal(&number(2), &number(2), &mut context), Ok(true));
        assert_eq!(less_or_equal(&number(3), &number(2), &mut context), Ok(false));
        assert_eq!(greater_or_equal(&number(2), &number(2), &mut context), Ok(true));
        assert_eq!(greater_or_equal(&number(1), &number(2), &mut context), Ok(false));
    }

    #[test]
    fn greater_reports_its_own_comparison_on_failure() {
        let mut context = BufferContext::new();
        assert_eq!(
            greater(&number(1), &text("x"), &mut context),
            Err(RuntimeError::Uncomparable {
                comparison: "greater"
            })
        );
    }
}
