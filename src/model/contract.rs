//! Function contracts.
//!
//! A [`Contract`] states caller visible guarantees about a function, for example
//! `returns(true) implies (x != null)` or `callsInPlace(block, EXACTLY_ONCE)`.

use strum::{EnumIter, FromRepr};

use crate::model::{flags::EffectExpressionFlags, names::NameFunction, types::KotlinType};

/// The contract of a function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contract {
    /// Effects, in declaration order
    pub effects: Vec<Effect>,
}

/// Kind of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum EffectType {
    /// `returns(value)`
    #[default]
    ReturnsConstant = 0,
    /// `callsInPlace(lambda)`
    Calls = 1,
    /// `returnsNotNull()`
    ReturnsNotNull = 2,
}

/// How often a lambda is invoked by a `callsInPlace` effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum InvocationKind {
    /// At most once
    AtMostOnce = 0,
    /// Exactly once
    ExactlyOnce = 1,
    /// At least once
    AtLeastOnce = 2,
}

/// A single effect of a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    /// Kind of the effect
    pub effect_type: EffectType,
    /// Invocation kind, for `callsInPlace` effects
    pub invocation_kind: Option<InvocationKind>,
    /// Arguments of the effect constructor
    pub constructor_arguments: Vec<EffectExpression>,
    /// Condition implied by the effect
    pub conclusion: Option<EffectExpression>,
}

impl Effect {
    /// Creates an effect without arguments or conclusion
    #[must_use]
    pub fn new(effect_type: EffectType) -> Self {
        Effect {
            effect_type,
            invocation_kind: None,
            constructor_arguments: Vec::new(),
            conclusion: None,
        }
    }
}

/// A constant appearing in an effect expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum ConstantValue {
    /// `true`
    True = 0,
    /// `false`
    False = 1,
    /// `null`
    Null = 2,
}

/// A boolean expression over function parameters.
///
/// An expression is a leaf (parameter reference, constant or `is` check) optionally
/// combined with further expressions through conjunction and disjunction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectExpression {
    /// Expression flags
    pub flags: EffectExpressionFlags,
    /// Referenced value parameter, `0` is the receiver and `n` the n-th parameter
    pub parameter_index: Option<u32>,
    /// Constant the parameter is compared to
    pub constant_value: Option<ConstantValue>,
    /// Type of an `is` check on the parameter
    pub is_instance_type: Option<KotlinType>,
    /// Expressions joined with `&&`
    pub and_arguments: Vec<EffectExpression>,
    /// Expressions joined with `||`
    pub or_arguments: Vec<EffectExpression>,
}

impl EffectExpression {
    /// Creates an expression referring to a parameter
    #[must_use]
    pub fn parameter(index: u32) -> Self {
        EffectExpression {
            parameter_index: Some(index),
            ..Default::default()
        }
    }

    /// Creates a constant expression
    #[must_use]
    pub fn constant(value: ConstantValue) -> Self {
        EffectExpression {
            constant_value: Some(value),
            ..Default::default()
        }
    }

    /// Number of nested expression levels below and including this one
    #[must_use]
    pub fn depth(&self) -> usize {
        self.and_arguments
            .iter()
            .chain(&self.or_arguments)
            .map(EffectExpression::depth)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Applies `f` to every class reference in this expression
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        if let Some(ty) = &mut self.is_instance_type {
            ty.map_class_names(f);
        }
        for nested in self.and_arguments.iter_mut().chain(&mut self.or_arguments) {
            nested.map_class_names(f);
        }
    }
}

impl Contract {
    /// Applies `f` to every class reference in the contract
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for effect in &mut self.effects {
            for expression in effect
                .constructor_arguments
                .iter_mut()
                .chain(effect.conclusion.as_mut())
            {
                expression.map_class_names(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_depth() {
        let mut expr = EffectExpression::parameter(1);
        assert_eq!(expr.depth(), 1);

        let mut inner = EffectExpression::constant(ConstantValue::Null);
        inner.or_arguments.push(EffectExpression::parameter(2));
        expr.and_arguments.push(inner);
        assert_eq!(expr.depth(), 3);
    }
}
