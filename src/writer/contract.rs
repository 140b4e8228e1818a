//! Transcription of function contracts.

use crate::{
    model::contract::{Contract, EffectExpression},
    wire::{
        builder::MessageBuilder,
        schema::{NodeKind, CONTRACT, EFFECT, EFFECT_EXPRESSION, FUNCTION},
    },
    Error, Result,
};

use super::{types::TypeSlot, Transcriber};

impl Transcriber {
    /// Writes `contract` below a function builder.
    pub(crate) fn write_contract(
        &self,
        function: &mut MessageBuilder<'_>,
        contract: &Contract,
    ) -> Result<()> {
        let mut builder = function.child(FUNCTION::CONTRACT, NodeKind::Contract)?;

        for effect in &contract.effects {
            let mut effect_builder = builder.child(CONTRACT::EFFECT, NodeKind::Effect)?;
            effect_builder.uint(EFFECT::EFFECT_TYPE, effect.effect_type as u32);
            if let Some(kind) = effect.invocation_kind {
                effect_builder.uint(EFFECT::INVOCATION_KIND, kind as u32);
            }
            if let Some(conclusion) = &effect.conclusion {
                self.write_expression(&mut effect_builder, EFFECT::CONCLUSION, conclusion, 1)?;
            }
            for argument in &effect.constructor_arguments {
                self.write_expression(
                    &mut effect_builder,
                    EFFECT::CONSTRUCTOR_ARGUMENT,
                    argument,
                    1,
                )?;
            }
            effect_builder.close();
        }

        builder.close();
        Ok(())
    }

    fn write_expression(
        &self,
        parent: &mut MessageBuilder<'_>,
        field: u32,
        expression: &EffectExpression,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_type_depth {
            return Err(Error::RecursionLimit(self.max_type_depth));
        }

        let mut builder = parent.child(field, NodeKind::EffectExpression)?;
        builder.uint(EFFECT_EXPRESSION::FLAGS, expression.flags.bits());
        if let Some(index) = expression.parameter_index {
            builder.uint(EFFECT_EXPRESSION::PARAMETER_INDEX, index);
        }
        if let Some(constant) = expression.constant_value {
            builder.uint(EFFECT_EXPRESSION::CONSTANT_VALUE, constant as u32);
        }
        for argument in &expression.and_arguments {
            self.write_expression(
                &mut builder,
                EFFECT_EXPRESSION::AND_ARGUMENT,
                argument,
                depth + 1,
            )?;
        }
        for argument in &expression.or_arguments {
            self.write_expression(
                &mut builder,
                EFFECT_EXPRESSION::OR_ARGUMENT,
                argument,
                depth + 1,
            )?;
        }
        if let Some(ty) = &expression.is_instance_type {
            self.write_type(&mut builder, TypeSlot::IsInstance, ty, depth + 1)?;
        }

        builder.close();
        Ok(())
    }
}
