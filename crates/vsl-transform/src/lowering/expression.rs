use vsl_core::{
    ast::{BinaryOperator, Expression, FunctionCall},
    values::Value,
};

use super::{context::LoweringContext, errors::LoweringResult};

impl LoweringContext<'_> {
    pub fn lower_expression(&mut self, expr: &Expression) -> LoweringResult<Value> {
        match expr {
            Expression::Number(n) => Ok(Value::number(n.value())),
            Expression::Identifier(name) => {
                let location = self.scopes.resolve(name.as_str())?;
                Ok(self.builder.ins()?.load(location))
            }
            Expression::Negate(operand) => {
                let operand = self.lower_expression(operand)?;
                Ok(self.builder.ins()?.fneg(operand))
            }
            Expression::Binary { op, left, right } => {
                let left = self.lower_expression(left)?;
                let right = self.lower_expression(right)?;
                let ins = self.builder.ins()?;
                Ok(match op {
                    BinaryOperator::Add => ins.fadd(left, right),
                    BinaryOperator::Sub => ins.fsub(left, right),
                    BinaryOperator::Mul => ins.fmul(left, right),
                    BinaryOperator::Div => ins.fdiv(left, right),
                })
            }
            Expression::Call(call) => self.lower_call(call),
        }
    }

    fn lower_call(&mut self, call: &FunctionCall) -> LoweringResult<Value> {
        let callee = call.callee.as_str();
        self.functions.check_call(callee, call.arguments.len())?;

        let args = call
            .arguments
            .iter()
            .map(|arg| self.lower_expression(arg))
            .collect::<LoweringResult<Vec<_>>>()?;
        Ok(self.builder.ins()?.call(callee, args))
    }

    /// `test > 0.0`, ordered: NaN is false.
    pub fn lower_condition(&mut self, test: &Expression) -> LoweringResult<Value> {
        let value = self.lower_expression(test)?;
        Ok(self.builder.ins()?.fcmp_gt(value, Value::number(0.0)))
    }
}
