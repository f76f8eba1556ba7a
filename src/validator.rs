//! Static validation of parsed rules.
//!
//! Walks the whole tree without evaluating anything, checking every call
//! and variable name against the fixed allow-lists. Stored rules get run
//! through this at authoring time so a typo surfaces before the rule is
//! ever pointed at real hardware — evaluation alone would miss names in
//! branches that short-circuiting skips.

use crate::ast::Expr;
use crate::device::Var;
use crate::errors::EvalError;
use crate::evaluator::Func;

/// Check an expression for unknown function and variable names.
///
/// Returns the first violation found, with its position.
pub fn validate(expr: &Expr) -> Result<(), EvalError> {
    match expr {
        Expr::Call(call) => {
            if Func::lookup(&call.name).is_none() {
                return Err(EvalError::UnknownFunction {
                    pos: call.pos,
                    name: call.name.clone(),
                });
            }
            for arg in &call.args {
                validate(arg)?;
            }
            Ok(())
        }
        Expr::Variable(var) => {
            if Var::lookup(&var.name).is_none() {
                return Err(EvalError::UnknownVariable {
                    pos: var.pos,
                    name: format!("@{}", var.name),
                });
            }
            Ok(())
        }
        Expr::Str(_) | Expr::Number(_) | Expr::Bool(_) => Ok(()),
    }
}
