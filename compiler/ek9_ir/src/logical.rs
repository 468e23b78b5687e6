//! Short-circuit `and` / `or`.

use ek9_tree::ast::LogicalOp;

use crate::{Instr, ScopeId, Var};

/// Instructions producing `value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct OperandEvaluation {
    pub instructions: Vec<Instr>,
    pub value: Var,
}

/// Instructions extracting the primitive boolean `primitive`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionEvaluation {
    pub instructions: Vec<Instr>,
    pub primitive: Var,
}

/// Generic short-circuit block.
///
/// Execution:
/// 1. run `left`, then `condition` on the left value;
/// 2. for AND a false primitive (for OR a true one) short-circuits:
///    `result` becomes the left value;
/// 3. otherwise run `right`, then `result_computation`, which writes
///    `result` (`left._and(right)` / `left._or(right)`).
///
/// `result` is raw: whoever consumes it retains and registers it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct LogicalBlock {
    pub op: LogicalOp,
    pub result: Var,
    pub left: OperandEvaluation,
    pub condition: ConditionEvaluation,
    pub right: OperandEvaluation,
    pub result_computation: OperandEvaluation,
    /// Scope the operand temporaries are registered to.
    pub scope: ScopeId,
}

impl LogicalBlock {
    pub fn sequences(&self) -> Vec<&[Instr]> {
        vec![
            self.left.instructions.as_slice(),
            self.condition.instructions.as_slice(),
            self.right.instructions.as_slice(),
            self.result_computation.instructions.as_slice(),
        ]
    }

    /// Whether the left primitive alone decides the result.
    pub fn short_circuits_on(&self, left_true: bool) -> bool {
        match self.op {
            LogicalOp::And => !left_true,
            LogicalOp::Or => left_true,
        }
    }
}
