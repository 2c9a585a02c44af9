mod actions;
mod compare;
mod condition;
mod math;
mod random;

pub use actions::ActionStubNode;
pub use compare::CompareNode;
pub use condition::ConditionCheckNode;
pub use math::MathNode;
pub use random::RandomNode;

use crate::types::ExecutionError;
use serde_json::{Map, Value};

/// 操作数解析: 优先取连线输入, 其次取节点属性 (字面量操作数)
pub(crate) fn resolve_operand(
    name: &str,
    inputs: &Map<String, Value>,
    properties: &Map<String, Value>,
) -> Result<f64, ExecutionError> {
    inputs
        .get(name)
        .or_else(|| properties.get(name))
        .and_then(Value::as_f64)
        .ok_or_else(|| ExecutionError::InvalidInput(format!("缺少数值操作数: {}", name)))
}
