use super::resolve_operand;
use crate::engine::NodeExecutor;
use crate::types::{ExecutionError, ExecutionState, Node, NodeDescriptor};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// 数值比较节点: a op b -> 布尔 result
pub struct CompareNode;

#[async_trait]
impl NodeExecutor for CompareNode {
    async fn execute(
        &self,
        node: &Node,
        inputs: &Map<String, Value>,
        _state: &mut ExecutionState,
    ) -> Result<Map<String, Value>, ExecutionError> {
        let a = resolve_operand("a", inputs, &node.properties)?;
        let b = resolve_operand("b", inputs, &node.properties)?;
        let operator = node
            .properties
            .get("operator")
            .and_then(Value::as_str)
            .unwrap_or("==");

        let result = match operator {
            ">" => a > b,
            ">=" => a >= b,
            "<" => a < b,
            "<=" => a <= b,
            "==" => (a - b).abs() < f64::EPSILON,
            "!=" => (a - b).abs() >= f64::EPSILON,
            other => return Err(ExecutionError::UnknownOperator(other.to_string())),
        };

        let mut outputs = Map::new();
        outputs.insert("result".to_string(), json!(result));
        Ok(outputs)
    }

    fn get_descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            type_name: "compare".to_string(),
            name: "比较节点".to_string(),
            description: "比较两个数值, 输出布尔结果".to_string(),
        }
    }
}
