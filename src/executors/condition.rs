use crate::engine::NodeExecutor;
use crate::types::{ExecutionError, ExecutionState, Node, NodeDescriptor};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// 条件分流节点: 读取单个布尔输入,
/// 只在 true/false 两个输出端口之一上发值
pub struct ConditionCheckNode;

#[async_trait]
impl NodeExecutor for ConditionCheckNode {
    async fn execute(
        &self,
        node: &Node,
        inputs: &Map<String, Value>,
        _state: &mut ExecutionState,
    ) -> Result<Map<String, Value>, ExecutionError> {
        let condition = inputs
            .get("condition")
            .or_else(|| inputs.values().next())
            .or_else(|| node.properties.get("condition"))
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                ExecutionError::InvalidInput("条件输入必须是布尔值".to_string())
            })?;

        let mut outputs = Map::new();
        if condition {
            outputs.insert("true".to_string(), json!(true));
        } else {
            outputs.insert("false".to_string(), json!(true));
        }
        Ok(outputs)
    }

    fn get_descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            type_name: "condition-check".to_string(),
            name: "条件分流节点".to_string(),
            description: "按布尔条件走 true/false 两个输出端口之一".to_string(),
        }
    }
}
