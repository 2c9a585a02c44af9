use crate::engine::NodeExecutor;
use crate::types::{ExecutionError, ExecutionState, Node, NodeDescriptor};
use crate::utils::dice;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Map, Value};

/// 随机数节点: 配置了 dice_notation 时按骰子记法掷骰,
/// 否则在 [min, max) 内取连续均匀值
pub struct RandomNode;

#[async_trait]
impl NodeExecutor for RandomNode {
    async fn execute(
        &self,
        node: &Node,
        _inputs: &Map<String, Value>,
        _state: &mut ExecutionState,
    ) -> Result<Map<String, Value>, ExecutionError> {
        let mut outputs = Map::new();

        if let Some(notation) = node.properties.get("dice_notation").and_then(Value::as_str) {
            let roll = dice::roll_notation(notation)?;
            outputs.insert("result".to_string(), json!(roll.total));
            outputs.insert(
                "details".to_string(),
                json!({
                    "rolls": roll.rolls,
                    "modifier": roll.modifier,
                    "dice": roll.notation,
                }),
            );
            return Ok(outputs);
        }

        let min = node
            .properties
            .get("min")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let max = node
            .properties
            .get("max")
            .and_then(Value::as_f64)
            .unwrap_or(1.0);
        if max <= min {
            return Err(ExecutionError::InvalidRange { min, max });
        }

        let value = rand::thread_rng().gen_range(min..max);
        outputs.insert("result".to_string(), json!(value));
        Ok(outputs)
    }

    fn get_descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            type_name: "random".to_string(),
            name: "随机数节点".to_string(),
            description: "掷骰或生成区间内的均匀随机数".to_string(),
        }
    }
}
