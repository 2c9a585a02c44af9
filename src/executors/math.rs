use super::resolve_operand;
use crate::engine::NodeExecutor;
use crate::types::{ExecutionError, ExecutionState, Node, NodeDescriptor};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// 二元算术节点: a op b, op ∈ {+,-,*,/,^,min,max}
pub struct MathNode;

#[async_trait]
impl NodeExecutor for MathNode {
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
            .unwrap_or("+");

        let result = match operator {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => {
                if b == 0.0 {
                    return Err(ExecutionError::DivisionByZero);
                }
                a / b
            }
            "^" => a.powf(b),
            "min" => a.min(b),
            "max" => a.max(b),
            other => return Err(ExecutionError::UnknownOperator(other.to_string())),
        };

        let mut outputs = Map::new();
        outputs.insert("result".to_string(), json!(result));
        Ok(outputs)
    }

    fn get_descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            type_name: "math".to_string(),
            name: "算术节点".to_string(),
            description: "对两个数值操作数做二元运算".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RuleInstance, TriggerData};

    async fn run(operator: &str, a: f64, b: f64) -> Result<f64, ExecutionError> {
        let mut node = Node::new("m", "math");
        node.properties.insert("operator".into(), json!(operator));
        node.properties.insert("a".into(), json!(a));
        node.properties.insert("b".into(), json!(b));

        let instance = RuleInstance {
            template_id: "t".into(),
            parameter_values: Map::new(),
            state: Map::new(),
        };
        let mut state = ExecutionState::new(&instance, &TriggerData::new("test", "test"));
        let outputs = MathNode.execute(&node, &Map::new(), &mut state).await?;
        Ok(outputs["result"].as_f64().unwrap())
    }

    #[tokio::test]
    async fn pow_two_to_ten_is_1024() {
        let result = run("^", 2.0, 10.0).await.unwrap();
        assert!((result - 1024.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn divide_by_zero_fails() {
        assert!(matches!(
            run("/", 7.0, 0.0).await,
            Err(ExecutionError::DivisionByZero)
        ));
    }

    #[tokio::test]
    async fn min_max_semantics() {
        assert_eq!(run("min", 3.0, 5.0).await.unwrap(), 3.0);
        assert_eq!(run("max", 3.0, 5.0).await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn unknown_operator_is_reported() {
        assert!(matches!(
            run("%", 3.0, 5.0).await,
            Err(ExecutionError::UnknownOperator(_))
        ));
    }

    #[tokio::test]
    async fn wired_inputs_take_priority_over_properties() {
        let mut node = Node::new("m", "math");
        node.properties.insert("operator".into(), json!("+"));
        node.properties.insert("a".into(), json!(1.0));
        node.properties.insert("b".into(), json!(1.0));

        let mut inputs = Map::new();
        inputs.insert("a".into(), json!(10.0));

        let instance = RuleInstance {
            template_id: "t".into(),
            parameter_values: Map::new(),
            state: Map::new(),
        };
        let mut state = ExecutionState::new(&instance, &TriggerData::new("test", "test"));
        let outputs = MathNode.execute(&node, &inputs, &mut state).await.unwrap();
        assert_eq!(outputs["result"].as_f64().unwrap(), 11.0);
    }
}
