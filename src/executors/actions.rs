use crate::engine::{NodeExecutor, NodeKind};
use crate::types::{ExecutionError, ExecutionState, Node, NodeDescriptor};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

/// 动作/触发器类节点的占位实现, 目前只回一个固定确认输出。
/// 这些是待完成的扩展点, 不是成品行为。
// TODO: 通过 state.context["instance"] 写回战斗/角色状态 (伤害结算、治疗、资源扣减)
pub struct ActionStubNode {
    kind: NodeKind,
    name: &'static str,
}

impl ActionStubNode {
    pub fn new(kind: NodeKind, name: &'static str) -> Self {
        Self { kind, name }
    }
}

#[async_trait]
impl NodeExecutor for ActionStubNode {
    async fn execute(
        &self,
        node: &Node,
        _inputs: &Map<String, Value>,
        _state: &mut ExecutionState,
    ) -> Result<Map<String, Value>, ExecutionError> {
        debug!(node_id = %node.id, node_type = %node.node_type, "动作占位节点执行");

        let mut outputs = Map::new();
        outputs.insert("acknowledged".to_string(), json!(true));
        outputs.insert("node_type".to_string(), json!(self.kind.tag()));
        Ok(outputs)
    }

    fn get_descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            type_name: self.kind.tag().to_string(),
            name: self.name.to_string(),
            description: "扩展点: 需接入战斗/角色状态结算".to_string(),
        }
    }
}
