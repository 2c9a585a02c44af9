use crate::engine::ExecutorRegistry;
use crate::types::{
    CompiledRule, ExecutionError, ExecutionResult, ExecutionState, ExecutionStep, Node,
    RuleInstance, TriggerData,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// 规则运行时: 按编译好的执行顺序做单遍前向执行。
///
/// 单遍语义是显式约定: 必需输入在本遍内未就绪的节点直接跳过,
/// 不重试、不推迟、不记错; 多触发图不会迭代到不动点。
pub struct RuleExecutor {
    registry: Arc<ExecutorRegistry>,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ExecutorRegistry::new()),
        }
    }

    pub fn with_registry(registry: Arc<ExecutorRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute_rule(
        &self,
        compiled: &CompiledRule,
        instance: &RuleInstance,
        trigger: &TriggerData,
    ) -> Result<ExecutionResult, ExecutionError> {
        let started = Instant::now();
        let mut state = ExecutionState::new(instance, trigger);

        for node_id in &compiled.execution_order {
            let node = match compiled.graph.get_node(node_id) {
                Some(node) => node,
                // 执行顺序来自同一张图, 正常编译下不会缺节点
                None => continue,
            };

            if node.is_disabled() {
                debug!(node_id = %node.id, "节点已被情境禁用, 跳过");
                continue;
            }

            let inputs = match gather_inputs(compiled, node, &state) {
                Some(inputs) => inputs,
                None => {
                    debug!(node_id = %node.id, "必需输入未就绪, 本遍跳过");
                    continue;
                }
            };

            let executor = match self.registry.resolve(&node.node_type) {
                Ok(executor) => executor,
                Err(e) => {
                    warn!(node_id = %node.id, node_type = %node.node_type, "{}", e);
                    state.errors.push(e.to_string());
                    continue;
                }
            };

            let node_started = Instant::now();
            match executor.execute(node, &inputs, &mut state).await {
                Ok(outputs) => {
                    state.execution_path.push(ExecutionStep {
                        node_id: node.id.clone(),
                        node_type: node.node_type.clone(),
                        inputs: inputs.clone(),
                        outputs: outputs.clone(),
                        duration_ms: node_started.elapsed().as_millis() as u64,
                        timestamp: chrono::Utc::now(),
                    });
                    state
                        .context
                        .insert(node.id.clone(), Value::Object(outputs));
                    state.executed_nodes.push(node.id.clone());
                }
                Err(e) => {
                    if e.is_fatal() {
                        warn!(node_id = %node.id, "致命错误, 中止执行: {}", e);
                        return Err(e);
                    }
                    warn!(node_id = %node.id, "节点执行失败, 继续: {}", e);
                    state.errors.push(e.to_string());
                }
            }
        }

        Ok(ExecutionResult {
            success: state.errors.is_empty(),
            duration_ms: started.elapsed().as_millis() as u64,
            executed_nodes: state.executed_nodes,
            final_state: state.variables,
            errors: state.errors,
            execution_path: state.execution_path,
        })
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// 按连接关系从上游已记录的输出里取本节点的输入。
/// 任一必需端口取不到值时返回 None, 表示本遍跳过该节点。
fn gather_inputs(
    compiled: &CompiledRule,
    node: &Node,
    state: &ExecutionState,
) -> Option<Map<String, Value>> {
    let mut inputs = Map::new();

    for port in &node.inputs {
        let value = compiled
            .graph
            .connections
            .iter()
            .filter(|c| c.to_node == node.id && c.to_port == port.id)
            .find_map(|c| state.node_output(&c.from_node, &c.from_port));

        match value {
            Some(value) => {
                inputs.insert(port.id.clone(), value.clone());
            }
            None if port.required => return None,
            None => {}
        }
    }

    Some(inputs)
}
