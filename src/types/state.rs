use super::{RuleInstance, TriggerData};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// 单次执行的审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub node_id: String,
    pub node_type: String,
    pub inputs: Map<String, Value>,
    pub outputs: Map<String, Value>,
    pub duration_ms: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

// 一次 execute_rule 调用的工作内存, 调用结束即丢弃
#[derive(Debug, Clone)]
pub struct ExecutionState {
    pub variables: Map<String, Value>,
    pub executed_nodes: Vec<String>,
    /// 节点 id -> 该节点最近一次的输出集; 另含 "trigger"/"instance" 两项
    pub context: HashMap<String, Value>,
    pub errors: Vec<String>,
    pub execution_path: Vec<ExecutionStep>,
}

impl ExecutionState {
    pub fn new(instance: &RuleInstance, trigger: &TriggerData) -> Self {
        let mut context = HashMap::new();
        context.insert(
            "trigger".to_string(),
            serde_json::to_value(trigger).unwrap_or(Value::Null),
        );
        context.insert(
            "instance".to_string(),
            serde_json::to_value(instance).unwrap_or(Value::Null),
        );

        Self {
            variables: instance.parameter_values.clone(),
            executed_nodes: Vec::new(),
            context,
            errors: Vec::new(),
            execution_path: Vec::new(),
        }
    }

    /// 查询某节点已记录的某个输出端口值
    pub fn node_output(&self, node_id: &str, port_id: &str) -> Option<&Value> {
        self.context.get(node_id)?.as_object()?.get(port_id)
    }
}

// 执行结果, 返回给调用方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub duration_ms: u64,
    pub executed_nodes: Vec<String>,
    pub final_state: Map<String, Value>,
    pub errors: Vec<String>,
    pub execution_path: Vec<ExecutionStep>,
}
