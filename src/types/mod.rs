mod context;
mod descriptor;
mod error;
mod state;

pub use context::*;
pub use descriptor::*;
pub use error::*;
pub use state::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// 端口定义 (required 仅对输入端口有意义)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub required: bool,
}

impl Port {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            required: false,
        }
    }

    pub fn required(id: &str) -> Self {
        Self {
            id: id.to_string(),
            required: true,
        }
    }
}

// 节点定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl Node {
    pub fn new(id: &str, node_type: &str) -> Self {
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            properties: Map::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// 节点是否被情境修改层禁用
    pub fn is_disabled(&self) -> bool {
        self.properties
            .get("disabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// 连接定义: (from_node, from_port) -> (to_node, to_port)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: String,
    pub from_port: String,
    pub to_node: String,
    pub to_port: String,
}

impl Connection {
    pub fn new(from_node: &str, from_port: &str, to_node: &str, to_port: &str) -> Self {
        Self {
            from_node: from_node.to_string(),
            from_port: from_port.to_string(),
            to_node: to_node.to_string(),
            to_port: to_port.to_string(),
        }
    }
}

// 规则逻辑图定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicGraph {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub start_node_id: String,
}

impl LogicGraph {
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

// 规则参数: 名称 + 默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleParameter {
    pub name: String,
    pub default_value: Value,
}

// 模板上挂载的条件规则: 条件全部满足时整体替换逻辑图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub modified_logic: Option<LogicGraph>,
    #[serde(default)]
    pub parameter_overrides: Map<String, Value>,
}

// 规则模板 (由规则编辑侧持久化, 编译时只读)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub id: String,
    pub logic_graph: LogicGraph,
    #[serde(default)]
    pub parameters: Vec<RuleParameter>,
    #[serde(default)]
    pub conditional_rules: Vec<ConditionalRule>,
}

// 规则实例: 模板针对某角色/会话的一次激活
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleInstance {
    pub template_id: String,
    #[serde(default)]
    pub parameter_values: Map<String, Value>,
    #[serde(default)]
    pub state: Map<String, Value>,
}

// 编译产物, 创建后不再修改, 需要刷新时重新编译
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledRule {
    pub template_id: String,
    pub graph: LogicGraph,
    pub execution_order: Vec<String>,
    pub parameters: Vec<RuleParameter>,
    pub compiled_at: chrono::DateTime<chrono::Utc>,
}

// 触发事件数据 (由战斗/战役服务构造)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerData {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub source: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl TriggerData {
    pub fn new(trigger_type: &str, source: &str) -> Self {
        Self {
            trigger_type: trigger_type.to_string(),
            source: source.to_string(),
            target: None,
            properties: Map::new(),
        }
    }
}

// 激活记录 (由服务层持久化)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRule {
    pub id: uuid::Uuid,
    pub template_id: String,
    pub session_id: String,
    pub character_id: String,
    pub parameter_values: Map<String, Value>,
    pub activated_at: chrono::DateTime<chrono::Utc>,
}
