use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// 会话内生效的情境事实 (位面/天气/情绪/剧情/时间), 只增不减
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalContext {
    pub id: Uuid,
    pub session_id: String,
    pub context_type: String,
    pub context_value: Value,
    pub is_active: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl ConditionalContext {
    pub fn new(session_id: &str, context_type: &str, context_value: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            context_type: context_type.to_string(),
            context_value,
            is_active: true,
            started_at: chrono::Utc::now(),
        }
    }

    /// 情境的标量值, 约定放在 context_value["value"]
    pub fn scalar_value(&self) -> Option<&str> {
        self.context_value.get("value").and_then(Value::as_str)
    }

    /// 情境强度, 缺省为 1.0
    pub fn intensity(&self) -> f64 {
        self.context_value
            .get("intensity")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
    }
}

// 条件规则里的单个条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl RuleCondition {
    pub fn new(condition_type: &str, operator: Option<&str>, value: Value) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            operator: operator.map(str::to_string),
            value,
        }
    }
}

// 对模板图/参数的一组修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationSet {
    /// 节点类型模式 ("*" 或子串匹配) -> 合并进节点 properties 的键值
    #[serde(default)]
    pub node_overrides: Map<String, Value>,
    /// 参数名 -> 覆盖后的默认值 (仅覆盖模板已声明的参数)
    #[serde(default)]
    pub parameter_overrides: Map<String, Value>,
    /// 按节点 id 或类型子串匹配, 命中的节点打上 disabled 标记
    #[serde(default)]
    pub disabled_nodes: Vec<String>,
    /// 原样追加进图的节点, 不自动生成连接
    #[serde(default)]
    pub additional_nodes: Vec<super::Node>,
    #[serde(default)]
    pub description: String,
}

// 情境触发的规则修改器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleModifier {
    pub condition_type: String,
    #[serde(default)]
    pub conditions: Map<String, Value>,
    pub modifications: ModificationSet,
}
