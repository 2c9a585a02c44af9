use crate::executors::{
    ActionStubNode, CompareNode, ConditionCheckNode, MathNode, RandomNode,
};
use crate::types::{ExecutionError, ExecutionState, Node, NodeDescriptor};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// 节点类型的封闭枚举, 不走字符串表的隐式失配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Math,
    Random,
    ConditionCheck,
    Compare,
    ActionDamage,
    ActionHeal,
    ActionEffect,
    ActionResource,
    DamageTrigger,
    TimeTrigger,
    RollCheck,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "math" => Some(NodeKind::Math),
            "random" => Some(NodeKind::Random),
            "condition-check" => Some(NodeKind::ConditionCheck),
            "compare" => Some(NodeKind::Compare),
            "action-damage" => Some(NodeKind::ActionDamage),
            "action-heal" => Some(NodeKind::ActionHeal),
            "action-effect" => Some(NodeKind::ActionEffect),
            "action-resource" => Some(NodeKind::ActionResource),
            "damage-trigger" => Some(NodeKind::DamageTrigger),
            "time-trigger" => Some(NodeKind::TimeTrigger),
            "roll-check" => Some(NodeKind::RollCheck),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Math => "math",
            NodeKind::Random => "random",
            NodeKind::ConditionCheck => "condition-check",
            NodeKind::Compare => "compare",
            NodeKind::ActionDamage => "action-damage",
            NodeKind::ActionHeal => "action-heal",
            NodeKind::ActionEffect => "action-effect",
            NodeKind::ActionResource => "action-resource",
            NodeKind::DamageTrigger => "damage-trigger",
            NodeKind::TimeTrigger => "time-trigger",
            NodeKind::RollCheck => "roll-check",
        }
    }
}

#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// 执行节点逻辑, 返回输出端口 -> 值
    async fn execute(
        &self,
        node: &Node,
        inputs: &Map<String, Value>,
        state: &mut ExecutionState,
    ) -> Result<Map<String, Value>, ExecutionError>;

    fn get_descriptor(&self) -> NodeDescriptor;
}

/// 内置执行器注册表。内置部分容量封闭: 按 NodeKind 匹配分派,
/// 未知类型标签显式报 ExecutorNotFound。
/// 另留一个自定义槽位供调用方挂接自己的执行器, 自定义优先于内置。
pub struct ExecutorRegistry {
    custom: HashMap<String, Arc<dyn NodeExecutor>>,
    math: MathNode,
    random: RandomNode,
    condition_check: ConditionCheckNode,
    compare: CompareNode,
    action_damage: ActionStubNode,
    action_heal: ActionStubNode,
    action_effect: ActionStubNode,
    action_resource: ActionStubNode,
    damage_trigger: ActionStubNode,
    time_trigger: ActionStubNode,
    roll_check: ActionStubNode,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            math: MathNode,
            random: RandomNode,
            condition_check: ConditionCheckNode,
            compare: CompareNode,
            action_damage: ActionStubNode::new(NodeKind::ActionDamage, "伤害动作"),
            action_heal: ActionStubNode::new(NodeKind::ActionHeal, "治疗动作"),
            action_effect: ActionStubNode::new(NodeKind::ActionEffect, "效果动作"),
            action_resource: ActionStubNode::new(NodeKind::ActionResource, "资源动作"),
            damage_trigger: ActionStubNode::new(NodeKind::DamageTrigger, "伤害触发器"),
            time_trigger: ActionStubNode::new(NodeKind::TimeTrigger, "时间触发器"),
            roll_check: ActionStubNode::new(NodeKind::RollCheck, "检定"),
        }
    }

    /// 注册自定义节点执行器, 同名标签覆盖内置实现
    pub fn register_custom(&mut self, tag: &str, executor: Arc<dyn NodeExecutor>) {
        self.custom.insert(tag.to_string(), executor);
    }

    pub fn resolve(&self, tag: &str) -> Result<&dyn NodeExecutor, ExecutionError> {
        if let Some(executor) = self.custom.get(tag) {
            return Ok(executor.as_ref());
        }

        let kind = NodeKind::from_tag(tag)
            .ok_or_else(|| ExecutionError::ExecutorNotFound(tag.to_string()))?;

        Ok(match kind {
            NodeKind::Math => &self.math,
            NodeKind::Random => &self.random,
            NodeKind::ConditionCheck => &self.condition_check,
            NodeKind::Compare => &self.compare,
            NodeKind::ActionDamage => &self.action_damage,
            NodeKind::ActionHeal => &self.action_heal,
            NodeKind::ActionEffect => &self.action_effect,
            NodeKind::ActionResource => &self.action_resource,
            NodeKind::DamageTrigger => &self.damage_trigger,
            NodeKind::TimeTrigger => &self.time_trigger,
            NodeKind::RollCheck => &self.roll_check,
        })
    }

    /// 获取所有已注册的组件类型
    pub fn get_descriptors(&self) -> Vec<NodeDescriptor> {
        let mut descriptors = vec![
            self.math.get_descriptor(),
            self.random.get_descriptor(),
            self.condition_check.get_descriptor(),
            self.compare.get_descriptor(),
            self.action_damage.get_descriptor(),
            self.action_heal.get_descriptor(),
            self.action_effect.get_descriptor(),
            self.action_resource.get_descriptor(),
            self.damage_trigger.get_descriptor(),
            self.time_trigger.get_descriptor(),
            self.roll_check.get_descriptor(),
        ];
        descriptors.extend(self.custom.values().map(|e| e.get_descriptor()));
        descriptors
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
