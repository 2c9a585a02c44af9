use crate::context::evaluate_conditions;
use crate::types::{
    ConditionalContext, ModificationSet, RuleInstance, RuleModifier, RuleTemplate,
};
use lazy_static::lazy_static;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::debug;

type ModifierFactory = fn(&ConditionalContext) -> Vec<RuleModifier>;

lazy_static! {
    /// 内置修改器目录, 以 (情境类型, 情境值) 为键
    static ref BUILTIN_CATALOG: HashMap<(&'static str, &'static str), ModifierFactory> = {
        let mut m: HashMap<(&'static str, &'static str), ModifierFactory> = HashMap::new();
        m.insert(("plane", "Feywild"), feywild);
        m.insert(("plane", "Shadowfell"), shadowfell);
        m.insert(("plane", "Elemental Plane of Fire"), plane_of_fire);
        m.insert(("weather", "storm"), storm);
        m.insert(("weather", "fog"), fog);
        m.insert(("emotion", "rage"), rage);
        m.insert(("emotion", "fear"), fear);
        m.insert(("emotion", "determination"), determination);
        m
    };
}

/// 情境驱动的模板改写, 产物交给编译器。两步, 顺序固定:
/// 1. 模板自带的条件规则 (AND 求值), 命中则整图替换 + 参数写入实例;
/// 2. 每条活跃情境从内置目录贡献的修改器, 套在 (可能已被替换的) 图上。
pub fn apply_conditional_rules(
    template: &RuleTemplate,
    instance: &mut RuleInstance,
    contexts: &[ConditionalContext],
) -> RuleTemplate {
    let mut modified = template.clone();

    for rule in &template.conditional_rules {
        if !evaluate_conditions(&rule.conditions, instance, contexts) {
            continue;
        }
        if let Some(graph) = &rule.modified_logic {
            debug!(template_id = %template.id, "条件规则命中, 整体替换逻辑图");
            modified.logic_graph = graph.clone();
        }
        for (name, value) in &rule.parameter_overrides {
            instance.parameter_values.insert(name.clone(), value.clone());
        }
    }

    for context in contexts.iter().filter(|c| c.is_active) {
        for modifier in builtin_modifiers(context) {
            debug!(
                template_id = %template.id,
                context_type = %context.context_type,
                description = %modifier.modifications.description,
                "应用内置情境修改器"
            );
            apply_modification_set(&mut modified, &modifier.modifications);
        }
    }

    modified
}

/// 目录查询: 未收录的 (类型, 值) 组合没有修改器
pub fn builtin_modifiers(context: &ConditionalContext) -> Vec<RuleModifier> {
    let Some(value) = context.scalar_value() else {
        return Vec::new();
    };
    BUILTIN_CATALOG
        .get(&(context.context_type.as_str(), value))
        .map(|factory| factory(context))
        .unwrap_or_default()
}

/// 把一组修改套到模板上:
/// - node_overrides: "*" 或类型子串匹配, 键值合并进节点 properties
/// - parameter_overrides: 覆盖模板已声明参数的默认值
/// - disabled_nodes: 按 id 或类型子串命中, 打 disabled 标记
/// - additional_nodes: 原样追加, 不生成任何连接
pub fn apply_modification_set(template: &mut RuleTemplate, modifications: &ModificationSet) {
    for (pattern, props) in &modifications.node_overrides {
        let Some(props) = props.as_object() else {
            continue;
        };
        for node in &mut template.logic_graph.nodes {
            if pattern == "*" || node.node_type.contains(pattern.as_str()) {
                for (key, value) in props {
                    node.properties.insert(key.clone(), value.clone());
                }
            }
        }
    }

    for (name, value) in &modifications.parameter_overrides {
        if let Some(parameter) = template.parameters.iter_mut().find(|p| &p.name == name) {
            parameter.default_value = value.clone();
        }
    }

    for entry in &modifications.disabled_nodes {
        for node in &mut template.logic_graph.nodes {
            if &node.id == entry || node.node_type.contains(entry.as_str()) {
                node.properties.insert("disabled".to_string(), json!(true));
            }
        }
    }

    for node in &modifications.additional_nodes {
        template.logic_graph.nodes.push(node.clone());
    }
}

fn modifier(
    condition_type: &str,
    description: &str,
    node_overrides: Value,
    parameter_overrides: Value,
    disabled_nodes: Vec<String>,
) -> RuleModifier {
    RuleModifier {
        condition_type: condition_type.to_string(),
        conditions: Map::new(),
        modifications: ModificationSet {
            node_overrides: node_overrides.as_object().cloned().unwrap_or_default(),
            parameter_overrides: parameter_overrides
                .as_object()
                .cloned()
                .unwrap_or_default(),
            disabled_nodes,
            additional_nodes: Vec::new(),
            description: description.to_string(),
        },
    }
}

fn feywild(_context: &ConditionalContext) -> Vec<RuleModifier> {
    vec![modifier(
        "plane",
        "妖精荒野: 所有节点附带狂野魔法概率",
        json!({"*": {"wild_magic_chance": 0.05}}),
        json!({}),
        vec![],
    )]
}

fn shadowfell(_context: &ConditionalContext) -> Vec<RuleModifier> {
    vec![modifier(
        "plane",
        "堕影冥界: 黯蚀增强, 光耀减半",
        json!({"damage": {"necrotic_multiplier": 1.5, "radiant_multiplier": 0.5}}),
        json!({}),
        vec![],
    )]
}

fn plane_of_fire(_context: &ConditionalContext) -> Vec<RuleModifier> {
    vec![modifier(
        "plane",
        "火元素位面: 火焰加倍, 寒冷衰减",
        json!({"damage": {"fire_multiplier": 2.0, "cold_multiplier": 0.25}}),
        json!({}),
        vec![],
    )]
}

fn storm(_context: &ConditionalContext) -> Vec<RuleModifier> {
    vec![modifier(
        "weather",
        "暴风雨: 闪电增强, 远程攻击受罚",
        json!({
            "damage": {"lightning_multiplier": 1.5},
            "attack": {"ranged_penalty": -2},
        }),
        json!({}),
        vec![],
    )]
}

fn fog(_context: &ConditionalContext) -> Vec<RuleModifier> {
    vec![modifier(
        "weather",
        "浓雾: 视野受限, 潜行得利",
        json!({
            "*": {"visibility_ft": 30},
            "stealth": {"stealth_bonus": 5},
        }),
        json!({}),
        vec![],
    )]
}

fn rage(context: &ConditionalContext) -> Vec<RuleModifier> {
    let intensity = context.intensity();
    vec![modifier(
        "emotion",
        "狂怒: 伤害与重击随强度提升, 护甲下降",
        json!({
            "damage": {
                "damage_bonus": 2.0 * intensity,
                "crit_range_bonus": intensity,
            },
        }),
        json!({"armor_class_modifier": -intensity}),
        vec![],
    )]
}

fn fear(context: &ConditionalContext) -> Vec<RuleModifier> {
    let intensity = context.intensity();
    vec![modifier(
        "emotion",
        "恐惧: 攻击劣势, 移动受罚, 禁用攻击性动作节点",
        json!({"attack": {"disadvantage": true}}),
        json!({"movement_penalty": 5.0 * intensity}),
        vec!["action-damage".to_string()],
    )]
}

fn determination(context: &ConditionalContext) -> Vec<RuleModifier> {
    let intensity = context.intensity();
    vec![modifier(
        "emotion",
        "决意: 豁免加成与异常抗性随强度提升",
        json!({
            "save": {"save_bonus": 2.0 * intensity},
            "*": {"condition_resistance": true},
        }),
        json!({}),
        vec![],
    )]
}
