use crate::types::{ConditionalContext, RuleCondition, RuleInstance};
use chrono::Timelike;
use serde_json::Value;

/// AND 语义: 所有条件成立才算命中
pub fn evaluate_conditions(
    conditions: &[RuleCondition],
    instance: &RuleInstance,
    contexts: &[ConditionalContext],
) -> bool {
    conditions
        .iter()
        .all(|c| evaluate_condition(c, instance, contexts))
}

/// 按条件类型分派的求值器
pub fn evaluate_condition(
    condition: &RuleCondition,
    instance: &RuleInstance,
    contexts: &[ConditionalContext],
) -> bool {
    let operator = condition.operator.as_deref();
    match condition.condition_type.as_str() {
        "location" => location_matches(condition, operator, contexts),
        "plane" => find_context(contexts, "plane")
            .and_then(ConditionalContext::scalar_value)
            .map(|plane| Some(plane) == condition.value.as_str())
            .unwrap_or(false),
        "emotion" => emotion_matches(condition, operator, instance, contexts),
        // 角色状态求值尚未接入角色服务
        "character_state" => true,
        "time" => time_matches(operator, &condition.value, chrono::Local::now().hour()),
        "narrative" => narrative_matches(condition, operator, instance),
        "environment" => environment_matches(condition, operator, contexts),
        _ => false,
    }
}

fn find_context<'a>(
    contexts: &'a [ConditionalContext],
    context_type: &str,
) -> Option<&'a ConditionalContext> {
    contexts
        .iter()
        .filter(|c| c.is_active)
        .rev()
        .find(|c| c.context_type == context_type)
}

fn location_matches(
    condition: &RuleCondition,
    operator: Option<&str>,
    contexts: &[ConditionalContext],
) -> bool {
    let Some(location) = find_context(contexts, "environment")
        .and_then(|c| c.context_value.get("location"))
        .and_then(Value::as_str)
    else {
        return false;
    };

    match operator.unwrap_or("exact") {
        "exact" => Some(location) == condition.value.as_str(),
        "contains" => condition
            .value
            .as_str()
            .map(|v| location.contains(v))
            .unwrap_or(false),
        "in" => condition
            .value
            .as_array()
            .map(|list| list.iter().any(|v| v.as_str() == Some(location)))
            .unwrap_or(false),
        _ => false,
    }
}

fn emotion_matches(
    condition: &RuleCondition,
    operator: Option<&str>,
    instance: &RuleInstance,
    contexts: &[ConditionalContext],
) -> bool {
    match operator.unwrap_or("exact") {
        // 当前强度存在实例状态里, 阈值来自条件本身
        "intensity_above" => {
            let intensity = instance
                .state
                .get("emotion_intensity")
                .and_then(Value::as_f64);
            match (intensity, condition.value.as_f64()) {
                (Some(intensity), Some(threshold)) => intensity > threshold,
                _ => false,
            }
        }
        _ => find_context(contexts, "emotion")
            .and_then(ConditionalContext::scalar_value)
            .map(|emotion| Some(emotion) == condition.value.as_str())
            .unwrap_or(false),
    }
}

/// 时段划分: dawn 05-07, day 07-18, dusk 18-20, 其余 night
pub(crate) fn time_matches(operator: Option<&str>, value: &Value, hour: u32) -> bool {
    match operator.unwrap_or("time_of_day") {
        "hour_of_day" => value.as_u64() == Some(hour as u64),
        "time_of_day" => {
            let bucket = match hour {
                5..=6 => "dawn",
                7..=17 => "day",
                18..=19 => "dusk",
                _ => "night",
            };
            value.as_str() == Some(bucket)
        }
        _ => false,
    }
}

fn narrative_matches(
    condition: &RuleCondition,
    operator: Option<&str>,
    instance: &RuleInstance,
) -> bool {
    match operator.unwrap_or("quest_completed") {
        "quest_completed" => {
            let Some(quest_id) = condition.value.as_str() else {
                return false;
            };
            instance
                .state
                .get("quests")
                .and_then(|q| q.get(quest_id))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        }
        "chapter_reached" => {
            let chapter = instance.state.get("chapter").and_then(Value::as_f64);
            match (chapter, condition.value.as_f64()) {
                (Some(chapter), Some(required)) => chapter >= required,
                _ => false,
            }
        }
        _ => false,
    }
}

fn environment_matches(
    condition: &RuleCondition,
    operator: Option<&str>,
    contexts: &[ConditionalContext],
) -> bool {
    let Some(context) = find_context(contexts, "environment") else {
        return false;
    };

    let key = match operator {
        Some("weather_is") => "weather",
        Some("terrain_type") => "terrain",
        Some("light_level") => "light_level",
        _ => return false,
    };

    context.context_value.get(key) == Some(&condition.value)
}
