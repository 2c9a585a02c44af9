use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rulegraph::engine::{RuleRepository, RuleService, ServiceError};
use rulegraph::types::*;
use rulegraph::{
    apply_conditional_rules, ContextManager, ExecutorRegistry, NodeExecutor, RuleCompiler,
    RuleExecutor,
};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

fn trigger_node(id: &str) -> Node {
    let mut node = Node::new(id, "damage-trigger");
    node.outputs.push(Port::new("event"));
    node
}

fn math_node(id: &str, operator: &str, a: f64, b: f64) -> Node {
    let mut node = Node::new(id, "math");
    node.inputs.push(Port::new("exec"));
    node.outputs.push(Port::new("result"));
    node.properties.insert("operator".into(), json!(operator));
    node.properties.insert("a".into(), json!(a));
    node.properties.insert("b".into(), json!(b));
    node
}

fn instance(template_id: &str) -> RuleInstance {
    RuleInstance {
        template_id: template_id.to_string(),
        parameter_values: Map::new(),
        state: Map::new(),
    }
}

// 场景 A: trigger -> math(2+3), 全部执行, 无错误, math 输出 5
#[test_log::test(tokio::test)]
async fn scenario_a_linear_graph_executes_in_order() {
    let template = RuleTemplate {
        id: "tpl-a".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger"), math_node("math", "+", 2.0, 3.0)],
            connections: vec![Connection::new("trigger", "event", "math", "exec")],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    let compiled = RuleCompiler::compile(&template).unwrap();
    let result = RuleExecutor::new()
        .execute_rule(&compiled, &instance("tpl-a"), &TriggerData::new("damage", "goblin"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.executed_nodes, vec!["trigger", "math"]);
    assert!(result.errors.is_empty());

    let math_step = result
        .execution_path
        .iter()
        .find(|s| s.node_id == "math")
        .unwrap();
    assert_eq!(math_step.outputs["result"], json!(5.0));
}

// 场景 B: 输出接回自身输入, 编译即失败, 执行不可达
#[test]
fn scenario_b_self_cycle_fails_compilation() {
    let mut node = math_node("loop", "+", 1.0, 1.0);
    node.inputs.push(Port::new("back"));
    let template = RuleTemplate {
        id: "tpl-b".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![node],
            connections: vec![Connection::new("loop", "result", "loop", "back")],
            start_node_id: "loop".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    assert!(matches!(
        RuleCompiler::compile(&template),
        Err(CompileError::CircularDependency(_))
    ));
}

// 场景 C: 注册 storm 情境后, attack 类节点得到 ranged_penalty = -2
#[tokio::test]
async fn scenario_c_storm_context_rewrites_attack_nodes() {
    let manager = ContextManager::new();
    manager
        .register_context("session-1", "weather", json!({"value": "storm"}))
        .await
        .unwrap();
    let contexts = manager.get_active_contexts("session-1").await.unwrap();

    let mut attack = Node::new("volley", "ranged_attack_nodes");
    attack.inputs.push(Port::new("exec"));
    let template = RuleTemplate {
        id: "tpl-c".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger"), attack],
            connections: vec![Connection::new("trigger", "event", "volley", "exec")],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    let mut inst = instance("tpl-c");
    let modified = apply_conditional_rules(&template, &mut inst, &contexts);

    let volley = modified.logic_graph.get_node("volley").unwrap();
    assert_eq!(volley.properties["ranged_penalty"], json!(-2));
}

// 场景 D: 必需输入的生产者从未执行, 依赖节点本遍静默跳过
#[test_log::test(tokio::test)]
async fn scenario_d_unready_required_input_skips_silently() {
    // producer 自己的必需输入没有任何连线, 于是 producer 被跳过,
    // 连带 consumer 的必需输入也取不到值
    let mut producer = math_node("producer", "+", 1.0, 1.0);
    producer.inputs[0].required = true;
    let mut consumer = math_node("consumer", "*", 2.0, 2.0);
    consumer.inputs[0].required = true;

    let template = RuleTemplate {
        id: "tpl-d".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger"), producer, consumer],
            connections: vec![Connection::new("producer", "result", "consumer", "exec")],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    let compiled = RuleCompiler::compile(&template).unwrap();
    let result = RuleExecutor::new()
        .execute_rule(&compiled, &instance("tpl-d"), &TriggerData::new("time", "clock"))
        .await
        .unwrap();

    assert_eq!(result.executed_nodes, vec!["trigger"]);
    assert!(result.errors.is_empty());
    assert!(result.success);
}

// 场景 E: 条件规则命中 -> 整图替换 + 参数写入实例, 然后正常编译执行
#[tokio::test]
async fn scenario_e_authored_rule_replaces_graph_before_compilation() {
    let replacement = LogicGraph {
        nodes: vec![trigger_node("alt"), math_node("double", "*", 6.0, 2.0)],
        connections: vec![Connection::new("alt", "event", "double", "exec")],
        start_node_id: "alt".to_string(),
    };
    let template = RuleTemplate {
        id: "tpl-e".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger")],
            connections: vec![],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![ConditionalRule {
            conditions: vec![RuleCondition::new("plane", None, json!("Shadowfell"))],
            modified_logic: Some(replacement),
            parameter_overrides: json!({"shadow_bonus": 2})
                .as_object()
                .cloned()
                .unwrap(),
        }],
    };

    let contexts = vec![ConditionalContext::new(
        "session-1",
        "plane",
        json!({"value": "Shadowfell"}),
    )];
    let mut inst = instance("tpl-e");
    let modified = apply_conditional_rules(&template, &mut inst, &contexts);

    assert_eq!(inst.parameter_values["shadow_bonus"], json!(2));
    assert_eq!(modified.logic_graph.start_node_id, "alt");

    let compiled = RuleCompiler::compile(&modified).unwrap();
    let result = RuleExecutor::new()
        .execute_rule(&compiled, &inst, &TriggerData::new("damage", "wraith"))
        .await
        .unwrap();
    assert_eq!(result.executed_nodes, vec!["alt", "double"]);
    // 实例参数作为初始变量出现在最终状态里
    assert_eq!(result.final_state["shadow_bonus"], json!(2));
}

// 非致命执行错误累积, 其余节点继续执行
#[tokio::test]
async fn recoverable_errors_accumulate_as_partial_success() {
    let template = RuleTemplate {
        id: "tpl-err".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![
                trigger_node("trigger"),
                math_node("bad", "/", 1.0, 0.0),
                math_node("good", "+", 1.0, 1.0),
            ],
            connections: vec![
                Connection::new("trigger", "event", "bad", "exec"),
                Connection::new("trigger", "event", "good", "exec"),
            ],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    let compiled = RuleCompiler::compile(&template).unwrap();
    let result = RuleExecutor::new()
        .execute_rule(&compiled, &instance("tpl-err"), &TriggerData::new("damage", "ooze"))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.executed_nodes.contains(&"good".to_string()));
    assert!(!result.executed_nodes.contains(&"bad".to_string()));
}

// 未注册的节点类型按配置错误累积, 不中断整遍执行
#[tokio::test]
async fn unknown_node_type_is_a_recoverable_configuration_error() {
    let mut unknown = Node::new("mystery", "polymorph");
    unknown.inputs.push(Port::new("exec"));
    let template = RuleTemplate {
        id: "tpl-unknown".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger"), unknown],
            connections: vec![Connection::new("trigger", "event", "mystery", "exec")],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    let compiled = RuleCompiler::compile(&template).unwrap();
    let result = RuleExecutor::new()
        .execute_rule(&compiled, &instance("tpl-unknown"), &TriggerData::new("damage", "hag"))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.executed_nodes, vec!["trigger"]);
    assert!(result.errors[0].contains("polymorph"));
}

// 致命级执行错误中止整次调用, 其后的节点不再运行
#[tokio::test]
async fn fatal_error_aborts_the_whole_pass() {
    struct UnstableMagic;

    #[async_trait]
    impl NodeExecutor for UnstableMagic {
        async fn execute(
            &self,
            _node: &Node,
            _inputs: &Map<String, Value>,
            _state: &mut ExecutionState,
        ) -> Result<Map<String, Value>, ExecutionError> {
            Err(ExecutionError::Fatal("魔网崩解".to_string()))
        }

        fn get_descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                type_name: "wild-surge".to_string(),
                name: "狂乱魔涌".to_string(),
                description: "必定致命失败的测试执行器".to_string(),
            }
        }
    }

    struct Recorder(Arc<AtomicU64>);

    #[async_trait]
    impl NodeExecutor for Recorder {
        async fn execute(
            &self,
            _node: &Node,
            _inputs: &Map<String, Value>,
            _state: &mut ExecutionState,
        ) -> Result<Map<String, Value>, ExecutionError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Map::new())
        }

        fn get_descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                type_name: "recorder".to_string(),
                name: "记录节点".to_string(),
                description: "统计自身执行次数".to_string(),
            }
        }
    }

    let downstream_runs = Arc::new(AtomicU64::new(0));
    let mut registry = ExecutorRegistry::new();
    registry.register_custom("wild-surge", Arc::new(UnstableMagic));
    registry.register_custom("recorder", Arc::new(Recorder(downstream_runs.clone())));

    let mut surge = Node::new("surge", "wild-surge");
    surge.inputs.push(Port::new("exec"));
    surge.outputs.push(Port::new("out"));
    let mut tail = Node::new("tail", "recorder");
    tail.inputs.push(Port::new("exec"));

    let template = RuleTemplate {
        id: "tpl-fatal".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger"), surge, tail],
            connections: vec![
                Connection::new("trigger", "event", "surge", "exec"),
                Connection::new("surge", "out", "tail", "exec"),
            ],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };

    let compiled = RuleCompiler::compile(&template).unwrap();
    let executor = RuleExecutor::with_registry(Arc::new(registry));
    let err = executor
        .execute_rule(&compiled, &instance("tpl-fatal"), &TriggerData::new("spell", "sorcerer"))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Fatal(_)));
    assert_eq!(err.severity(), Severity::Fatal);
    // 致命节点之后的节点没有执行
    assert_eq!(downstream_runs.load(Ordering::SeqCst), 0);
}

struct MemoryRepository {
    templates: Mutex<Vec<RuleTemplate>>,
    active_rules: Mutex<Vec<ActiveRule>>,
    usage_count: AtomicU64,
}

impl MemoryRepository {
    fn with_template(template: RuleTemplate) -> Self {
        Self {
            templates: Mutex::new(vec![template]),
            active_rules: Mutex::new(Vec::new()),
            usage_count: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl RuleRepository for MemoryRepository {
    async fn get_template(&self, template_id: &str) -> Result<RuleTemplate, ServiceError> {
        self.templates
            .lock()
            .await
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| ServiceError::Storage(format!("模板不存在: {}", template_id)))
    }

    async fn create_active_rule(&self, active: &ActiveRule) -> Result<(), ServiceError> {
        self.active_rules.lock().await.push(active.clone());
        Ok(())
    }

    async fn increment_usage_count(&self, _template_id: &str) -> Result<(), ServiceError> {
        self.usage_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn record_execution(
        &self,
        _template_id: &str,
        _result: &ExecutionResult,
    ) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[tokio::test]
async fn activate_rule_compiles_persists_and_counts() {
    let template = RuleTemplate {
        id: "tpl-svc".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![trigger_node("trigger")],
            connections: vec![],
            start_node_id: "trigger".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };
    let repository = Arc::new(MemoryRepository::with_template(template));
    let service = RuleService::new(repository.clone());

    let mut parameters = Map::new();
    parameters.insert("bonus".to_string(), Value::from(2));
    let active = service
        .activate_rule("tpl-svc", "session-1", "char-7", parameters)
        .await
        .unwrap();

    assert_eq!(active.template_id, "tpl-svc");
    assert_eq!(repository.active_rules.lock().await.len(), 1);
    assert_eq!(repository.usage_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn activate_rule_rejects_invalid_template() {
    let template = RuleTemplate {
        id: "tpl-bad".to_string(),
        logic_graph: LogicGraph {
            nodes: vec![],
            connections: vec![],
            start_node_id: "ghost".to_string(),
        },
        parameters: vec![],
        conditional_rules: vec![],
    };
    let repository = Arc::new(MemoryRepository::with_template(template));
    let service = RuleService::new(repository);

    assert!(matches!(
        service
            .activate_rule("tpl-bad", "session-1", "char-7", Map::new())
            .await,
        Err(ServiceError::Compile(_))
    ));
}
