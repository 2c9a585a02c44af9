use crate::engine::{execution_order, validate};
use crate::types::{CompileError, CompiledRule, LogicGraph, RuleTemplate};
use tracing::debug;

/// 规则编译器: 校验 -> 排序 -> 优化 -> 打包。
/// 对输入模板是纯函数, 可以在任意调用点并发重复调用。
pub struct RuleCompiler;

impl RuleCompiler {
    pub fn compile(template: &RuleTemplate) -> Result<CompiledRule, CompileError> {
        validate(&template.logic_graph)?;
        let execution_order = execution_order(&template.logic_graph)?;
        let graph = Self::optimize(template.logic_graph.clone());

        debug!(
            template_id = %template.id,
            nodes = graph.nodes.len(),
            "规则编译完成"
        );

        Ok(CompiledRule {
            template_id: template.id.clone(),
            graph,
            execution_order,
            parameters: template.parameters.clone(),
            compiled_at: chrono::Utc::now(),
        })
    }

    // 图优化挂点, 预留给常量折叠/死节点消除
    fn optimize(graph: LogicGraph) -> LogicGraph {
        graph
    }
}
