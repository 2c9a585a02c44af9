use crate::context::apply_conditional_rules;
use crate::engine::{RuleCompiler, RuleExecutor};
use crate::types::{
    ActiveRule, CompileError, ConditionalContext, ExecutionError, ExecutionResult, RuleInstance,
    RuleTemplate, TriggerData,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// 服务层统一错误: 编译/执行/存储三类
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("存储错误: {0}")]
    Storage(String),
}

/// 持久化协作方。本核心只消费这些能力, 不规定存储格式。
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn get_template(&self, template_id: &str) -> Result<RuleTemplate, ServiceError>;
    async fn create_active_rule(&self, active: &ActiveRule) -> Result<(), ServiceError>;
    async fn increment_usage_count(&self, template_id: &str) -> Result<(), ServiceError>;
    async fn record_execution(
        &self,
        template_id: &str,
        result: &ExecutionResult,
    ) -> Result<(), ServiceError>;
}

/// 面向战斗/战役服务的门面: 激活规则, 以及
/// 情境改写 -> 编译 -> 执行 的完整管线。
pub struct RuleService {
    repository: Arc<dyn RuleRepository>,
    executor: RuleExecutor,
}

impl RuleService {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self {
            repository,
            executor: RuleExecutor::new(),
        }
    }

    /// 激活模板: 取模板 -> 编译验证 -> 落激活记录 -> 计数
    pub async fn activate_rule(
        &self,
        template_id: &str,
        session_id: &str,
        character_id: &str,
        parameters: Map<String, Value>,
    ) -> Result<ActiveRule, ServiceError> {
        let template = self.repository.get_template(template_id).await?;
        RuleCompiler::compile(&template)?;

        let active = ActiveRule {
            id: uuid::Uuid::new_v4(),
            template_id: template_id.to_string(),
            session_id: session_id.to_string(),
            character_id: character_id.to_string(),
            parameter_values: parameters,
            activated_at: chrono::Utc::now(),
        };
        self.repository.create_active_rule(&active).await?;
        self.repository.increment_usage_count(template_id).await?;

        info!(template_id, session_id, character_id, "规则已激活");
        Ok(active)
    }

    /// 对一个触发事件跑完整管线。编译错误与致命执行错误直接上抛,
    /// 非致命错误留在 ExecutionResult.errors 里由调用方按部分成功处理。
    pub async fn trigger(
        &self,
        template: &RuleTemplate,
        instance: &mut RuleInstance,
        active_contexts: &[ConditionalContext],
        trigger: &TriggerData,
    ) -> Result<ExecutionResult, ServiceError> {
        let modified = apply_conditional_rules(template, instance, active_contexts);
        let compiled = RuleCompiler::compile(&modified)?;
        let result = self
            .executor
            .execute_rule(&compiled, instance, trigger)
            .await?;
        self.repository
            .record_execution(&template.id, &result)
            .await?;
        Ok(result)
    }
}
