use crate::types::{ConditionalContext, ContextError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

/// 情境变化的订阅方 (法术效果重算、UI 推送等)
#[async_trait]
pub trait ContextSubscriber: Send + Sync {
    async fn on_context_changed(&self, context: ConditionalContext);
}

enum SessionCommand {
    Register {
        context_type: String,
        context_value: Value,
        reply: oneshot::Sender<ConditionalContext>,
    },
    GetActive {
        reply: oneshot::Sender<Vec<ConditionalContext>>,
    },
    Subscribe {
        subscriber: Arc<dyn ContextSubscriber>,
    },
}

/// 会话级情境注册表。每个会话一个单写者 actor:
/// 情境列表与订阅者列表只被 actor 任务持有, 注册与通知严格有序,
/// 无需共享可变状态。情境只增不减, 没有移除/过期接口。
pub struct ContextManager {
    sessions: Mutex<HashMap<String, mpsc::Sender<SessionCommand>>>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn session_tx(&self, session_id: &str) -> mpsc::Sender<SessionCommand> {
        let mut sessions = self.sessions.lock().await;
        if let Some(tx) = sessions.get(session_id) {
            return tx.clone();
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(session_actor(session_id.to_string(), rx));
        sessions.insert(session_id.to_string(), tx.clone());
        tx
    }

    /// 注册一条新情境并异步通知该会话的所有订阅者。
    /// 通知是逐订阅者独立派发的任务, 相互之间无顺序,
    /// 本调用不等它们结束, 也不保证送达。
    pub async fn register_context(
        &self,
        session_id: &str,
        context_type: &str,
        context_value: Value,
    ) -> Result<ConditionalContext, ContextError> {
        let tx = self.session_tx(session_id).await;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(SessionCommand::Register {
            context_type: context_type.to_string(),
            context_value,
            reply: reply_tx,
        })
        .await
        .map_err(|_| ContextError::SessionClosed(session_id.to_string()))?;

        reply_rx
            .await
            .map_err(|_| ContextError::SessionClosed(session_id.to_string()))
    }

    /// 返回会话累计的全部情境 (无过期语义)
    pub async fn get_active_contexts(
        &self,
        session_id: &str,
    ) -> Result<Vec<ConditionalContext>, ContextError> {
        let tx = self.session_tx(session_id).await;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(SessionCommand::GetActive { reply: reply_tx })
            .await
            .map_err(|_| ContextError::SessionClosed(session_id.to_string()))?;

        reply_rx
            .await
            .map_err(|_| ContextError::SessionClosed(session_id.to_string()))
    }

    pub async fn subscribe(
        &self,
        session_id: &str,
        subscriber: Arc<dyn ContextSubscriber>,
    ) -> Result<(), ContextError> {
        let tx = self.session_tx(session_id).await;
        tx.send(SessionCommand::Subscribe { subscriber })
            .await
            .map_err(|_| ContextError::SessionClosed(session_id.to_string()))
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn session_actor(session_id: String, mut rx: mpsc::Receiver<SessionCommand>) {
    let mut contexts: Vec<ConditionalContext> = Vec::new();
    let mut subscribers: Vec<Arc<dyn ContextSubscriber>> = Vec::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Register {
                context_type,
                context_value,
                reply,
            } => {
                let context = ConditionalContext::new(&session_id, &context_type, context_value);
                debug!(
                    session_id = %session_id,
                    context_type = %context.context_type,
                    "注册情境"
                );
                contexts.push(context.clone());

                // 通知即发即忘, 订阅者任务崩溃不影响注册方
                for subscriber in &subscribers {
                    let subscriber = subscriber.clone();
                    let context = context.clone();
                    tokio::spawn(async move {
                        subscriber.on_context_changed(context).await;
                    });
                }

                let _ = reply.send(context);
            }
            SessionCommand::GetActive { reply } => {
                let _ = reply.send(contexts.clone());
            }
            SessionCommand::Subscribe { subscriber } => {
                subscribers.push(subscriber);
            }
        }
    }
}
