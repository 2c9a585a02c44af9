pub mod context;
pub mod engine;
pub mod executors;
pub mod types;
pub mod utils;

pub use context::{apply_conditional_rules, ContextManager, ContextSubscriber};
pub use engine::{ExecutorRegistry, NodeExecutor, NodeKind, RuleCompiler, RuleExecutor};
pub use types::*;
