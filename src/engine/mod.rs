mod compiler;
mod executor;
mod order;
mod registry;
mod service;
mod validator;

pub use compiler::RuleCompiler;
pub use executor::RuleExecutor;
pub use order::execution_order;
pub use registry::{ExecutorRegistry, NodeExecutor, NodeKind};
pub use service::{RuleRepository, RuleService, ServiceError};
pub use validator::validate;
