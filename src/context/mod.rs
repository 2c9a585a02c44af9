mod conditions;
mod manager;
mod modifier;

pub use conditions::{evaluate_condition, evaluate_conditions};
pub use manager::{ContextManager, ContextSubscriber};
pub use modifier::{apply_conditional_rules, apply_modification_set, builtin_modifiers};
