use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("规则图缺少起始节点")]
    MissingStartNode,

    #[error("起始节点不存在: {0}")]
    StartNodeNotFound(String),

    #[error("连接引用了不存在的节点: {0}")]
    NodeNotFound(String),

    #[error("连接引用了未声明的端口: {node}.{port}")]
    PortNotFound { node: String, port: String },

    #[error("循环依赖: {0}")]
    CircularDependency(String),

    #[error("执行顺序与节点数不一致: 排序 {ordered} / 节点 {total}")]
    OrderMismatch { ordered: usize, total: usize },
}

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("会话通道已关闭: {0}")]
    SessionClosed(String),
}

/// 执行错误的严重程度, 由抛出方显式指定, 从不根据错误文本推断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// 记录后继续执行后续节点
    Recoverable,
    /// 中止整次执行
    Fatal,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("除数为零")]
    DivisionByZero,

    #[error("未知运算符: {0}")]
    UnknownOperator(String),

    #[error("骰子表达式解析失败: {0}")]
    InvalidDiceNotation(String),

    #[error("随机区间无效: min={min} max={max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("节点输入无效: {0}")]
    InvalidInput(String),

    #[error("找不到节点执行器: {0}")]
    ExecutorNotFound(String),

    #[error("节点执行失败: {0}")]
    Node(String),

    #[error("致命错误: {0}")]
    Fatal(String),
}

impl ExecutionError {
    pub fn severity(&self) -> Severity {
        match self {
            ExecutionError::Fatal(_) => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
