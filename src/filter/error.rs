//! 过滤模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。所有错误都局限于单个处理周期，
//! 调度器记录后丢弃，不会向页面传播。

use std::fmt;

use thiserror::Error;

use crate::env::EnvError;

/// 过滤错误类型
#[derive(Error, Debug, Clone)]
pub enum FilterError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 远程过程返回的异常
    #[error("远程调用失败 [{errorcode}]: {message}")]
    RemoteError { errorcode: String, message: String },

    /// 响应条数与请求不一致
    #[error("响应长度不匹配: 期望 {expected} 条，实际 {actual} 条")]
    ResponseMismatch { expected: usize, actual: usize },

    /// 超时错误
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),
}

impl FilterError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            FilterError::NetworkError(_) => true,
            FilterError::TimeoutError(_) => true,
            FilterError::RemoteError { .. } => false,
            FilterError::ResponseMismatch { .. } => false,
            FilterError::ConfigError(_) => false,
            FilterError::ParseError(_) => false,
            FilterError::SerializationError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FilterError::ConfigError(_) => ErrorSeverity::Critical,
            FilterError::NetworkError(_) => ErrorSeverity::Warning,
            FilterError::RemoteError { .. } => ErrorSeverity::Error,
            FilterError::ResponseMismatch { .. } => ErrorSeverity::Error,
            FilterError::TimeoutError(_) => ErrorSeverity::Warning,
            FilterError::ParseError(_) => ErrorSeverity::Error,
            FilterError::SerializationError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            FilterError::ConfigError(_) => ErrorCategory::Configuration,
            FilterError::NetworkError(_) => ErrorCategory::Network,
            FilterError::RemoteError { .. } => ErrorCategory::Remote,
            FilterError::ResponseMismatch { .. } => ErrorCategory::Protocol,
            FilterError::TimeoutError(_) => ErrorCategory::Timeout,
            FilterError::ParseError(_) => ErrorCategory::Parsing,
            FilterError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let new_msg = format!("{} (上下文: {})", self, context);

        match self {
            FilterError::ConfigError(_) => FilterError::ConfigError(new_msg),
            FilterError::NetworkError(_) => FilterError::NetworkError(new_msg),
            FilterError::TimeoutError(_) => FilterError::TimeoutError(new_msg),
            FilterError::ParseError(_) => FilterError::ParseError(new_msg),
            FilterError::SerializationError(_) => FilterError::SerializationError(new_msg),
            // 结构化变体保持原样
            other => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Remote,
    Protocol,
    Timeout,
    Parsing,
    Serialization,
}

impl From<serde_json::Error> for FilterError {
    fn from(error: serde_json::Error) -> Self {
        FilterError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for FilterError {
    fn from(error: toml::de::Error) -> Self {
        FilterError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<EnvError> for FilterError {
    fn from(error: EnvError) -> Self {
        FilterError::ConfigError(error.to_string())
    }
}

#[cfg(feature = "ajax")]
impl From<reqwest::Error> for FilterError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FilterError::TimeoutError(error.to_string())
        } else if error.is_decode() {
            FilterError::ParseError(format!("响应解码失败: {}", error))
        } else {
            FilterError::NetworkError(error.to_string())
        }
    }
}

/// 错误结果类型别名
pub type FilterResult<T> = Result<T, FilterError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &FilterError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("过滤信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("过滤警告: {}", error),
            ErrorSeverity::Error => tracing::error!("过滤错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("过滤严重错误: {}", error),
        }
    }
}
