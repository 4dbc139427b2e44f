//! 框架错误类型
//!
//! - `ContainerError`：依赖注入解析阶段的错误
//! - `ApplicationError`：启动阶段（配置、日志、模块解析、服务器）的错误
//!
//! 业务代码（控制器方法）统一使用 `anyhow::Result`，通过 `.context()` 补充上下文。

use thiserror::Error;

pub use anyhow::Result;

/// 依赖注入容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 构造链上出现了正在创建中的类型
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    /// 构造函数返回了错误
    #[error("Failed to create '{name}': {reason}")]
    CreationFailed { name: String, reason: String },

    /// 缓存中的实例与请求的类型不一致
    #[error("Instance registered for '{0}' has an unexpected type")]
    TypeMismatch(String),
}

impl ContainerError {
    /// 便捷构造：在 `Injectable::inject` 中报告构造失败
    pub fn creation(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::CreationFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 应用启动错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    /// 模块图解析失败，启动必须中止
    #[error("Module resolution failed: {0}")]
    Resolution(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 路由表构建失败（例如路径冲突）
    #[error("Route table error: {0}")]
    Routing(String),

    #[error("Database '{name}' failed: {reason}")]
    Database { name: String, reason: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ApplicationResult<T> = std::result::Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message() {
        let error = ContainerError::CircularDependency(vec![
            "A".to_string(),
            "B".to_string(),
            "A".to_string(),
        ]);
        assert_eq!(error.to_string(), "Circular dependency detected: A -> B -> A");
    }

    #[test]
    fn test_container_error_converts_to_application_error() {
        let error: ApplicationError = ContainerError::creation("UserService", "boom").into();
        assert!(matches!(error, ApplicationError::Container(_)));
        assert!(error.to_string().contains("UserService"));
    }
}
