// maya-core: Maya 框架的基础设施
//
// 提供：
// - 按类型挂载的元数据存储（替代装饰器反射）
// - 依赖注入解析器（单例缓存、循环依赖检测）
// - 分层配置（TOML / 环境变量 / 内存）
// - 日志初始化
// - 统一错误类型

pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod scope;
pub mod utils;

pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use constants::*;
pub use container::{Injectable, Injector};
pub use error::{
    ApplicationError, ApplicationResult, ContainerError, ContainerResult, Result,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metadata::{Metadata, MetadataStore};
pub use scope::Scope;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::config::{
        ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
        TomlPropertySource,
    };
    pub use crate::container::{Injectable, Injector};
    pub use crate::error::{
        ApplicationError, ApplicationResult, ContainerError, ContainerResult, Result,
    };
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::metadata::{Metadata, MetadataStore};
    pub use crate::scope::Scope;
    pub use crate::utils;
    pub use anyhow::{anyhow, Context};
}
