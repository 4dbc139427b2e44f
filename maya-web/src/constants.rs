//! Web 层常量

/// 默认监听地址
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// 默认端口
pub const DEFAULT_PORT: u16 = 3333;

/// 请求体大小上限（50 MiB）
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// 环境变量前缀，例如 `MAYA_SERVER_PORT`
pub const ENV_PREFIX: &str = "MAYA";

/// 默认配置文件
pub const CONFIG_FILE: &str = "application.toml";

/// 请求 ID 响应头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 配置键
pub mod keys {
    pub const SERVER_HOST: &str = "server.host";
    pub const SERVER_PORT: &str = "server.port";
    pub const SERVER_ENABLE_CORS: &str = "server.enable-cors";
    pub const SERVER_LOGS: &str = "server.logs";
    pub const SERVER_PRODUCTION: &str = "server.production";
    pub const SERVER_BODY_LIMIT: &str = "server.body-limit";
}
