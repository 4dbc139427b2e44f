//! Web 服务器模块
//!
//! 基于 Axum 的 Web 服务器实现

use axum::Router;
use maya_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::net::TcpListener;

use crate::constants::{keys, DEFAULT_BODY_LIMIT, DEFAULT_HOST, DEFAULT_PORT};

/// Web 服务器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProperties {
    /// 服务器监听地址
    pub host: String,

    /// 服务器监听端口
    pub port: u16,

    /// 是否启用 CORS
    pub enable_cors: bool,

    /// 是否输出请求日志和数据库连接日志
    pub logs: bool,

    /// 生产模式：日志使用紧凑格式
    pub production: bool,

    /// 请求体大小上限（字节）
    pub body_limit: usize,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            enable_cors: true,
            logs: true,
            production: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerProperties {
    /// 从 Environment 加载配置，缺失或无效的值使用默认值
    pub fn from_environment(env: &Environment) -> Self {
        let defaults = Self::default();
        Self {
            host: env.get_string(keys::SERVER_HOST).unwrap_or(defaults.host),
            port: env
                .get_i64(keys::SERVER_PORT)
                .and_then(|port| u16::try_from(port).ok())
                .unwrap_or(defaults.port),
            enable_cors: env
                .get_bool(keys::SERVER_ENABLE_CORS)
                .unwrap_or(defaults.enable_cors),
            logs: env.get_bool(keys::SERVER_LOGS).unwrap_or(defaults.logs),
            production: env
                .get_bool(keys::SERVER_PRODUCTION)
                .unwrap_or(defaults.production),
            body_limit: env
                .get_i64(keys::SERVER_BODY_LIMIT)
                .and_then(|limit| usize::try_from(limit).ok())
                .unwrap_or(defaults.body_limit),
        }
    }

    /// 获取服务器地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Maya Web 服务器
pub struct MayaWebServer {
    properties: ServerProperties,
    router: Router,
}

impl MayaWebServer {
    pub fn new(properties: ServerProperties, router: Router) -> Self {
        Self { properties, router }
    }

    pub fn properties(&self) -> &ServerProperties {
        &self.properties
    }

    /// 绑定地址
    pub async fn bind(&self) -> ApplicationResult<TcpListener> {
        let addr = self.properties.address();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| ApplicationError::Server(format!("Failed to bind to {}: {}", addr, e)))
    }

    /// 在已绑定的监听器上提供服务，直到 `shutdown` 完成
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> ApplicationResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApplicationError::Server(format!("Server error: {}", e)))
    }

    /// 启动服务器，收到 Ctrl-C 后优雅退出
    pub async fn run(self) -> ApplicationResult<()> {
        let listener = self.bind().await?;
        tracing::info!("Server listening on http://{}", self.properties.address());
        self.serve(listener, shutdown_signal()).await
    }
}

/// 等待 Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server");
}
