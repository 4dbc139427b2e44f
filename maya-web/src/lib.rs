//! # Maya Web
//!
//! 基于 Axum 的模块化 Web 框架
//!
//! ## 核心概念
//!
//! - **控制器** - 实现 `Controller`，在 `configure` 中声明路由和中间件
//! - **模块** - 把控制器组织在一个路径前缀下，并可以导入其它模块
//! - **解析** - 启动时展开模块图，得到有序、去重的控制器绑定
//! - **路由表** - 绑定转换为 axum `Router`，请求错误不会影响进程
//! - **验证** - `Check` 验证链直接作为路由中间件使用

pub mod app;
pub mod constants;
pub mod controller;
pub mod database;
pub mod error;
pub mod middleware;
pub mod module;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod response;
pub mod routing;
pub mod server;

pub use app::{config_server, MayaApplication, Plugin, ServerConfig};
pub use controller::{Controller, ControllerKey, RequestMethod, Routes};
pub use error::{RequestError, ResolveError};
pub use module::{Module, ModuleDescriptor};
pub use registry::DeclarationRegistry;
pub use request::MayaRequest;
pub use response::{IntoReply, Reply, ResponseEntity};

pub use async_trait::async_trait;
pub use axum;

pub mod prelude {
    //! 预导入模块

    pub use maya_core::prelude::{
        anyhow, ApplicationError, ApplicationResult, ContainerError, ContainerResult, Context,
        Environment, Injectable, Injector, LogFormat, LogLevel, LoggingConfig, Scope,
    };
    pub use maya_validator::{Check, RequestSource, ValidationError};

    pub use crate::app::{config_server, MayaApplication, ServerConfig};
    pub use crate::controller::{Controller, ControllerKey, RequestMethod, Routes};
    pub use crate::database::{DatabaseModule, DatabaseRegistry, ModelDictionary};
    pub use crate::middleware::{middleware_fn, AsMiddleware, Middleware, MiddlewareOutcome};
    pub use crate::module::{Module, ModuleDescriptor};
    pub use crate::registry::DeclarationRegistry;
    pub use crate::request::MayaRequest;
    pub use crate::resolver::{Resolver, RouteBinding};
    pub use crate::response::{IntoReply, Reply, ResponseEntity};
    pub use crate::server::ServerProperties;

    pub use async_trait::async_trait;
    pub use axum::http::StatusCode;
    pub use axum::Json;
    pub use serde_json::{json, Value};
}
