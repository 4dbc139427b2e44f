//! Maya Web 演示应用
//!
//! ```text
//! GET    /                 应用信息
//! POST   /echo             回显请求
//! GET    /users            用户列表
//! GET    /users/:id        查询用户
//! POST   /users            创建用户（name / email / password 验证）
//! PATCH  /users/:id        更新用户
//! DELETE /users/:id        删除用户
//! ```

mod controller;
mod database;
mod models;
mod service;

use maya_web::prelude::*;

use controller::{HomeController, UserController};
use database::MemoryDatabase;
use service::UserService;

// ==================== 模块 ====================

struct UsersModule;

impl Module for UsersModule {
    fn describe() -> ModuleDescriptor {
        ModuleDescriptor::builder::<Self>()
            .path("users")
            .declare::<UserController>()
            .provide::<UserService>()
            .export::<UserService>()
            .build()
    }
}

struct AppModule;

impl Module for AppModule {
    fn describe() -> ModuleDescriptor {
        ModuleDescriptor::builder::<Self>()
            .declare::<HomeController>()
            .bootstrap::<HomeController>()
            .import::<UsersModule>()
            .database(MemoryDatabase::new("main"))
            .build()
    }
}

fn configure() -> ApplicationResult<ServerConfig> {
    Ok(ServerConfig::load()?.logging(LoggingConfig::from_env()))
}

#[tokio::main]
async fn main() -> ApplicationResult<()> {
    let app = configure()?.bootstrap_module::<AppModule>(DeclarationRegistry::new())?;

    for route in app.routes() {
        tracing::info!("{}", route);
    }

    app.start().await
}
