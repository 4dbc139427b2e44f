//! 数据库模块
//!
//! 模块可以挂载数据库，应用启动（开始监听）后并发连接所有数据库，
//! 连接成功后把数据库的模型登记到 `DatabaseRegistry`。
//! 连接失败只记录日志，不会停止已经在运行的服务器。

use async_trait::async_trait;
use futures_util::future::try_join_all;
use maya_core::{ApplicationError, ApplicationResult, ContainerResult, Injectable, Injector};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// 模型字典：模型名称 -> 模型对象
pub type ModelDictionary = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// 数据库模块
#[async_trait]
pub trait DatabaseModule: Send + Sync {
    /// 在 `DatabaseRegistry` 中登记使用的名称
    fn name(&self) -> &str;

    /// 连接前调用，`logs` 为服务器是否开启日志
    fn connection(&self, logs: bool) {
        let _ = logs;
    }

    async fn connect(&self) -> anyhow::Result<()>;

    async fn models(&self) -> anyhow::Result<ModelDictionary>;
}

/// 已连接的数据库及其模型
#[derive(Default)]
pub struct DatabaseRegistry {
    databases: RwLock<HashMap<String, Arc<ModelDictionary>>>,
}

impl Injectable for DatabaseRegistry {
    fn inject(_: &Injector) -> ContainerResult<Self> {
        Ok(DatabaseRegistry::default())
    }
}

impl std::fmt::Debug for DatabaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseRegistry")
            .field("databases", &self.names())
            .finish()
    }
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, models: ModelDictionary) {
        self.databases.write().insert(name.into(), Arc::new(models));
    }

    /// 数据库的全部模型，未连接时返回 `None`
    pub fn get(&self, name: &str) -> Option<Arc<ModelDictionary>> {
        self.databases.read().get(name).cloned()
    }

    /// 按类型取出某个模型
    pub fn model<T: Any + Send + Sync>(&self, database: &str, model: &str) -> Option<Arc<T>> {
        let models = self.get(database)?;
        models.get(model).cloned()?.downcast::<T>().ok()
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.databases.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// 并发连接所有数据库
///
/// 任意一个失败时返回第一个错误，已经成功的数据库仍然保留在注册表中。
pub async fn connect_databases(
    databases: &[Arc<dyn DatabaseModule>],
    logs: bool,
    registry: &DatabaseRegistry,
) -> ApplicationResult<()> {
    if databases.is_empty() {
        return Ok(());
    }

    try_join_all(databases.iter().map(|database| async move {
        let name = database.name().to_string();
        let failed = |e: anyhow::Error| ApplicationError::Database {
            name: name.clone(),
            reason: format!("{e:#}"),
        };

        database.connection(logs);
        database.connect().await.map_err(failed)?;
        let models = database.models().await.map_err(failed)?;

        if logs {
            tracing::info!(database = %name, models = models.len(), "Database connected");
        }
        registry.insert(name.clone(), models);
        Ok::<_, ApplicationError>(())
    }))
    .await?;

    Ok(())
}
