use maya_web::prelude::*;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 演示用的内存数据库
pub struct MemoryDatabase {
    name: &'static str,
    logs: AtomicBool,
}

impl MemoryDatabase {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            logs: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DatabaseModule for MemoryDatabase {
    fn name(&self) -> &str {
        self.name
    }

    fn connection(&self, logs: bool) {
        self.logs.store(logs, Ordering::Relaxed);
    }

    async fn connect(&self) -> anyhow::Result<()> {
        if self.logs.load(Ordering::Relaxed) {
            tracing::info!(database = self.name, "Connecting to in-memory database");
        }
        Ok(())
    }

    async fn models(&self) -> anyhow::Result<ModelDictionary> {
        let mut models = ModelDictionary::new();
        models.insert(
            "User".to_string(),
            Arc::new(vec!["id", "name", "email"]) as Arc<dyn Any + Send + Sync>,
        );
        Ok(models)
    }
}
