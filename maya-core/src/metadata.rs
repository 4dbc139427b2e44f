//! 元数据存储
//!
//! 以 `(类型, 键)` 为索引的通用键值存储。控制器和模块的静态配置
//! 在注册时写入这里，解析器和路由表构建器再从这里读取，
//! 不改变类型本身的运行时行为。

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type MetadataValue = Arc<dyn Any + Send + Sync>;

/// 按类型挂载的元数据存储
#[derive(Default)]
pub struct MetadataStore {
    entries: RwLock<HashMap<(TypeId, &'static str), MetadataValue>>,
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取类型 `T` 的元数据视图
    pub fn of<T: 'static>(&self) -> Metadata<'_> {
        self.target(TypeId::of::<T>())
    }

    /// 获取任意目标的元数据视图
    pub fn target(&self, target: TypeId) -> Metadata<'_> {
        Metadata {
            store: self,
            target,
        }
    }

    /// 读取元数据
    ///
    /// 键不存在或者值的类型不是 `V` 时返回 `None`
    pub fn get<V: Any + Send + Sync>(&self, target: TypeId, key: &'static str) -> Option<Arc<V>> {
        let value = self.entries.read().get(&(target, key)).cloned()?;
        value.downcast::<V>().ok()
    }

    /// 定义元数据，已有的值会被覆盖
    pub fn define<V: Any + Send + Sync>(&self, target: TypeId, key: &'static str, value: V) {
        self.define_arc(target, key, Arc::new(value));
    }

    /// 定义共享的元数据值，之后 `get` 返回同一个 `Arc`
    pub fn define_arc<V: Any + Send + Sync>(&self, target: TypeId, key: &'static str, value: Arc<V>) {
        self.entries.write().insert((target, key), value);
    }

    pub fn has(&self, target: TypeId, key: &'static str) -> bool {
        self.entries.read().contains_key(&(target, key))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// 单个目标类型上的元数据视图
#[derive(Clone, Copy)]
pub struct Metadata<'a> {
    store: &'a MetadataStore,
    target: TypeId,
}

impl<'a> Metadata<'a> {
    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn get<V: Any + Send + Sync>(&self, key: &'static str) -> Option<Arc<V>> {
        self.store.get(self.target, key)
    }

    pub fn define<V: Any + Send + Sync>(&self, key: &'static str, value: V) {
        self.store.define(self.target, key, value)
    }

    pub fn define_arc<V: Any + Send + Sync>(&self, key: &'static str, value: Arc<V>) {
        self.store.define_arc(self.target, key, value)
    }

    pub fn has(&self, key: &'static str) -> bool {
        self.store.has(self.target, key)
    }
}
