//! 控制器和模块的注册
//!
//! `DeclarationRegistry` 取代装饰器：控制器和模块第一次被引用时调用
//! `Controller::configure` / `Module::describe`，结果写入元数据存储，之后只读。
//! 每次启动各自持有一个注册表，没有进程级全局状态。

use maya_core::{
    constants::{CONTROLLER_DESCRIPTOR, CONTROLLER_KEY, CONTROLLER_NAME, MODULE_DESCRIPTOR, MODULE_NAME},
    Injector, MetadataStore,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::controller::{Controller, ControllerDescriptor, ControllerKey, ControllerRef};
use crate::module::{Module, ModuleDescriptor, ModuleRef};

/// 控制器和模块声明的注册表
#[derive(Debug, Default)]
pub struct DeclarationRegistry {
    metadata: MetadataStore,
    injector: Arc<Injector>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用外部创建（可能已经预置了实例）的解析器
    pub fn with_injector(injector: Arc<Injector>) -> Self {
        Self {
            metadata: MetadataStore::new(),
            injector,
        }
    }

    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// 注册控制器，返回它的键
    ///
    /// 重复注册同一个类型返回首次生成的键。
    pub fn register_controller<C: Controller>(&self) -> ControllerKey {
        self.controller(&ControllerRef::of::<C>()).key
    }

    pub fn register_module<M: Module>(&self) -> Arc<ModuleDescriptor> {
        self.module(&ModuleRef::of::<M>())
    }

    pub fn controller_descriptor<C: Controller>(&self) -> Option<Arc<ControllerDescriptor>> {
        self.metadata.of::<C>().get(CONTROLLER_DESCRIPTOR)
    }

    /// 按引用获取控制器描述符，第一次引用时注册
    pub(crate) fn controller(&self, controller: &ControllerRef) -> Arc<ControllerDescriptor> {
        let meta = self.metadata.target(controller.type_id);
        if let Some(descriptor) = meta.get::<ControllerDescriptor>(CONTROLLER_DESCRIPTOR) {
            return descriptor;
        }

        let key = meta
            .get::<ControllerKey>(CONTROLLER_KEY)
            .map(|key| *key)
            .unwrap_or_else(ControllerKey::generate);
        let descriptor = Arc::new((controller.describe)(key));

        meta.define(CONTROLLER_KEY, key);
        meta.define(CONTROLLER_NAME, descriptor.name.clone());
        meta.define_arc(CONTROLLER_DESCRIPTOR, Arc::clone(&descriptor));

        tracing::debug!(
            controller = %descriptor.name,
            key = %key,
            routes = descriptor.routes.len(),
            "Registered controller"
        );
        descriptor
    }

    /// 按引用获取模块描述符，第一次引用时注册
    pub(crate) fn module(&self, module: &ModuleRef) -> Arc<ModuleDescriptor> {
        let meta = self.metadata.target(module.type_id);
        if let Some(descriptor) = meta.get::<ModuleDescriptor>(MODULE_DESCRIPTOR) {
            return descriptor;
        }

        let descriptor = Arc::new((module.describe)());
        meta.define(MODULE_NAME, descriptor.name.clone());
        meta.define_arc(MODULE_DESCRIPTOR, Arc::clone(&descriptor));

        tracing::debug!(
            module = %descriptor.name,
            declarations = descriptor.declarations.len(),
            imports = descriptor.imports.len(),
            "Registered module"
        );
        descriptor
    }
}

/// 已挂载控制器的集合
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    keys: HashSet<ControllerKey>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次登记返回 `true`
    pub fn register_if_absent(&mut self, key: &ControllerKey) -> bool {
        self.keys.insert(*key)
    }

    pub fn contains(&self, key: &ControllerKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
