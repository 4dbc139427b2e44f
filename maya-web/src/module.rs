//! 模块声明
//!
//! 模块把控制器、服务和数据库组织在一个路径前缀下，并可以导入其它模块。

use maya_core::{utils::naming, ContainerResult, Injectable, Injector};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::controller::{Controller, ControllerRef};
use crate::database::DatabaseModule;

/// 模块
pub trait Module: 'static {
    fn describe() -> ModuleDescriptor;

    fn name() -> &'static str {
        naming::type_name_of::<Self>()
    }
}

/// 对模块类型的引用
#[derive(Clone, Copy)]
pub struct ModuleRef {
    pub type_id: TypeId,
    pub name: &'static str,
    pub(crate) describe: fn() -> ModuleDescriptor,
}

impl ModuleRef {
    pub fn of<M: Module>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: M::name(),
            describe: M::describe,
        }
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 启动时需要提前构造的服务
#[derive(Clone, Copy)]
pub struct ProviderRef {
    pub name: &'static str,
    resolve: fn(&Injector) -> ContainerResult<()>,
}

impl ProviderRef {
    pub fn of<T: Injectable>() -> Self {
        Self {
            name: naming::type_name_of::<T>(),
            resolve: |injector| injector.resolve::<T>().map(|_| ()),
        }
    }

    pub fn resolve(&self, injector: &Injector) -> ContainerResult<()> {
        (self.resolve)(injector)
    }
}

impl fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 模块描述符
#[derive(Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    /// 路径前缀，默认为空
    pub path: String,
    pub declarations: Vec<ControllerRef>,
    pub imports: Vec<ModuleRef>,
    /// 挂载在模块根路径上的控制器，必须同时出现在 `declarations` 中
    pub bootstrap: Option<ControllerRef>,
    pub providers: Vec<ProviderRef>,
    pub exports: Vec<&'static str>,
    pub databases: Vec<Arc<dyn DatabaseModule>>,
}

impl ModuleDescriptor {
    pub fn builder<M: Module>() -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder::new(M::name())
    }

    /// 不绑定模块类型的构建器，测试中手工构造描述符时使用
    pub fn named(name: impl Into<String>) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder::new(name)
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("declarations", &self.declarations)
            .field("imports", &self.imports)
            .field("bootstrap", &self.bootstrap)
            .field("providers", &self.providers)
            .field("exports", &self.exports)
            .field(
                "databases",
                &self.databases.iter().map(|db| db.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// 模块描述符构建器
pub struct ModuleDescriptorBuilder {
    descriptor: ModuleDescriptor,
}

impl ModuleDescriptorBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ModuleDescriptor {
                name: name.into(),
                path: String::new(),
                declarations: Vec::new(),
                imports: Vec::new(),
                bootstrap: None,
                providers: Vec::new(),
                exports: Vec::new(),
                databases: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = name.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.descriptor.path = path.into();
        self
    }

    pub fn declare<C: Controller>(mut self) -> Self {
        self.descriptor.declarations.push(ControllerRef::of::<C>());
        self
    }

    pub fn import<M: Module>(mut self) -> Self {
        self.descriptor.imports.push(ModuleRef::of::<M>());
        self
    }

    pub fn bootstrap<C: Controller>(mut self) -> Self {
        self.descriptor.bootstrap = Some(ControllerRef::of::<C>());
        self
    }

    pub fn provide<T: Injectable>(mut self) -> Self {
        self.descriptor.providers.push(ProviderRef::of::<T>());
        self
    }

    pub fn export<T: 'static>(mut self) -> Self {
        self.descriptor.exports.push(naming::type_name_of::<T>());
        self
    }

    pub fn database(mut self, database: impl DatabaseModule + 'static) -> Self {
        self.descriptor.databases.push(Arc::new(database));
        self
    }

    pub fn build(self) -> ModuleDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Routes;

    struct HomeController;

    impl Injectable for HomeController {
        fn inject(_: &Injector) -> ContainerResult<Self> {
            Ok(HomeController)
        }
    }

    impl Controller for HomeController {
        fn configure(routes: &mut Routes<Self>) {
            routes.get("/", |_, _| async { "home" });
        }
    }

    struct Clock;

    impl Injectable for Clock {
        fn inject(_: &Injector) -> ContainerResult<Self> {
            Ok(Clock)
        }
    }

    struct SharedModule;

    impl Module for SharedModule {
        fn describe() -> ModuleDescriptor {
            ModuleDescriptor::builder::<Self>()
                .declare::<HomeController>()
                .build()
        }
    }

    struct AppModule;

    impl Module for AppModule {
        fn describe() -> ModuleDescriptor {
            ModuleDescriptor::builder::<Self>()
                .path("/api")
                .declare::<HomeController>()
                .bootstrap::<HomeController>()
                .import::<SharedModule>()
                .provide::<Clock>()
                .export::<Clock>()
                .build()
        }
    }

    #[test]
    fn test_builder_collects_references() {
        let descriptor = AppModule::describe();

        assert_eq!(descriptor.name, "AppModule");
        assert_eq!(descriptor.path, "/api");
        assert_eq!(descriptor.declarations.len(), 1);
        assert_eq!(descriptor.declarations[0].name, "HomeController");
        assert_eq!(descriptor.bootstrap.map(|b| b.name), Some("HomeController"));
        assert_eq!(descriptor.imports[0].name, "SharedModule");
        assert_eq!(descriptor.exports, vec!["Clock"]);
    }

    #[test]
    fn test_provider_resolution() {
        let injector = Injector::new();
        let descriptor = AppModule::describe();

        descriptor.providers[0].resolve(&injector).unwrap();
        assert!(injector.contains::<Clock>());
    }

    #[test]
    fn test_named_builder() {
        let descriptor = ModuleDescriptor::named("Adhoc").path("/x").build();
        assert_eq!(descriptor.name, "Adhoc");
        assert!(descriptor.declarations.is_empty());
    }
}
