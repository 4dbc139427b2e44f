//! 依赖注入解析器
//!
//! `Injector` 负责创建控制器和服务实例：
//! - `Scope::Singleton` 的实例按类型缓存，之后的解析返回同一个 `Arc`
//! - `Scope::Prototype` 每次解析都重新构造
//! - 构造过程中出现回到自身的依赖会返回 `ContainerError::CircularDependency`

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};
use crate::utils::dependency::CreationTracker;
use crate::Scope;

/// 可由 `Injector` 构造的类型
///
/// # 示例
///
/// ```
/// use maya_core::prelude::*;
/// use std::sync::Arc;
///
/// struct UserRepository;
///
/// impl Injectable for UserRepository {
///     fn inject(_: &Injector) -> ContainerResult<Self> {
///         Ok(UserRepository)
///     }
/// }
///
/// struct UserService {
///     repository: Arc<UserRepository>,
/// }
///
/// impl Injectable for UserService {
///     fn inject(injector: &Injector) -> ContainerResult<Self> {
///         Ok(UserService { repository: injector.resolve()? })
///     }
/// }
///
/// let injector = Injector::new();
/// let service = injector.resolve::<UserService>().unwrap();
/// assert!(Arc::ptr_eq(&service.repository, &injector.resolve::<UserRepository>().unwrap()));
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
    /// 构造实例，依赖通过 `injector.resolve()` 获取
    fn inject(injector: &Injector) -> ContainerResult<Self>;

    fn scope() -> Scope {
        Scope::Singleton
    }
}

/// 依赖注入解析器
#[derive(Default)]
pub struct Injector {
    /// 单例缓存（包括通过 `provide` 预置的实例）
    singletons: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,

    /// 循环依赖检测
    tracker: CreationTracker,
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("singletons", &self.singletons.read().len())
            .finish()
    }
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析类型 `T` 的实例
    pub fn resolve<T: Injectable>(&self) -> ContainerResult<Arc<T>> {
        let name = std::any::type_name::<T>();
        let singleton = T::scope() == Scope::Singleton;

        if singleton {
            if let Some(existing) = self.get::<T>() {
                return Ok(existing);
            }
        }

        self.tracker
            .start_creating(name)
            .map_err(ContainerError::CircularDependency)?;
        let created = T::inject(self);
        self.tracker.finish_creating(name);

        let instance = Arc::new(created.map_err(|e| match e {
            ContainerError::CircularDependency(_) => e,
            other => ContainerError::creation(name, other),
        })?);

        if !singleton {
            tracing::trace!(instance = name, "Created prototype instance");
            return Ok(instance);
        }

        let stored = {
            let mut singletons = self.singletons.write();
            Arc::clone(
                singletons
                    .entry(TypeId::of::<T>())
                    .or_insert_with(|| instance as Arc<dyn Any + Send + Sync>),
            )
        };
        tracing::debug!(instance = name, "Cached singleton instance");

        stored
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch(name.to_string()))
    }

    /// 预置一个现成的实例，之后对同类型的解析都返回它
    pub fn provide<T: Any + Send + Sync>(&self, value: T) -> Arc<T> {
        self.provide_arc(Arc::new(value))
    }

    pub fn provide_arc<T: Any + Send + Sync>(&self, value: Arc<T>) -> Arc<T> {
        self.singletons
            .write()
            .insert(TypeId::of::<T>(), Arc::clone(&value) as Arc<dyn Any + Send + Sync>);
        value
    }

    /// 获取已缓存的实例，不会触发构造
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let value = self.singletons.read().get(&TypeId::of::<T>()).cloned()?;
        value.downcast::<T>().ok()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.singletons.read().contains_key(&TypeId::of::<T>())
    }

    /// 已缓存的单例数量
    pub fn len(&self) -> usize {
        self.singletons.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.singletons.read().is_empty()
    }
}
