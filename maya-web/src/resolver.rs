//! 模块解析
//!
//! 把模块图展开为有序、去重的 `(路径, 控制器)` 绑定列表：
//!
//! 1. 模块没有声明控制器时报错
//! 2. 同一模块的声明列表中出现重复控制器时报错
//! 3. 有 bootstrap 控制器时，它必须在声明列表中，并被移动到本模块绑定的最前面
//! 4. 已经出现过的 `路径 + 控制器键` 不会重复绑定
//! 5. 按声明顺序深度优先解析导入的模块，路径为父模块路径加子模块路径
//!
//! 任何错误都会中止整个解析，不产生部分结果。

use maya_core::utils::path::join_paths;
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::controller::ControllerDescriptor;
use crate::error::ResolveError;
use crate::module::{Module, ModuleDescriptor, ModuleRef};
use crate::registry::{ControllerRegistry, DeclarationRegistry};

/// 解析结果：挂载在 `path` 上的控制器
#[derive(Clone)]
pub struct RouteBinding {
    pub path: String,
    pub controller: Arc<ControllerDescriptor>,
}

impl fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.path, self.controller.name)
    }
}

/// 一次启动使用的解析上下文
pub struct Resolver<'a> {
    declarations: &'a DeclarationRegistry,
    controllers: ControllerRegistry,
    /// 已经绑定的 `路径 + 控制器键`
    seen: HashSet<String>,
    /// 当前导入链，用于检测循环导入
    stack: Vec<(TypeId, String)>,
    visited: HashSet<TypeId>,
    modules: Vec<Arc<ModuleDescriptor>>,
}

impl<'a> Resolver<'a> {
    pub fn new(declarations: &'a DeclarationRegistry) -> Self {
        Self {
            declarations,
            controllers: ControllerRegistry::new(),
            seen: HashSet::new(),
            stack: Vec::new(),
            visited: HashSet::new(),
            modules: Vec::new(),
        }
    }

    pub fn resolve<M: Module>(&mut self) -> Result<Vec<RouteBinding>, ResolveError> {
        self.resolve_ref(&ModuleRef::of::<M>())
    }

    pub fn resolve_ref(&mut self, module: &ModuleRef) -> Result<Vec<RouteBinding>, ResolveError> {
        let mut bindings = Vec::new();
        self.resolve_module(module, "", &mut bindings)?;

        tracing::debug!(
            modules = self.modules.len(),
            controllers = self.controllers.len(),
            bindings = bindings.len(),
            "Module graph resolved"
        );
        Ok(bindings)
    }

    /// 解析过程中访问到的模块（每个模块只出现一次，按首次访问顺序）
    pub fn modules(&self) -> &[Arc<ModuleDescriptor>] {
        &self.modules
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    fn resolve_module(
        &mut self,
        module: &ModuleRef,
        parent_path: &str,
        bindings: &mut Vec<RouteBinding>,
    ) -> Result<(), ResolveError> {
        if let Some(start) = self.stack.iter().position(|(id, _)| *id == module.type_id) {
            let mut chain: Vec<String> = self.stack[start..].iter().map(|(_, name)| name.clone()).collect();
            chain.push(self.stack[start].1.clone());
            return Err(ResolveError::CircularImport {
                module: self.stack[start].1.clone(),
                chain,
            });
        }

        let descriptor = self.declarations.module(module);
        let path = join_paths(parent_path, &descriptor.path);

        if descriptor.declarations.is_empty() {
            return Err(ResolveError::EmptyDeclarations {
                module: descriptor.name.clone(),
            });
        }

        let mut declared = Vec::with_capacity(descriptor.declarations.len());
        let mut local_keys = HashSet::new();
        for reference in &descriptor.declarations {
            let controller = self.declarations.controller(reference);
            if !local_keys.insert(controller.key) {
                return Err(ResolveError::DuplicateDeclaration {
                    module: descriptor.name.clone(),
                    controller: controller.name.clone(),
                });
            }
            if !self.controllers.register_if_absent(&controller.key) {
                tracing::debug!(
                    controller = %controller.name,
                    module = %descriptor.name,
                    "Controller shared with another module"
                );
            }
            declared.push(controller);
        }

        if let Some(reference) = &descriptor.bootstrap {
            let bootstrap = self.declarations.controller(reference);
            let index = declared
                .iter()
                .position(|c| c.key == bootstrap.key)
                .ok_or_else(|| ResolveError::UndeclaredDeclaration {
                    controller: bootstrap.name.clone(),
                    module: descriptor.name.clone(),
                })?;
            let bootstrap = declared.remove(index);
            declared.insert(0, bootstrap);
        }

        for controller in declared {
            if self.seen.insert(format!("{}{}", path, controller.key)) {
                bindings.push(RouteBinding {
                    path: path.clone(),
                    controller,
                });
            } else {
                tracing::debug!(path = %path, controller = %controller.name, "Controller already mounted, skipping");
            }
        }

        if self.visited.insert(module.type_id) {
            self.modules.push(Arc::clone(&descriptor));
        }

        self.stack.push((module.type_id, descriptor.name.clone()));
        for import in &descriptor.imports {
            self.resolve_module(import, &path, bindings)?;
        }
        self.stack.pop();

        Ok(())
    }
}
