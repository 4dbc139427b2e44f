//! 控制器和路由声明
//!
//! 控制器通过实现 `Controller` trait 声明自己的路由：
//!
//! ```
//! use maya_web::prelude::*;
//! use std::sync::Arc;
//!
//! struct HealthController;
//!
//! impl Injectable for HealthController {
//!     fn inject(_: &Injector) -> ContainerResult<Self> {
//!         Ok(HealthController)
//!     }
//! }
//!
//! impl HealthController {
//!     async fn status(self: Arc<Self>, _req: MayaRequest) -> Value {
//!         json!({ "status": "up" })
//!     }
//! }
//!
//! impl Controller for HealthController {
//!     fn configure(routes: &mut Routes<Self>) {
//!         routes.get("/health", Self::status);
//!     }
//! }
//! ```

use axum::{http::Method, routing::MethodFilter};
use futures_util::future::BoxFuture;
use maya_core::{utils::naming, ContainerResult, Injectable, Injector};
use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::middleware::{AsMiddleware, Middleware};
use crate::request::MayaRequest;
use crate::response::{IntoReply, Reply};

/// 控制器实例（类型擦除）
pub type ControllerInstance = Arc<dyn Any + Send + Sync>;

/// 类型擦除后的路由处理函数
pub type RouteHandler =
    Arc<dyn Fn(ControllerInstance, MayaRequest) -> BoxFuture<'static, anyhow::Result<Reply>> + Send + Sync>;

/// 支持的 HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Options => "OPTIONS",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            RequestMethod::Get => Method::GET,
            RequestMethod::Post => Method::POST,
            RequestMethod::Put => Method::PUT,
            RequestMethod::Patch => Method::PATCH,
            RequestMethod::Delete => Method::DELETE,
            RequestMethod::Options => Method::OPTIONS,
        }
    }

    pub(crate) fn filter(&self) -> MethodFilter {
        match self {
            RequestMethod::Get => MethodFilter::GET,
            RequestMethod::Post => MethodFilter::POST,
            RequestMethod::Put => MethodFilter::PUT,
            RequestMethod::Patch => MethodFilter::PATCH,
            RequestMethod::Delete => MethodFilter::DELETE,
            RequestMethod::Options => MethodFilter::OPTIONS,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 控制器的进程内唯一键，首次注册时生成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerKey(uuid::Uuid);

impl ControllerKey {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ControllerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一条路由声明
#[derive(Clone)]
pub struct RouteDescriptor {
    /// 相对于控制器挂载点的路径
    pub path: String,
    pub request_method: RequestMethod,
    /// 处理函数名称，仅用于日志
    pub method_name: String,
    pub middlewares: Vec<Arc<dyn Middleware>>,
    pub handler: RouteHandler,
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("request_method", &self.request_method)
            .field("method_name", &self.method_name)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// 控制器
///
/// 实例由 `Injector` 创建，路由在 `configure` 中按顺序声明。
pub trait Controller: Injectable {
    fn configure(routes: &mut Routes<Self>);

    /// 错误信息和日志中使用的名称
    fn name() -> &'static str {
        naming::type_name_of::<Self>()
    }
}

/// 路由声明构建器
pub struct Routes<C> {
    routes: Vec<RouteDescriptor>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Controller> Default for Routes<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Controller> Routes<C> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            _controller: PhantomData,
        }
    }

    /// 声明一条路由
    pub fn route<H, Fut, R>(&mut self, method: RequestMethod, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        let method_name = handler_name::<H>();
        let handler = Arc::new(handler);
        let erased: RouteHandler = Arc::new(move |instance: ControllerInstance, request: MayaRequest| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let controller = instance.downcast::<C>().map_err(|_| {
                    anyhow::anyhow!("controller instance is not a {}", C::name())
                })?;
                handler(controller, request).await.into_reply()
            }) as BoxFuture<'static, anyhow::Result<Reply>>
        });

        self.routes.push(RouteDescriptor {
            path: path.to_string(),
            request_method: method,
            method_name,
            middlewares: Vec::new(),
            handler: erased,
        });

        let index = self.routes.len() - 1;
        RouteOptions {
            route: &mut self.routes[index],
        }
    }

    pub fn get<H, Fut, R>(&mut self, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Get, path, handler)
    }

    pub fn post<H, Fut, R>(&mut self, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Post, path, handler)
    }

    pub fn put<H, Fut, R>(&mut self, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Put, path, handler)
    }

    pub fn patch<H, Fut, R>(&mut self, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Patch, path, handler)
    }

    pub fn delete<H, Fut, R>(&mut self, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Delete, path, handler)
    }

    pub fn options<H, Fut, R>(&mut self, path: &str, handler: H) -> RouteOptions<'_>
    where
        H: Fn(Arc<C>, MayaRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Options, path, handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_routes(self) -> Vec<RouteDescriptor> {
        self.routes
    }
}

/// 刚声明的路由的附加选项
pub struct RouteOptions<'a> {
    route: &'a mut RouteDescriptor,
}

impl<'a> RouteOptions<'a> {
    /// 追加中间件，按追加顺序执行
    pub fn middleware(self, middleware: impl AsMiddleware) -> Self {
        self.route.middlewares.push(middleware.as_middleware());
        self
    }

    pub fn middlewares<I>(self, middlewares: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsMiddleware,
    {
        self.route
            .middlewares
            .extend(middlewares.into_iter().map(AsMiddleware::as_middleware));
        self
    }

    /// 覆盖日志中显示的处理函数名称
    pub fn name(self, name: impl Into<String>) -> Self {
        self.route.method_name = name.into();
        self
    }
}

/// 函数项取最后一段路径作为名称，闭包没有可读的名称
fn handler_name<H>() -> String {
    let full = std::any::type_name::<H>();
    if full.contains("{{closure}}") {
        "anonymous".to_string()
    } else {
        naming::short_type_name(full).to_string()
    }
}

/// 控制器描述符
#[derive(Clone)]
pub struct ControllerDescriptor {
    pub key: ControllerKey,
    pub name: String,
    pub type_id: TypeId,
    pub routes: Vec<RouteDescriptor>,
    instantiate: fn(&Injector) -> ContainerResult<ControllerInstance>,
}

impl ControllerDescriptor {
    /// 调用 `C::configure` 收集路由
    pub fn of<C: Controller>(key: ControllerKey) -> Self {
        let mut routes = Routes::<C>::new();
        C::configure(&mut routes);

        Self {
            key,
            name: C::name().to_string(),
            type_id: TypeId::of::<C>(),
            routes: routes.into_routes(),
            instantiate: instantiate::<C>,
        }
    }

    /// 通过 `Injector` 获取控制器实例
    pub fn instantiate(&self, injector: &Injector) -> ContainerResult<ControllerInstance> {
        (self.instantiate)(injector)
    }
}

fn instantiate<C: Controller>(injector: &Injector) -> ContainerResult<ControllerInstance> {
    injector
        .resolve::<C>()
        .map(|controller| controller as ControllerInstance)
}

impl fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("routes", &self.routes)
            .finish()
    }
}

/// 对控制器类型的引用，模块描述符中用它声明控制器
#[derive(Clone, Copy)]
pub struct ControllerRef {
    pub type_id: TypeId,
    pub name: &'static str,
    pub(crate) describe: fn(ControllerKey) -> ControllerDescriptor,
}

impl ControllerRef {
    pub fn of<C: Controller>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: C::name(),
            describe: ControllerDescriptor::of::<C>,
        }
    }
}

impl fmt::Debug for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use crate::middleware::MiddlewareOutcome;
    use serde_json::{json, Value};

    struct EchoController {
        greeting: String,
    }

    impl Injectable for EchoController {
        fn inject(_: &Injector) -> ContainerResult<Self> {
            Ok(EchoController {
                greeting: "hello".to_string(),
            })
        }
    }

    impl EchoController {
        async fn greet(self: Arc<Self>, req: MayaRequest) -> Value {
            json!({ "greeting": self.greeting, "name": req.param("name") })
        }
    }

    impl Controller for EchoController {
        fn configure(routes: &mut Routes<Self>) {
            routes.get("/:name", Self::greet);
            routes
                .post("/", |_, _| async { "created" })
                .middleware(middleware_fn("noop", |_| MiddlewareOutcome::Next))
                .name("create");
            routes.delete("/", |_, _| async {}).middlewares([
                maya_validator::Check::field("id").is_string(),
                maya_validator::Check::field("force").is_boolean(),
            ]);
        }
    }

    #[test]
    fn test_routes_are_collected_in_order() {
        let descriptor = ControllerDescriptor::of::<EchoController>(ControllerKey::generate());

        let summary: Vec<_> = descriptor
            .routes
            .iter()
            .map(|r| (r.request_method, r.path.as_str(), r.method_name.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (RequestMethod::Get, "/:name", "greet"),
                (RequestMethod::Post, "/", "create"),
                (RequestMethod::Delete, "/", "anonymous"),
            ]
        );
        assert_eq!(descriptor.routes[1].middlewares.len(), 1);
        assert_eq!(descriptor.routes[2].middlewares.len(), 2);
        assert_eq!(descriptor.name, "EchoController");
    }

    #[tokio::test]
    async fn test_erased_handler_calls_controller() {
        let injector = Injector::new();
        let descriptor = ControllerDescriptor::of::<EchoController>(ControllerKey::generate());
        let instance = descriptor.instantiate(&injector).unwrap();

        let request = MayaRequest::new(Method::GET, "/maya").with_param("name", "maya");
        let reply = (descriptor.routes[0].handler)(instance, request).await.unwrap();

        match reply {
            Reply::Json(value) => assert_eq!(value, json!({ "greeting": "hello", "name": "maya" })),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_instance_type_is_an_error() {
        let descriptor = ControllerDescriptor::of::<EchoController>(ControllerKey::generate());
        let wrong: ControllerInstance = Arc::new(42u8);

        let result = (descriptor.routes[0].handler)(wrong, MayaRequest::new(Method::GET, "/")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_request_method_display() {
        assert_eq!(RequestMethod::Patch.to_string(), "PATCH");
        assert_eq!(RequestMethod::Options.method(), Method::OPTIONS);
    }
}
