//! 应用启动
//!
//! ```no_run
//! use maya_web::prelude::*;
//!
//! # struct AppModule;
//! # impl Module for AppModule {
//! #     fn describe() -> ModuleDescriptor { unimplemented!() }
//! # }
//! #[tokio::main]
//! async fn main() -> ApplicationResult<()> {
//!     config_server(3333)
//!         .bootstrap_module::<AppModule>(DeclarationRegistry::new())?
//!         .start()
//!         .await
//! }
//! ```

use axum::{middleware, Router};
use maya_core::prelude::*;
use std::fmt;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::constants::{CONFIG_FILE, ENV_PREFIX};
use crate::database::{connect_databases, DatabaseModule, DatabaseRegistry};
use crate::middleware::{request_id, request_logging};
use crate::module::Module;
use crate::registry::DeclarationRegistry;
use crate::resolver::Resolver;
use crate::routing::{RouteInfo, RouteTableBuilder};
use crate::server::{shutdown_signal, MayaWebServer, ServerProperties};

/// 对最终 `Router` 的额外处理，按添加顺序执行
pub type Plugin = Box<dyn FnOnce(Router) -> Router + Send>;

/// 服务器配置
pub struct ServerConfig {
    properties: ServerProperties,
    logging: Option<LoggingConfig>,
    plugins: Vec<Plugin>,
}

/// 以默认配置和指定端口创建服务器配置
pub fn config_server(port: u16) -> ServerConfig {
    ServerConfig::new(ServerProperties {
        port,
        ..ServerProperties::default()
    })
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("properties", &self.properties)
            .field("logging", &self.logging)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl ServerConfig {
    pub fn new(properties: ServerProperties) -> Self {
        Self {
            properties,
            logging: None,
            plugins: Vec::new(),
        }
    }

    pub fn from_environment(env: &Environment) -> Self {
        Self::new(ServerProperties::from_environment(env))
    }

    /// 从 `application.toml` 和 `MAYA_` 前缀的环境变量加载
    pub fn load() -> ApplicationResult<Self> {
        let env = Environment::load(CONFIG_FILE, ENV_PREFIX)?;
        Ok(Self::from_environment(&env))
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.properties.host = host.into();
        self
    }

    pub fn cors(mut self, enable: bool) -> Self {
        self.properties.enable_cors = enable;
        self
    }

    /// 关闭后不输出请求日志和数据库连接日志
    pub fn logs(mut self, enable: bool) -> Self {
        self.properties.logs = enable;
        self
    }

    pub fn production(mut self, production: bool) -> Self {
        self.properties.production = production;
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.properties.body_limit = limit;
        self
    }

    pub fn plugin<F>(mut self, plugin: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// 指定日志配置，未指定时由 `production` 决定日志格式
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn properties(&self) -> &ServerProperties {
        &self.properties
    }

    /// 解析根模块并构建应用
    ///
    /// 解析、服务构造和路由注册的错误都在这里返回，服务器不会启动。
    pub fn bootstrap_module<M: Module>(self, registry: DeclarationRegistry) -> ApplicationResult<MayaApplication> {
        let ServerConfig {
            properties,
            logging,
            plugins,
        } = self;

        if let Err(e) = logging.unwrap_or_else(|| default_logging(properties.production)).init() {
            tracing::debug!("Logging not initialized: {}", e);
        }

        let injector = Arc::clone(registry.injector());
        let databases = injector.resolve::<DatabaseRegistry>()?;

        let mut resolver = Resolver::new(&registry);
        let bindings = resolver.resolve::<M>()?;

        let mut database_modules: Vec<Arc<dyn DatabaseModule>> = Vec::new();
        for module in resolver.modules() {
            for provider in &module.providers {
                provider.resolve(&injector)?;
                tracing::debug!(module = %module.name, provider = provider.name, "Provider created");
            }
            if !module.exports.is_empty() {
                tracing::debug!(module = %module.name, exports = ?module.exports, "Module exports");
            }
            database_modules.extend(module.databases.iter().cloned());
        }

        let table = RouteTableBuilder::new(&injector)
            .body_limit(properties.body_limit)
            .build(&bindings)?;

        let mut router = table.router;
        if properties.logs {
            router = router.layer(middleware::from_fn(request_logging));
        }
        router = router.layer(ServiceBuilder::new().layer(middleware::from_fn(request_id)));
        if properties.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }
        for plugin in plugins {
            router = plugin(router);
        }

        tracing::info!(
            module = M::name(),
            controllers = bindings.len(),
            routes = table.routes.len(),
            "Application bootstrapped"
        );

        Ok(MayaApplication {
            properties,
            router,
            routes: table.routes,
            registry,
            databases,
            database_modules,
        })
    }
}

fn default_logging(production: bool) -> LoggingConfig {
    let config = LoggingConfig::from_env();
    if std::env::var("LOG_FORMAT").is_ok() {
        return config;
    }
    if production {
        config.format(LogFormat::Compact)
    } else {
        config.format(LogFormat::Full)
    }
}

/// 构建完成、可以启动的应用
pub struct MayaApplication {
    properties: ServerProperties,
    router: Router,
    routes: Vec<RouteInfo>,
    registry: DeclarationRegistry,
    databases: Arc<DatabaseRegistry>,
    database_modules: Vec<Arc<dyn DatabaseModule>>,
}

impl fmt::Debug for MayaApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MayaApplication")
            .field("properties", &self.properties)
            .field("routes", &self.routes)
            .field("databases", &self.database_modules.len())
            .finish()
    }
}

impl MayaApplication {
    /// 已应用全部中间件和插件的路由
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn properties(&self) -> &ServerProperties {
        &self.properties
    }

    pub fn injector(&self) -> &Arc<Injector> {
        self.registry.injector()
    }

    pub fn databases(&self) -> &DatabaseRegistry {
        &self.databases
    }

    pub fn database_modules(&self) -> &[Arc<dyn DatabaseModule>] {
        &self.database_modules
    }

    /// 连接模块中的全部数据库
    pub async fn connect_databases(&self) -> ApplicationResult<()> {
        connect_databases(&self.database_modules, self.properties.logs, &self.databases).await
    }

    /// 开始监听，之后在后台连接数据库
    ///
    /// 数据库连接失败只记录日志，服务器继续运行。
    pub async fn start(self) -> ApplicationResult<()> {
        let server = MayaWebServer::new(self.properties.clone(), self.router);
        let listener = server.bind().await?;
        let port = listener.local_addr()?.port();
        tracing::info!("Server running on port {}", port);

        let modules = self.database_modules;
        let databases = self.databases;
        let logs = self.properties.logs;
        tokio::spawn(async move {
            if let Err(e) = connect_databases(&modules, logs, &databases).await {
                tracing::error!("{}", e);
            }
        });

        server.serve(listener, shutdown_signal()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, Routes};
    use crate::database::ModelDictionary;
    use crate::module::ModuleDescriptor;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    static GREETER_CREATED: AtomicUsize = AtomicUsize::new(0);

    struct Greeter;

    impl Injectable for Greeter {
        fn inject(_: &Injector) -> ContainerResult<Self> {
            GREETER_CREATED.fetch_add(1, Ordering::SeqCst);
            Ok(Greeter)
        }
    }

    struct HelloController {
        greeter: Arc<Greeter>,
    }

    impl Injectable for HelloController {
        fn inject(injector: &Injector) -> ContainerResult<Self> {
            Ok(HelloController {
                greeter: injector.resolve()?,
            })
        }
    }

    impl Controller for HelloController {
        fn configure(routes: &mut Routes<Self>) {
            routes.get("/", |this, _| async move {
                let _ = &this.greeter;
                "hello"
            });
        }
    }

    struct MemoryDatabase(&'static str);

    #[async_trait]
    impl DatabaseModule for MemoryDatabase {
        fn name(&self) -> &str {
            self.0
        }

        async fn connect(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn models(&self) -> anyhow::Result<ModelDictionary> {
            Ok(ModelDictionary::new())
        }
    }

    struct InnerModule;

    impl Module for InnerModule {
        fn describe() -> ModuleDescriptor {
            ModuleDescriptor::builder::<Self>()
                .path("inner")
                .declare::<HelloController>()
                .database(MemoryDatabase("inner"))
                .build()
        }
    }

    struct HelloModule;

    impl Module for HelloModule {
        fn describe() -> ModuleDescriptor {
            ModuleDescriptor::builder::<Self>()
                .declare::<HelloController>()
                .import::<InnerModule>()
                .provide::<Greeter>()
                .export::<Greeter>()
                .database(MemoryDatabase("main"))
                .build()
        }
    }

    fn bootstrap(config: ServerConfig) -> MayaApplication {
        config
            .logs(false)
            .bootstrap_module::<HelloModule>(DeclarationRegistry::new())
            .unwrap()
    }

    async fn send(router: Router, uri: &str, origin: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(origin) = origin {
            request = request.header(header::ORIGIN, origin);
        }
        router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[test]
    fn test_config_server() {
        let config = config_server(8080).host("127.0.0.1").cors(false).production(true);
        assert_eq!(config.properties().address(), "127.0.0.1:8080");
        assert!(!config.properties().enable_cors);
        assert!(config.properties().production);
    }

    #[tokio::test]
    async fn test_bootstrap_serves_resolved_routes() {
        let app = bootstrap(config_server(0));

        let paths: Vec<_> = app.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/inner"]);

        let response = send(app.router(), "/inner", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_body_limit_applies_to_routes() {
        let app = bootstrap(config_server(0).body_limit(16));
        let request = Request::builder()
            .uri("/inner")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"greeting":"hello from a long body"}"#))
            .unwrap();
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = send(app.router(), "/inner", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_providers_created_at_bootstrap() {
        let app = bootstrap(config_server(0));
        assert!(app.injector().contains::<Greeter>());
        assert!(GREETER_CREATED.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_cors_toggle() {
        let app = bootstrap(config_server(0));
        let response = send(app.router(), "/", Some("http://example.com")).await;
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let app = bootstrap(config_server(0).cors(false));
        let response = send(app.router(), "/", Some("http://example.com")).await;
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_plugins_are_applied() {
        let app = bootstrap(config_server(0).plugin(|router| router.route("/health", get(|| async { "ok" }))));
        let response = send(app.router(), "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_databases_collected_from_all_modules() {
        let app = bootstrap(config_server(0));
        let mut names: Vec<_> = app.database_modules().iter().map(|d| d.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["inner", "main"]);

        app.connect_databases().await.unwrap();
        assert_eq!(app.databases().names(), vec!["inner", "main"]);
    }

    struct Broken;

    impl Injectable for Broken {
        fn inject(_: &Injector) -> ContainerResult<Self> {
            Err(ContainerError::creation("Broken", "missing credentials"))
        }
    }

    struct BrokenModule;

    impl Module for BrokenModule {
        fn describe() -> ModuleDescriptor {
            ModuleDescriptor::builder::<Self>()
                .declare::<HelloController>()
                .provide::<Broken>()
                .build()
        }
    }

    struct EmptyModule;

    impl Module for EmptyModule {
        fn describe() -> ModuleDescriptor {
            ModuleDescriptor::builder::<Self>().build()
        }
    }

    #[test]
    fn test_bootstrap_errors() {
        let error = config_server(0)
            .bootstrap_module::<BrokenModule>(DeclarationRegistry::new())
            .unwrap_err();
        assert!(matches!(error, ApplicationError::Container(_)));

        let error = config_server(0)
            .bootstrap_module::<EmptyModule>(DeclarationRegistry::new())
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Module resolution failed: EmptyModule has no declared controllers."
        );
    }
}
