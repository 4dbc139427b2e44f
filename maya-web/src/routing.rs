//! 路由表构建
//!
//! 把解析得到的绑定转换为 axum `Router`：
//! - 绝对路径 = 绑定路径 + 路由路径，规范化后注册
//! - 同一路径和方法重复声明时保留第一个，其余跳过并记录警告
//! - 控制器方法返回错误或 panic 时返回固定的 500 响应，细节只写日志
//! - 未匹配的请求（包括路径存在但方法不匹配）返回 500 "is not defined"

use axum::{
    extract::{OriginalUri, Path, Request},
    http::Method,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use futures_util::FutureExt;
use http_body_util::LengthLimitError;
use maya_core::{utils::path::join_paths, ApplicationError, ApplicationResult, Injector};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::constants::DEFAULT_BODY_LIMIT;
use crate::controller::{ControllerInstance, ControllerKey, RequestMethod, RouteDescriptor};
use crate::error::RequestError;
use crate::middleware::run_chain;
use crate::request::MayaRequest;
use crate::resolver::RouteBinding;

/// 已注册路由的摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: RequestMethod,
    pub path: String,
    pub controller: String,
    pub handler: String,
}

impl fmt::Display for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<7} {} -> {}::{}",
            self.method, self.path, self.controller, self.handler
        )
    }
}

/// 构建好的路由表
pub struct RouteTable {
    pub router: Router,
    pub routes: Vec<RouteInfo>,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable").field("routes", &self.routes).finish()
    }
}

/// 单条路由在运行时需要的全部信息
struct MountedRoute {
    instance: ControllerInstance,
    route: RouteDescriptor,
    controller: String,
    body_limit: usize,
}

pub struct RouteTableBuilder<'a> {
    injector: &'a Injector,
    body_limit: usize,
}

impl<'a> RouteTableBuilder<'a> {
    pub fn new(injector: &'a Injector) -> Self {
        Self {
            injector,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn build(&self, bindings: &[RouteBinding]) -> ApplicationResult<RouteTable> {
        let mut instances: HashMap<ControllerKey, ControllerInstance> = HashMap::new();
        let mut paths: Vec<(String, Vec<Arc<MountedRoute>>)> = Vec::new();
        let mut path_index: HashMap<String, usize> = HashMap::new();
        let mut registered: HashSet<(String, RequestMethod)> = HashSet::new();
        let mut shapes = ParamShapes::default();
        let mut routes = Vec::new();

        for binding in bindings {
            let controller = &binding.controller;
            let instance = match instances.get(&controller.key) {
                Some(instance) => Arc::clone(instance),
                None => {
                    let instance = controller.instantiate(self.injector)?;
                    instances.insert(controller.key, Arc::clone(&instance));
                    instance
                }
            };

            for route in &controller.routes {
                let path = join_paths(&binding.path, &route.path);

                if !registered.insert((path.clone(), route.request_method)) {
                    tracing::warn!(
                        method = %route.request_method,
                        path = %path,
                        controller = %controller.name,
                        handler = %route.method_name,
                        "Route already defined, skipping"
                    );
                    continue;
                }
                shapes.check(&path)?;

                let mounted = Arc::new(MountedRoute {
                    instance: Arc::clone(&instance),
                    route: route.clone(),
                    controller: controller.name.clone(),
                    body_limit: self.body_limit,
                });

                let index = *path_index.entry(path.clone()).or_insert_with(|| {
                    paths.push((path.clone(), Vec::new()));
                    paths.len() - 1
                });
                paths[index].1.push(mounted);

                routes.push(RouteInfo {
                    method: route.request_method,
                    path,
                    controller: controller.name.clone(),
                    handler: route.method_name.clone(),
                });
            }
        }

        let mut router = Router::new();
        for (path, mounted) in paths {
            let mut method_router: MethodRouter = MethodRouter::new();
            for route in mounted {
                let filter = route.route.request_method.filter();
                method_router = method_router.on(filter, move |params: Option<Path<HashMap<String, String>>>, request: Request| {
                    let route = Arc::clone(&route);
                    async move {
                        let params = params.map(|Path(params)| params).unwrap_or_default();
                        dispatch(route, params, request).await
                    }
                });
            }
            router = router.route(&path, method_router.fallback(not_defined));
        }

        for route in &routes {
            tracing::debug!("Mapped {}", route);
        }

        Ok(RouteTable {
            router: router.fallback(not_defined),
            routes,
        })
    }
}

/// 相同前缀上的路径参数必须同名，否则 axum 无法区分两条路由
#[derive(Default)]
struct ParamShapes {
    names: HashMap<String, (String, String)>,
}

impl ParamShapes {
    fn check(&mut self, path: &str) -> ApplicationResult<()> {
        let invalid =
            |reason: &str| ApplicationError::Routing(format!("'{}' is not a valid route: {}", path, reason));

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut prefix = String::new();
        for (position, &segment) in segments.iter().enumerate() {
            let kind = segment.chars().next().filter(|c| *c == ':' || *c == '*');
            if segment.chars().skip(1).any(|c| c == ':' || c == '*') {
                return Err(invalid("parameters must take a whole segment"));
            }
            prefix.push('/');
            match kind {
                Some(_) if segment.len() < 2 => return Err(invalid("parameters must be named")),
                Some('*') if position + 1 != segments.len() => {
                    return Err(invalid("a wildcard must be the last segment"))
                }
                Some(marker) => {
                    if let Some((name, first)) = self.names.get(&prefix) {
                        if name != segment {
                            return Err(ApplicationError::Routing(format!(
                                "'{}' conflicts with '{}': parameters '{}' and '{}' at the same position",
                                path, first, name, segment
                            )));
                        }
                    } else {
                        self.names
                            .insert(prefix.clone(), (segment.to_string(), path.to_string()));
                    }
                    prefix.push(marker);
                }
                None => prefix.push_str(segment),
            }
        }
        Ok(())
    }
}

fn body_error(error: axum::Error, limit: usize) -> RequestError {
    let error = error.into_inner();
    if error.downcast_ref::<LengthLimitError>().is_some() {
        RequestError::PayloadTooLarge { limit }
    } else {
        RequestError::MalformedBody(error.to_string())
    }
}

async fn dispatch(route: Arc<MountedRoute>, params: HashMap<String, String>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, route.body_limit).await {
        Ok(bytes) => bytes,
        Err(error) => return body_error(error, route.body_limit).into_response(),
    };

    let mut request = match MayaRequest::from_parts(&parts, params, &bytes) {
        Ok(request) => request,
        Err(error) => return error.into_response(),
    };
    let url = request.original_url.clone();

    let outcome = AssertUnwindSafe(async {
        if let Some(response) = run_chain(&route.route.middlewares, &mut request).await {
            return Ok(response);
        }
        (route.route.handler)(Arc::clone(&route.instance), request)
            .await
            .map(IntoResponse::into_response)
    })
    .catch_unwind()
    .await;

    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(error)) => {
            tracing::error!(
                url = %url,
                controller = %route.controller,
                handler = %route.route.method_name,
                error = %format!("{error:#}"),
                "Handler returned an error"
            );
            RequestError::HandlerFault { url }.into_response()
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "Unknown panic occurred".to_string());
            tracing::error!(
                url = %url,
                controller = %route.controller,
                handler = %route.route.method_name,
                error = %message,
                "Handler panicked"
            );
            RequestError::HandlerFault { url }.into_response()
        }
    }
}

/// 未匹配请求的兜底处理
pub async fn not_defined(method: Method, OriginalUri(uri): OriginalUri) -> Response {
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    RequestError::RouteNotFound {
        method: method.to_string(),
        url,
    }
    .into_response()
}
