//! 中间件
//!
//! 两类中间件：
//! - 路由级：实现 `Middleware` trait，按声明顺序在控制器方法之前执行，可以直接返回响应
//! - 应用级：axum `from_fn` 中间件（请求日志、请求 ID），作用于整个路由表

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use maya_validator::Check;
use std::{sync::Arc, time::Instant};

use crate::constants::REQUEST_ID_HEADER;
use crate::error::RequestError;
use crate::request::MayaRequest;

/// 中间件执行结果
#[derive(Debug)]
pub enum MiddlewareOutcome {
    /// 继续执行下一个中间件或控制器方法
    Next,
    /// 直接返回响应，后续中间件和控制器方法都不会执行
    Respond(Response),
}

/// 路由级中间件
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: &mut MayaRequest) -> MiddlewareOutcome;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// 转换为共享的中间件对象
pub trait AsMiddleware {
    fn as_middleware(self) -> Arc<dyn Middleware>;
}

impl<M: Middleware + 'static> AsMiddleware for M {
    fn as_middleware(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

impl AsMiddleware for Arc<dyn Middleware> {
    fn as_middleware(self) -> Arc<dyn Middleware> {
        self
    }
}

/// 验证链直接作为中间件使用，失败时返回 403
#[async_trait]
impl Middleware for Check {
    async fn handle(&self, request: &mut MayaRequest) -> MiddlewareOutcome {
        match self.run(&*request) {
            Ok(()) => MiddlewareOutcome::Next,
            Err(error) => {
                tracing::debug!(field = %self.name(), url = %request.original_url, "Request rejected by validation");
                MiddlewareOutcome::Respond(RequestError::ValidationFailure(error).into_response())
            }
        }
    }
}

/// 同步闭包中间件
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

/// 用闭包创建中间件
///
/// ```
/// use axum::{http::StatusCode, response::IntoResponse};
/// use maya_web::middleware::{middleware_fn, MiddlewareOutcome};
///
/// let auth = middleware_fn("auth", |request| {
///     if request.header("authorization").is_some() {
///         MiddlewareOutcome::Next
///     } else {
///         MiddlewareOutcome::Respond(StatusCode::UNAUTHORIZED.into_response())
///     }
/// });
/// ```
pub fn middleware_fn<F>(name: &'static str, f: F) -> FnMiddleware<F>
where
    F: Fn(&mut MayaRequest) -> MiddlewareOutcome + Send + Sync + 'static,
{
    FnMiddleware { name, f }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut MayaRequest) -> MiddlewareOutcome + Send + Sync + 'static,
{
    async fn handle(&self, request: &mut MayaRequest) -> MiddlewareOutcome {
        (self.f)(request)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// 依次执行中间件，返回第一个短路的响应
pub async fn run_chain(
    middlewares: &[Arc<dyn Middleware>],
    request: &mut MayaRequest,
) -> Option<Response> {
    for middleware in middlewares {
        if let MiddlewareOutcome::Respond(response) = middleware.handle(request).await {
            tracing::debug!(
                middleware = middleware.name(),
                status = %response.status().as_u16(),
                "Middleware short-circuited request"
            );
            return Some(response);
        }
    }
    None
}

/// 请求日志中间件
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        elapsed = ?start.elapsed(),
        "Request completed"
    );

    response
}

/// 请求 ID 中间件
///
/// 沿用客户端传入的 `X-Request-ID`，没有时生成新的 UUID，并写回响应头。
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .cloned()
        .or_else(|| HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok());

    if let Some(value) = &request_id {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(req).await;

    if let Some(value) = request_id {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
