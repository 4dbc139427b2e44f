//! 控制器方法的返回值
//!
//! 控制器方法可以返回任何实现了 `IntoReply` 的类型，框架统一转换为 `Reply`：
//! `()`/`None` 不写响应体，字符串按文本写出，其它值序列化为 JSON。

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// 规范化后的控制器返回值
#[derive(Debug)]
pub enum Reply {
    /// 不写响应体
    Empty,
    Text(String),
    Json(Value),
    /// 已经构造好的响应，原样返回
    Response(Response),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Empty => StatusCode::OK.into_response(),
            Reply::Text(text) => text.into_response(),
            Reply::Json(value) => Json(value).into_response(),
            Reply::Response(response) => response,
        }
    }
}

/// 可以作为控制器方法返回值的类型
///
/// 序列化失败或 `Err` 都会变成处理函数错误，由路由层转换为 500 响应。
pub trait IntoReply {
    fn into_reply(self) -> anyhow::Result<Reply>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Json(self))
    }
}

impl IntoReply for String {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Text(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Text(self.to_string()))
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Json(serde_json::to_value(self.0)?))
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for StatusCode {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Response(self.into_response()))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> anyhow::Result<Reply> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    fn into_reply(self) -> anyhow::Result<Reply> {
        self.map_err(Into::into)?.into_reply()
    }
}

/// HTTP 响应实体
///
/// 需要控制状态码和响应头时使用，响应体序列化为 JSON。
#[derive(Debug)]
pub struct ResponseEntity<T> {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<T>,
}

impl<T> ResponseEntity<T> {
    pub fn new(status: StatusCode, body: T) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    pub fn ok(body: T) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn created(body: T) -> Self {
        Self::new(StatusCode::CREATED, body)
    }

    pub fn not_found(body: T) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl ResponseEntity<()> {
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl<T: Serialize> IntoReply for ResponseEntity<T> {
    fn into_reply(self) -> anyhow::Result<Reply> {
        let mut response = match self.body {
            Some(body) => (self.status, Json(serde_json::to_value(body)?)).into_response(),
            None => self.status.into_response(),
        };
        response.headers_mut().extend(self.headers);
        Ok(Reply::Response(response))
    }
}
