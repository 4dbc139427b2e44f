//! 请求模型
//!
//! 路由处理函数和中间件看到的是 `MayaRequest`，而不是 axum 的原始请求：
//! 请求体已经解析为 JSON（JSON 或表单），路径参数和查询参数已经展开。

use axum::http::{header, request::Parts, HeaderMap, Method};
use maya_validator::{FieldSource, RequestSource};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::RequestError;

/// 传给中间件和控制器方法的请求
#[derive(Debug, Clone)]
pub struct MayaRequest {
    /// `http` 或 `https`（取自 `X-Forwarded-Proto` 或 URI scheme）
    pub protocol: String,
    pub method: Method,
    /// 请求路径加查询字符串
    pub original_url: String,
    pub headers: HeaderMap,
    /// 解析后的请求体，没有请求体时为空对象
    pub body: Value,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl MayaRequest {
    pub fn new(method: Method, original_url: impl Into<String>) -> Self {
        let original_url = original_url.into();
        let query = original_url
            .split_once('?')
            .map(|(_, query)| parse_query(query))
            .unwrap_or_default();

        Self {
            protocol: "http".to_string(),
            method,
            original_url,
            headers: HeaderMap::new(),
            body: Value::Object(Map::new()),
            params: HashMap::new(),
            query,
        }
    }

    /// 从 axum 请求的各部分构造
    pub fn from_parts(
        parts: &Parts,
        params: HashMap<String, String>,
        body: &[u8],
    ) -> Result<Self, RequestError> {
        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let protocol = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http")
            .to_string();

        Ok(Self {
            protocol,
            method: parts.method.clone(),
            original_url,
            headers: parts.headers.clone(),
            body: parse_body(&parts.headers, body)?,
            params,
            query: parts.uri.query().map(parse_query).unwrap_or_default(),
        })
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// 请求路径（不含查询字符串）
    pub fn path(&self) -> &str {
        self.original_url
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.original_url)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// 把请求体反序列化为具体类型
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.body.clone())
    }
}

impl FieldSource for MayaRequest {
    fn extract(&self, source: RequestSource, field: &str) -> Option<Value> {
        match source {
            RequestSource::Body => self.body.get(field).cloned(),
            RequestSource::Params => self.params.get(field).cloned().map(Value::String),
        }
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

/// 按 `Content-Type` 解析请求体
///
/// 只解析 JSON 和 urlencoded 表单，其它类型以及空请求体都得到空对象。
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, RequestError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") || content_type.contains("+json") {
        return serde_json::from_slice(body).map_err(|e| RequestError::MalformedBody(e.to_string()));
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| RequestError::MalformedBody(e.to_string()))?;
        let form = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<Map<String, Value>>();
        return Ok(Value::Object(form));
    }

    Ok(Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use serde_json::json;

    fn parts(uri: &str, content_type: Option<&str>) -> Parts {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_json_body_and_query() {
        let parts = parts("/users?page=2&sort=name", Some("application/json"));
        let request =
            MayaRequest::from_parts(&parts, HashMap::new(), br#"{"name":"Maya"}"#).unwrap();

        assert_eq!(request.body, json!({ "name": "Maya" }));
        assert_eq!(request.query_value("page"), Some("2"));
        assert_eq!(request.original_url, "/users?page=2&sort=name");
        assert_eq!(request.path(), "/users");
        assert_eq!(request.protocol, "http");
    }

    #[test]
    fn test_form_body() {
        let parts = parts("/login", Some("application/x-www-form-urlencoded"));
        let request =
            MayaRequest::from_parts(&parts, HashMap::new(), b"email=a%40b.com&remember=on").unwrap();

        assert_eq!(request.body, json!({ "email": "a@b.com", "remember": "on" }));
    }

    #[test]
    fn test_missing_or_unknown_body_is_empty_object() {
        let request = MayaRequest::from_parts(&parts("/", None), HashMap::new(), b"").unwrap();
        assert_eq!(request.body, json!({}));

        let request =
            MayaRequest::from_parts(&parts("/", Some("text/plain")), HashMap::new(), b"hello").unwrap();
        assert_eq!(request.body, json!({}));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let error = MayaRequest::from_parts(&parts("/", Some("application/json")), HashMap::new(), b"{oops")
            .unwrap_err();
        assert!(matches!(error, RequestError::MalformedBody(_)));
    }

    #[test]
    fn test_field_source() {
        let request = MayaRequest::new(Method::GET, "/users/7")
            .with_body(json!({ "active": true }))
            .with_param("id", "7")
            .with_header(header::ACCEPT, HeaderValue::from_static("application/json"));

        assert_eq!(request.extract(RequestSource::Body, "active"), Some(json!(true)));
        assert_eq!(request.extract(RequestSource::Params, "id"), Some(json!("7")));
        assert_eq!(request.extract(RequestSource::Params, "missing"), None);
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_json_deserialization() {
        #[derive(serde::Deserialize)]
        struct Login {
            email: String,
        }

        let request = MayaRequest::new(Method::POST, "/login").with_body(json!({ "email": "a@b.com" }));
        let login: Login = request.json().unwrap();
        assert_eq!(login.email, "a@b.com");
    }
}
