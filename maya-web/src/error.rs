//! Web 层错误类型
//!
//! - `ResolveError`：模块解析阶段的错误，启动时致命
//! - `RequestError`：单个请求的错误，转换为 JSON 响应，不影响进程

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use maya_core::ApplicationError;
use maya_validator::ValidationError;
use serde::Serialize;
use thiserror::Error;

/// 模块解析错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{module} has no declared controllers.")]
    EmptyDeclarations { module: String },

    #[error("{module} has duplicated declaration for {controller}.")]
    DuplicateDeclaration { module: String, controller: String },

    #[error("{controller} is used as bootstrap but is not declared in {module}.")]
    UndeclaredDeclaration { controller: String, module: String },

    #[error("{module} is imported in a cycle: {}", .chain.join(" -> "))]
    CircularImport { module: String, chain: Vec<String> },
}

impl From<ResolveError> for ApplicationError {
    fn from(error: ResolveError) -> Self {
        ApplicationError::Resolution(Box::new(error))
    }
}

/// 请求处理错误
#[derive(Debug, Error)]
pub enum RequestError {
    /// 验证链失败 - 403
    #[error("{0}")]
    ValidationFailure(#[from] ValidationError),

    /// 处理函数返回错误或 panic - 500，细节只写日志
    #[error("Can't process request: {url}")]
    HandlerFault { url: String },

    /// 没有匹配的路由 - 500
    #[error("({method}) {url} is not defined!")]
    RouteNotFound { method: String, url: String },

    /// 请求体无法解析 - 400
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// 请求体超过上限 - 413
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::ValidationFailure(_) => StatusCode::FORBIDDEN,
            RequestError::HandlerFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RequestError::RouteNotFound { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RequestError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            RequestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn status_label(&self) -> &'static str {
        match self {
            RequestError::ValidationFailure(_) => "Validation Error",
            RequestError::HandlerFault { .. } => "Internal Server Error",
            RequestError::RouteNotFound { .. } => "Invalid Request",
            RequestError::MalformedBody(_) => "Bad Request",
            RequestError::PayloadTooLarge { .. } => "Payload Too Large",
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl From<&RequestError> for ErrorResponse {
    fn from(error: &RequestError) -> Self {
        Self {
            status: error.status_label().to_string(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = %status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_messages() {
        let error = ResolveError::EmptyDeclarations {
            module: "AppModule".into(),
        };
        assert_eq!(error.to_string(), "AppModule has no declared controllers.");

        let error = ResolveError::DuplicateDeclaration {
            module: "AppModule".into(),
            controller: "UserController".into(),
        };
        assert_eq!(
            error.to_string(),
            "AppModule has duplicated declaration for UserController."
        );

        let error = ResolveError::UndeclaredDeclaration {
            controller: "HomeController".into(),
            module: "AppModule".into(),
        };
        assert_eq!(
            error.to_string(),
            "HomeController is used as bootstrap but is not declared in AppModule."
        );

        let error = ResolveError::CircularImport {
            module: "AModule".into(),
            chain: vec!["AModule".into(), "BModule".into(), "AModule".into()],
        };
        assert_eq!(
            error.to_string(),
            "AModule is imported in a cycle: AModule -> BModule -> AModule"
        );
    }

    #[test]
    fn test_resolve_error_into_application_error() {
        let error: ApplicationError = ResolveError::EmptyDeclarations {
            module: "AppModule".into(),
        }
        .into();
        assert!(matches!(error, ApplicationError::Resolution(_)));
    }

    #[test]
    fn test_request_error_status_and_body() {
        let error = RequestError::RouteNotFound {
            method: "GET".into(),
            url: "/missing".into(),
        };
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorResponse::from(&error);
        assert_eq!(body.status, "Invalid Request");
        assert_eq!(body.message, "(GET) /missing is not defined!");

        let error = RequestError::from(ValidationError::field_error("email", "is not a valid email"));
        assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorResponse::from(&error).message, "email is not a valid email");
    }

    #[test]
    fn test_payload_too_large_is_a_client_error() {
        let error = RequestError::PayloadTooLarge { limit: 1024 };
        assert_eq!(error.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = ErrorResponse::from(&error);
        assert_eq!(body.status, "Payload Too Large");
        assert_eq!(body.message, "Request body exceeds 1024 bytes");
    }
}
