use thiserror::Error;

/// 单个字段的验证失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// 验证错误
///
/// 失败信息按规则添加的顺序保存，`Display` 输出用 `", "` 连接。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", join_messages(.0))]
    FieldErrors(Vec<FieldError>),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldErrors(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let Self::FieldErrors(errors) = self;
        errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationError) {
        let (Self::FieldErrors(errors), Self::FieldErrors(more)) = (self, other);
        errors.extend(more);
    }

    pub fn errors(&self) -> &[FieldError] {
        let Self::FieldErrors(errors) = self;
        errors
    }

    /// 连接后的失败信息，作为响应体中的 `message`
    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
