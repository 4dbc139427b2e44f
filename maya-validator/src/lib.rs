//! Maya 请求验证
//!
//! 提供 `Check` 验证链：对单个字段追加规则，再针对请求执行。
//! 在 `maya-web` 中 `Check` 同时是一个中间件，验证失败返回 403。

pub mod check;
pub mod error;
pub mod rules;

pub use check::{Check, FieldSource, RequestData, RequestSource, Rule};
pub use error::{FieldError, ValidationError, ValidationResult};

pub mod prelude {
    pub use crate::check::{Check, FieldSource, RequestData, RequestSource};
    pub use crate::error::{ValidationError, ValidationResult};
}
