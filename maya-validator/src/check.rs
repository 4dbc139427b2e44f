//! 验证链
//!
//! `Check::field("name")` 创建一条验证链，之后通过链式调用追加规则：
//!
//! ```
//! use maya_validator::{Check, RequestData};
//! use serde_json::json;
//!
//! let check = Check::field("email").is_email().max_length(40);
//!
//! let request = RequestData::from_body(json!({ "email": "jane@example.com" }));
//! assert!(check.run(&request).is_ok());
//!
//! let request = RequestData::from_body(json!({ "email": "not-an-email" }));
//! assert_eq!(
//!     check.run(&request).unwrap_err().message(),
//!     "email is not a valid email"
//! );
//! ```

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{ValidationError, ValidationResult};
use crate::rules;

/// 字段的取值来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestSource {
    #[default]
    Body,
    Params,
}

impl fmt::Display for RequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestSource::Body => f.write_str("body"),
            RequestSource::Params => f.write_str("params"),
        }
    }
}

/// 可以按来源和字段名取值的请求
pub trait FieldSource {
    fn extract(&self, source: RequestSource, field: &str) -> Option<Value>;
}

/// 不依赖 HTTP 层的请求数据，`body` 和 `params` 都是 JSON 对象
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    pub body: Value,
    pub params: Value,
}

impl RequestData {
    pub fn new(body: Value, params: Value) -> Self {
        Self { body, params }
    }

    pub fn from_body(body: Value) -> Self {
        Self::new(body, Value::Object(Map::new()))
    }

    pub fn from_params(params: Value) -> Self {
        Self::new(Value::Object(Map::new()), params)
    }
}

impl FieldSource for RequestData {
    fn extract(&self, source: RequestSource, field: &str) -> Option<Value> {
        let container = match source {
            RequestSource::Body => &self.body,
            RequestSource::Params => &self.params,
        };
        container.get(field).cloned()
    }
}

type Predicate = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// 一条验证规则
#[derive(Clone)]
pub struct Rule {
    predicate: Predicate,
    message: String,
    source: RequestSource,
}

impl Rule {
    pub fn new<F>(source: RequestSource, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            message: message.into(),
            source,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> RequestSource {
        self.source
    }

    pub fn test(&self, value: Option<&Value>) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}

/// 单个字段的验证链
///
/// 规则在添加时绑定当前的取值来源，`body()`/`params()` 只影响之后添加的规则。
#[derive(Debug, Clone)]
pub struct Check {
    field: String,
    source: RequestSource,
    rules: Vec<Rule>,
}

impl Check {
    /// 对字段开始一条新的验证链，默认从请求体取值
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            source: RequestSource::Body,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn body(mut self) -> Self {
        self.source = RequestSource::Body;
        self
    }

    pub fn params(mut self) -> Self {
        self.source = RequestSource::Params;
        self
    }

    /// 追加自定义规则
    pub fn rule<F>(mut self, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule::new(self.source, message, predicate));
        self
    }

    pub fn is_boolean(self) -> Self {
        self.rule(rules::NOT_BOOLEAN, rules::is_boolean)
    }

    pub fn is_string(self) -> Self {
        self.rule(rules::NOT_STRING, |value| {
            rules::is_string_matching(value, &rules::STRING_PATTERN)
        })
    }

    pub fn is_string_matching(self, pattern: Regex) -> Self {
        self.rule(rules::NOT_STRING, move |value| {
            rules::is_string_matching(value, &pattern)
        })
    }

    pub fn is_address(self) -> Self {
        self.rule(rules::NOT_ADDRESS, |value| {
            rules::is_string_matching(value, &rules::ADDRESS_PATTERN)
        })
    }

    pub fn is_address_matching(self, pattern: Regex) -> Self {
        self.rule(rules::NOT_ADDRESS, move |value| {
            rules::is_string_matching(value, &pattern)
        })
    }

    /// 长度至少为 `min`，没有长度的值视为失败
    pub fn min_length(self, min: usize) -> Self {
        self.rule(format!("must have a length of {}", min), move |value| {
            rules::length_of(value).is_some_and(|len| len >= min)
        })
    }

    pub fn max_length(self, max: usize) -> Self {
        self.rule(format!("must be {} in length or fewer", max), move |value| {
            rules::length_of(value).is_some_and(|len| len <= max)
        })
    }

    pub fn is_date(self) -> Self {
        self.rule(rules::NOT_DATE, rules::is_date)
    }

    pub fn is_email(self) -> Self {
        self.rule(rules::NOT_EMAIL, rules::is_email)
    }

    /// 用自定义正则替换内置邮箱规则，失败信息不变
    pub fn is_email_matching(self, pattern: Regex) -> Self {
        self.rule(rules::NOT_EMAIL, move |value| {
            rules::is_string_matching(value, &pattern)
        })
    }

    pub fn is_password(self) -> Self {
        self.rule(rules::NOT_PASSWORD, rules::is_password)
    }

    /// 按添加顺序执行所有规则，收集全部失败信息
    pub fn run<S: FieldSource + ?Sized>(&self, request: &S) -> ValidationResult<()> {
        let mut failures: Option<ValidationError> = None;

        for rule in &self.rules {
            let value = request.extract(rule.source, &self.field);
            if rule.test(value.as_ref()) {
                continue;
            }
            tracing::debug!(field = %self.field, source = %rule.source, "Validation rule failed");
            match failures.as_mut() {
                Some(error) => error.add_field_error(&self.field, &rule.message),
                None => failures = Some(ValidationError::field_error(&self.field, &rule.message)),
            }
        }

        match failures {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_failures_joined_in_rule_order() {
        let check = Check::field("name").is_string().min_length(3).max_length(5);
        let request = RequestData::from_body(json!({ "name": "a;" }));

        let error = check.run(&request).unwrap_err();
        assert_eq!(
            error.message(),
            "name is not a string or not a valid string format, name must have a length of 3"
        );
    }

    #[test]
    fn test_passing_chain() {
        let check = Check::field("name").is_string().min_length(3).max_length(10);
        let request = RequestData::from_body(json!({ "name": "Maya" }));
        assert!(check.run(&request).is_ok());
    }

    #[test]
    fn test_source_switch_only_affects_later_rules() {
        let check = Check::field("id").is_string().params().is_boolean();
        let request = RequestData::new(json!({ "id": "abc" }), json!({ "id": true }));

        assert!(check.run(&request).is_ok());
        assert_eq!(check.rules()[0].source(), RequestSource::Body);
        assert_eq!(check.rules()[1].source(), RequestSource::Params);
    }

    #[test]
    fn test_missing_field_fails_length_rules() {
        let check = Check::field("tags").min_length(1).max_length(3);
        let error = check.run(&RequestData::default()).unwrap_err();

        assert_eq!(error.errors().len(), 2);
        assert_eq!(error.errors()[1].message, "must be 3 in length or fewer");
    }

    #[test]
    fn test_length_rules_on_arrays() {
        let check = Check::field("tags").min_length(1).max_length(2);
        assert!(check.run(&RequestData::from_body(json!({ "tags": ["a"] }))).is_ok());
        assert!(check
            .run(&RequestData::from_body(json!({ "tags": ["a", "b", "c"] })))
            .is_err());
    }

    #[test]
    fn test_custom_patterns() {
        let check = Check::field("code").is_string_matching(Regex::new(r"^[A-Z]{3}$").unwrap());
        assert!(check.run(&RequestData::from_body(json!({ "code": "ABC" }))).is_ok());
        assert!(check.run(&RequestData::from_body(json!({ "code": "abc" }))).is_err());

        let check = Check::field("street").is_address_matching(Regex::new(r"^\d+ .+$").unwrap());
        assert!(check.run(&RequestData::from_body(json!({ "street": "12 Main" }))).is_ok());

        let check = Check::field("email").is_email_matching(Regex::new(r"^[a-z]+@corp\.example$").unwrap());
        assert!(check.run(&RequestData::from_body(json!({ "email": "maya@corp.example" }))).is_ok());
        assert_eq!(
            check
                .run(&RequestData::from_body(json!({ "email": "maya@example.com" })))
                .unwrap_err()
                .message(),
            "email is not a valid email"
        );
    }

    #[test]
    fn test_custom_rule() {
        let check = Check::field("age").rule("must be adult", |value| {
            value.and_then(Value::as_u64).is_some_and(|age| age >= 18)
        });

        assert!(check.run(&RequestData::from_body(json!({ "age": 30 }))).is_ok());
        assert_eq!(
            check
                .run(&RequestData::from_body(json!({ "age": 12 })))
                .unwrap_err()
                .message(),
            "age must be adult"
        );
    }

    #[test]
    fn test_chain_is_reusable() {
        let check = Check::field("email").is_email();
        let cloned = check.clone().is_password();

        assert_eq!(check.rules().len(), 1);
        assert_eq!(cloned.rules().len(), 2);
    }
}
