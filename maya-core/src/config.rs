//! 分层配置
//!
//! `Environment` 按优先级聚合多个 `PropertySource`，键统一使用点分形式
//! （`server.port`、`server.enable-cors`）。

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ApplicationError, ApplicationResult};

/// 配置值
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<ConfigValue>),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 字符串形式的数字也会被解析
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            ConfigValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            ConfigValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// 配置源
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// 优先级，数字越大越先被查询
    fn priority(&self) -> i32 {
        0
    }
}

/// 配置管理器
#[derive(Default)]
pub struct Environment {
    sources: RwLock<Vec<Box<dyn PropertySource>>>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources = self.sources.read();
        f.debug_struct("Environment")
            .field(
                "sources",
                &sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认环境：可选的 TOML 文件 + 指定前缀的环境变量
    ///
    /// 文件不存在时跳过，解析失败时返回错误。
    pub fn load(config_file: impl AsRef<Path>, env_prefix: &str) -> ApplicationResult<Self> {
        let environment = Self::new();
        let config_file = config_file.as_ref();

        if config_file.exists() {
            let source = TomlPropertySource::from_file(config_file)?;
            tracing::info!("Loaded configuration from: {}", config_file.display());
            environment.add_property_source(Box::new(source));
        } else {
            tracing::debug!("Configuration file not found: {}", config_file.display());
        }

        environment.add_property_source(Box::new(EnvironmentPropertySource::new(env_prefix)));
        Ok(environment)
    }

    pub fn add_property_source(&self, source: Box<dyn PropertySource>) {
        let mut sources = self.sources.write();
        sources.push(source);
        sources.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn with_property_source(self, source: Box<dyn PropertySource>) -> Self {
        self.add_property_source(source);
        self
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        let sources = self.sources.read();
        let found = sources
            .iter()
            .find_map(|source| source.get(key).map(|value| (source.name().to_string(), value)));

        match found {
            Some((source, value)) => {
                tracing::trace!(key, source = %source, "Config value resolved");
                Some(value)
            }
            None => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(String::from))
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// 支持 TOML 数组和逗号分隔字符串两种写法
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            ConfigValue::Array(values) => Some(
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            ),
            ConfigValue::String(s) => Some(
                s.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// 环境变量配置源
///
/// `MAYA_SERVER_PORT` 对应键 `server.port`，`-` 在变量名中写作 `_`：
/// `MAYA_SERVER_ENABLE_CORS` 对应 `server.enable-cors`。
pub struct EnvironmentPropertySource {
    prefix: String,
    priority: i32,
}

impl EnvironmentPropertySource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            priority: 100,
        }
    }

    fn key_to_env(&self, key: &str) -> String {
        format!(
            "{}{}",
            self.prefix,
            key.replace(['.', '-'], "_").to_uppercase()
        )
    }
}

impl PropertySource for EnvironmentPropertySource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        std::env::var(self.key_to_env(key))
            .ok()
            .map(ConfigValue::String)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// TOML 文件配置源，嵌套表会被展平为点分键
pub struct TomlPropertySource {
    name: String,
    properties: HashMap<String, ConfigValue>,
    priority: i32,
}

impl TomlPropertySource {
    pub fn from_file(path: impl AsRef<Path>) -> ApplicationResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ApplicationError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path.display().to_string())
    }

    pub fn parse(content: &str, name: impl Into<String>) -> ApplicationResult<Self> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| ApplicationError::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut properties = HashMap::new();
        for (key, value) in &table {
            Self::flatten(value, key.clone(), &mut properties);
        }

        Ok(Self {
            name: name.into(),
            properties,
            priority: 0,
        })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn flatten(value: &toml::Value, prefix: String, out: &mut HashMap<String, ConfigValue>) {
        match value {
            toml::Value::Table(table) => {
                for (key, nested) in table {
                    Self::flatten(nested, format!("{}.{}", prefix, key), out);
                }
            }
            other => {
                out.insert(prefix, Self::convert(other));
            }
        }
    }

    fn convert(value: &toml::Value) -> ConfigValue {
        match value {
            toml::Value::String(s) => ConfigValue::String(s.clone()),
            toml::Value::Integer(i) => ConfigValue::Int(*i),
            toml::Value::Float(f) => ConfigValue::Float(*f),
            toml::Value::Boolean(b) => ConfigValue::Bool(*b),
            toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
            toml::Value::Array(values) => {
                ConfigValue::Array(values.iter().map(Self::convert).collect())
            }
            // 数组中的表没有点分键可用，按字符串保留
            toml::Value::Table(_) => ConfigValue::String(value.to_string()),
        }
    }
}

impl PropertySource for TomlPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.properties.get(key).cloned()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 内存配置源，测试和运行时覆盖用
pub struct MapPropertySource {
    name: String,
    properties: HashMap<String, ConfigValue>,
    priority: i32,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            priority: 50,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.properties.get(key).cloned()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 4000
        enable-cors = false

        [database]
        names = ["main", "audit"]
    "#;

    #[test]
    fn test_toml_is_flattened() {
        let source = TomlPropertySource::parse(SAMPLE, "sample").unwrap();

        assert_eq!(source.get("server.host"), Some(ConfigValue::String("127.0.0.1".into())));
        assert_eq!(source.get("server.port"), Some(ConfigValue::Int(4000)));
        assert_eq!(source.get("server.enable-cors"), Some(ConfigValue::Bool(false)));
        assert!(source.get("server").is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlPropertySource::parse("server = [", "broken");
        assert!(matches!(result, Err(ApplicationError::Config(_))));
    }

    #[test]
    fn test_higher_priority_source_wins() {
        let environment = Environment::new()
            .with_property_source(Box::new(TomlPropertySource::parse(SAMPLE, "file").unwrap()))
            .with_property_source(Box::new(
                MapPropertySource::new("overrides").with_property("server.port", ConfigValue::Int(5000)),
            ));

        assert_eq!(environment.get_i64("server.port"), Some(5000));
        assert_eq!(environment.get_string("server.host").as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_string_values_are_coerced() {
        let environment = Environment::new().with_property_source(Box::new(
            MapPropertySource::new("strings")
                .with_property("server.port", ConfigValue::String(" 8080 ".into()))
                .with_property("server.logs", ConfigValue::String("off".into())),
        ));

        assert_eq!(environment.get_i64("server.port"), Some(8080));
        assert_eq!(environment.get_bool("server.logs"), Some(false));
    }

    #[test]
    fn test_string_array() {
        let environment = Environment::new()
            .with_property_source(Box::new(TomlPropertySource::parse(SAMPLE, "file").unwrap()))
            .with_property_source(Box::new(
                MapPropertySource::new("csv").with_property("cors.origins", ConfigValue::String("a, b,,c".into())),
            ));

        assert_eq!(
            environment.get_string_array("database.names"),
            Some(vec!["main".to_string(), "audit".to_string()])
        );
        assert_eq!(
            environment.get_string_array("cors.origins"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_environment_variable_source() {
        std::env::set_var("MAYATEST_SERVER_ENABLE_CORS", "true");
        let source = EnvironmentPropertySource::new("MAYATEST_");

        assert_eq!(source.get("server.enable-cors"), Some(ConfigValue::String("true".into())));
        assert!(source.get("server.missing-key").is_none());
        std::env::remove_var("MAYATEST_SERVER_ENABLE_CORS");
    }
}
