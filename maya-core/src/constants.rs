//! 保留的元数据键
//!
//! 元数据存储本身不校验键名，框架自身只使用这里列出的键，
//! 应用代码自定义元数据时应避开 `__mod:` / `__control:` 前缀。

/// 模块描述符
pub const MODULE_DESCRIPTOR: &str = "__mod:descriptor__";

/// 模块名称
pub const MODULE_NAME: &str = "__mod:name__";

/// 控制器的进程内唯一键（首次注册时生成，之后保持不变）
pub const CONTROLLER_KEY: &str = "__control:key__";

/// 控制器名称
pub const CONTROLLER_NAME: &str = "__control:name__";

/// 控制器描述符（包含有序的路由列表）
pub const CONTROLLER_DESCRIPTOR: &str = "__control:descriptor__";

/// 框架保留的全部元数据键
pub const RESERVED_METADATA_KEYS: &[&str] = &[
    MODULE_DESCRIPTOR,
    MODULE_NAME,
    CONTROLLER_KEY,
    CONTROLLER_NAME,
    CONTROLLER_DESCRIPTOR,
];

/// 检查键是否被框架保留
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_METADATA_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys() {
        assert!(is_reserved_key(CONTROLLER_KEY));
        assert!(!is_reserved_key("app:roles"));
    }
}
