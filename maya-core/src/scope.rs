/// 实例的作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// 单例 - 解析器中只缓存一个实例
    #[default]
    Singleton,

    /// 原型 - 每次解析都创建新实例
    Prototype,
}
