//! 通用工具函数

/// 命名相关工具
pub mod naming {
    /// 从完整类型路径中取出简短名称
    ///
    /// 泛型参数会被去掉，用于错误信息和日志中的控制器、模块名称。
    ///
    /// ```
    /// use maya_core::utils::naming::short_type_name;
    ///
    /// assert_eq!(short_type_name("app::users::UserController"), "UserController");
    /// assert_eq!(short_type_name("app::Wrapper<app::Inner>"), "Wrapper");
    /// assert_eq!(short_type_name("AppModule"), "AppModule");
    /// ```
    pub fn short_type_name(full: &str) -> &str {
        let without_generics = full.split('<').next().unwrap_or(full);
        without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics)
    }

    /// `short_type_name` 的泛型版本
    pub fn type_name_of<T: ?Sized>() -> &'static str {
        short_type_name(std::any::type_name::<T>())
    }
}

/// 路由路径工具
pub mod path {
    /// 规范化路由路径
    ///
    /// 合并重复的 `/`，保证只有一个前导 `/`，去掉末尾的 `/`（根路径除外）。
    ///
    /// ```
    /// use maya_core::utils::path::normalize_path;
    ///
    /// assert_eq!(normalize_path("//users//"), "/users");
    /// assert_eq!(normalize_path(""), "/");
    /// ```
    pub fn normalize_path(path: &str) -> String {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return "/".to_string();
        }
        format!("/{}", segments.join("/"))
    }

    /// 拼接前缀和相对路径后再规范化
    pub fn join_paths(prefix: &str, path: &str) -> String {
        normalize_path(&format!("{}/{}", prefix, path))
    }
}

/// 依赖解析工具
pub mod dependency {
    use parking_lot::Mutex;
    use std::thread::ThreadId;

    /// 跟踪当前正在构造的类型，用于检测循环依赖
    ///
    /// 按线程记录构造栈，不同线程并发解析同一类型不会被误判为循环。
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: Mutex<Vec<(ThreadId, &'static str)>>,
    }

    impl CreationTracker {
        pub fn new() -> Self {
            Self::default()
        }

        /// 标记开始构造 `name`
        ///
        /// 如果当前线程已经在构造它，返回从首次出现到本次的构造链。
        pub fn start_creating(&self, name: &'static str) -> Result<(), Vec<String>> {
            let thread = std::thread::current().id();
            let mut creating = self.creating.lock();

            let chain: Vec<&'static str> = creating
                .iter()
                .filter(|(owner, _)| *owner == thread)
                .map(|(_, n)| *n)
                .collect();

            if let Some(start) = chain.iter().position(|n| *n == name) {
                let mut cycle: Vec<String> = chain[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(cycle);
            }

            creating.push((thread, name));
            Ok(())
        }

        /// 标记 `name` 构造结束
        pub fn finish_creating(&self, name: &'static str) {
            let thread = std::thread::current().id();
            let mut creating = self.creating.lock();
            if let Some(index) = creating
                .iter()
                .rposition(|(owner, n)| *owner == thread && *n == name)
            {
                creating.remove(index);
            }
        }

        pub fn is_creating(&self, name: &str) -> bool {
            let thread = std::thread::current().id();
            self.creating
                .lock()
                .iter()
                .any(|(owner, n)| *owner == thread && *n == name)
        }
    }
}

#[cfg(test)]
mod tests {
    mod naming_tests {
        use super::super::naming::*;

        #[test]
        fn test_short_type_name() {
            assert_eq!(short_type_name("a::b::UserService"), "UserService");
            assert_eq!(short_type_name("UserService"), "UserService");
            assert_eq!(short_type_name("a::Repo<a::User>"), "Repo");
            assert_eq!(short_type_name(""), "");
        }

        #[test]
        fn test_type_name_of() {
            struct LocalController;
            assert_eq!(type_name_of::<LocalController>(), "LocalController");
        }
    }

    mod path_tests {
        use super::super::path::*;

        #[test]
        fn test_normalize_variants_of_same_path() {
            for raw in ["users", "/users", "users/", "//users//"] {
                assert_eq!(normalize_path(raw), "/users", "input: {raw:?}");
            }
        }

        #[test]
        fn test_normalize_root_and_nested() {
            assert_eq!(normalize_path(""), "/");
            assert_eq!(normalize_path("/"), "/");
            assert_eq!(normalize_path("///"), "/");
            assert_eq!(normalize_path("api//v1/users/"), "/api/v1/users");
            assert_eq!(normalize_path("/users/:id"), "/users/:id");
        }

        #[test]
        fn test_join_paths() {
            assert_eq!(join_paths("", ""), "/");
            assert_eq!(join_paths("/api", "users"), "/api/users");
            assert_eq!(join_paths("/api/", "/users/"), "/api/users");
            assert_eq!(join_paths("", "/"), "/");
        }
    }

    mod dependency_tests {
        use super::super::dependency::*;

        #[test]
        fn test_creation_tracker() {
            let tracker = CreationTracker::new();

            assert!(!tracker.is_creating("serviceA"));
            assert!(tracker.start_creating("serviceA").is_ok());
            assert!(tracker.is_creating("serviceA"));

            tracker.finish_creating("serviceA");
            assert!(!tracker.is_creating("serviceA"));
        }

        #[test]
        fn test_cycle_chain_is_reported() {
            let tracker = CreationTracker::new();
            tracker.start_creating("serviceA").unwrap();
            tracker.start_creating("serviceB").unwrap();

            let cycle = tracker.start_creating("serviceA").unwrap_err();
            assert_eq!(cycle, vec!["serviceA", "serviceB", "serviceA"]);
        }

        #[test]
        fn test_other_threads_do_not_see_cycle() {
            let tracker = std::sync::Arc::new(CreationTracker::new());
            tracker.start_creating("serviceA").unwrap();

            let shared = std::sync::Arc::clone(&tracker);
            let result = std::thread::spawn(move || {
                let outcome = shared.start_creating("serviceA");
                shared.finish_creating("serviceA");
                outcome
            })
            .join()
            .unwrap();

            assert!(result.is_ok());
            assert!(tracker.is_creating("serviceA"));
        }
    }
}
