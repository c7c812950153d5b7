//! Mock 工具，用于在不依赖外部服务的情况下测试 Agent 的工具调用行为。
//!
//! # 示例
//!
//! ```rust
//! use crew_testing::testing::MockTool;
//!
//! let tool = MockTool::new("search_tool", "Search the web", "AI is advancing rapidly");
//!
//! assert_eq!(tool.run("AI trends"), "AI is advancing rapidly");
//! assert!(tool.was_called_with("AI trends"));
//! assert_eq!(tool.call_count(), 1);
//! ```

use super::lock;
use crate::fixtures::ToolSpec;
use std::fmt;
use std::sync::{Arc, Mutex};

type SideEffect = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// 返回固定结果的 Mock Tool。
///
/// 每次 [`run`](MockTool::run) 都会把查询记录到调用日志，
/// 调用次数始终等于日志长度。克隆体共享同一份日志。
#[derive(Clone)]
pub struct MockTool {
    name: String,
    description: String,
    return_value: String,
    side_effect: Option<SideEffect>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        return_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            return_value: return_value.into(),
            side_effect: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 设置副作用函数：存在时由它根据查询生成返回值
    pub fn with_side_effect<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.side_effect = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// 转换为描述对象，供 [`AgentSpec`](crate::fixtures::AgentSpec) 使用
    pub fn spec(&self) -> ToolSpec {
        ToolSpec::new(&self.name, &self.description)
    }

    /// 执行工具
    pub fn run(&self, query: &str) -> String {
        lock(&self.calls).push(query.to_string());
        match &self.side_effect {
            Some(f) => f(query),
            None => self.return_value.clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    pub fn was_called_with(&self, query: &str) -> bool {
        lock(&self.calls).iter().any(|q| q == query)
    }

    /// 所有历史查询（按时序排列）
    pub fn call_history(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<String> {
        lock(&self.calls).last().cloned()
    }

    pub fn reset_history(&self) {
        lock(&self.calls).clear();
    }
}

impl fmt::Debug for MockTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTool")
            .field("name", &self.name)
            .field("call_count", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_count_tracks_history() {
        let tool = MockTool::new("calculator", "Adds numbers", "42");
        assert!(!tool.was_called());

        tool.run("6 * 7");
        tool.run("40 + 2");
        assert_eq!(tool.call_count(), 2);
        assert_eq!(tool.call_history(), vec!["6 * 7", "40 + 2"]);
        assert_eq!(tool.last_call().as_deref(), Some("40 + 2"));
        assert!(!tool.was_called_with("1 + 1"));

        tool.reset_history();
        assert_eq!(tool.call_count(), 0);
        assert!(tool.call_history().is_empty());
    }

    #[test]
    fn test_side_effect_overrides_return_value() {
        let tool = MockTool::new("echo", "Echoes input", "unused")
            .with_side_effect(|q| format!("echo: {}", q));
        assert_eq!(tool.run("hello"), "echo: hello");
        assert!(tool.was_called_with("hello"));
    }

    #[test]
    fn test_clones_share_log() {
        let tool = MockTool::new("search", "Search", "results");
        let clone = tool.clone();
        clone.run("query");
        assert_eq!(tool.call_count(), 1);
        assert_eq!(tool.spec(), ToolSpec::new("search", "Search"));
    }
}
