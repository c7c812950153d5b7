//! Mock 对象
//!
//! 在不依赖真实模型 / 外部服务的情况下测试 Agent 与 Crew 的工具集。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`MockAgent`] | 替代真实 Agent，按脚本返回响应，记录输入、执行历史与工具调用 |
//! | [`MockTool`] | 替代真实工具，返回固定值（或副作用函数的结果）并记录查询 |
//! | [`MockCrew`] | 用一组 `MockAgent` 执行 [`TestCrew`](crate::fixtures::TestCrew) |
//! | [`MockEvaluator`] | 替代评审模型，按脚本返回质量评分与事实检查结论 |
//!
//! # 设计原则
//!
//! - **零网络请求**：所有 Mock 都完全在内存中运行
//! - **可脚本化**：通过 `with_response()` / `with_failure()` 精确控制返回值
//! - **可观测**：通过 `call_count()` / `calls()` 等方法检查调用情况
//! - **共享状态**：内部使用 `Arc<Mutex<_>>`，克隆体共享同一份调用日志
//!
//! # 使用示例
//!
//! ```rust
//! use crew_testing::fixtures::{AgentExecutor, TaskSpec};
//! use crew_testing::testing::{MockAgent, MockTool};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let search = MockTool::new("search_tool", "Search the web", "AI adoption doubled");
//! let mut agent = MockAgent::new("Senior Research Analyst")
//!     .with_tools(vec![search.clone()])
//!     .with_response("AI trends in 2024: adoption doubled");
//!
//! agent.call_tool("search_tool", "AI adoption").unwrap();
//! let output = agent.execute_task(&TaskSpec::new("Research AI trends")).await.unwrap();
//!
//! assert!(output.raw.contains("AI trends"));
//! assert!(search.was_called_with("AI adoption"));
//! assert!(agent.called_tool("search_tool"));
//! # }
//! ```

mod mock_agent;
mod mock_crew;
mod mock_evaluator;
mod mock_tool;

pub use mock_agent::{ExecutionRecord, MockAgent, ResponsePolicy, ToolCall};
pub use mock_crew::MockCrew;
pub use mock_evaluator::{EvaluationCall, MockEvaluator};
pub use mock_tool::MockTool;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// 获取锁；测试中的 panic 可能使锁中毒，此时仍返回内部数据
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
