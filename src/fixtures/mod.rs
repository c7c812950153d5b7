//! 测试用例基础设施
//!
//! 一个测试用例类型 = 一个夹具（[`AgentTestCase`] 或 [`CrewTestCase`]）+ 若干 `async fn` 测试方法。
//! 运行器为每个测试方法创建全新实例，依次执行：
//!
//! 夹具 `set_up` → 用例 `set_up` → 测试方法 → 用例 `tear_down` → 夹具 `tear_down`
//!
//! 无论前面哪一步失败，两个 `tear_down` 都会执行。
//!
//! # 示例
//!
//! ```rust
//! use crew_testing::assertions::assert_agent_response_contains;
//! use crew_testing::error::Result;
//! use crew_testing::fixtures::{AgentTestCase, TestCase, TestMethod};
//! use crew_testing::test_methods;
//!
//! #[derive(Default)]
//! struct TestResearchAgent {
//!     base: AgentTestCase,
//! }
//!
//! impl TestResearchAgent {
//!     async fn test_mentions_trends(&mut self) -> Result<()> {
//!         assert_agent_response_contains("AI trends in 2024", "AI trends", true)
//!     }
//! }
//!
//! impl TestCase for TestResearchAgent {
//!     type Fixture = AgentTestCase;
//!
//!     fn fixture(&mut self) -> &mut AgentTestCase {
//!         &mut self.base
//!     }
//!
//!     fn test_methods() -> Vec<TestMethod<Self>> {
//!         test_methods![test_mentions_trends]
//!     }
//! }
//! ```

mod agent_case;
mod crew_case;
pub mod descriptors;

pub use agent_case::AgentTestCase;
pub use crew_case::{CrewPerformance, CrewTestCase};
pub use descriptors::{
    AgentExecutor, AgentSpec, CrewExecutor, CrewOutput, CrewStatus, Process, TaskOutput, TaskSpec,
    TestCrew, ToolSpec,
};

use crate::error::Result;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::fmt;
use std::future::Future;

/// 测试方法名必须以此前缀开头才会被运行器执行
pub const TEST_METHOD_PREFIX: &str = "test_";

/// 测试用例类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    /// 单 Agent 行为测试
    Agent,
    /// 多 Agent（Crew）工作流测试
    Crew,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Agent => write!(f, "agent"),
            TestKind::Crew => write!(f, "crew"),
        }
    }
}

/// 测试夹具：提供工厂方法并在每个测试后清理状态
pub trait Fixture: Default {
    const KIND: TestKind;

    fn set_up(&mut self) -> Result<()> {
        Ok(())
    }

    fn tear_down(&mut self);
}

/// 测试方法返回的 future（单线程执行，不要求 `Send`）
pub type TestFuture<'a> = LocalBoxFuture<'a, Result<()>>;

type TestBody<T> = Box<dyn for<'a> Fn(&'a mut T) -> TestFuture<'a> + Send + Sync>;

/// 一个已命名的测试方法
pub struct TestMethod<T> {
    name: &'static str,
    body: TestBody<T>,
}

impl<T> TestMethod<T> {
    pub fn new<F>(name: &'static str, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut T) -> TestFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name,
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 是否符合测试方法命名约定
    pub fn is_test(&self) -> bool {
        self.name.starts_with(TEST_METHOD_PREFIX)
    }

    pub fn call<'a>(&self, case: &'a mut T) -> TestFuture<'a> {
        (self.body)(case)
    }
}

impl<T> fmt::Debug for TestMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod").field("name", &self.name).finish()
    }
}

/// 把 `async fn` 的返回值装箱为 [`TestFuture`]，供 [`test_methods!`] 使用
pub fn boxed<'a, F>(future: F) -> TestFuture<'a>
where
    F: Future<Output = Result<()>> + 'a,
{
    future.boxed_local()
}

/// 测试用例：必须基于 [`AgentTestCase`] 或 [`CrewTestCase`] 夹具
pub trait TestCase: Default + 'static {
    type Fixture: Fixture;

    fn fixture(&mut self) -> &mut Self::Fixture;

    fn set_up(&mut self) -> Result<()> {
        Ok(())
    }

    fn tear_down(&mut self) {}

    fn test_methods() -> Vec<TestMethod<Self>>;
}

/// 由 `async fn` 方法名列表生成 `Vec<TestMethod<Self>>`
///
/// 只能在 `impl TestCase for ...` 块内使用。
#[macro_export]
macro_rules! test_methods {
    ($($method:ident),* $(,)?) => {
        vec![$(
            $crate::fixtures::TestMethod::new(
                stringify!($method),
                |case: &mut Self| $crate::fixtures::boxed(case.$method()),
            )
        ),*]
    };
}
