//! 测试用例注册表
//!
//! Rust 无法在运行时按文件名加载代码，因此测试用例类型需要显式注册到模块名下
//! （模块名即测试文件的文件名去掉扩展名），发现阶段再用文件系统匹配结果筛选模块。

use super::result::TestStatus;
use crate::error::{Result, RunnerError, TestingError};
use crate::fixtures::{Fixture, TestCase, TestKind, TestMethod};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::any::Any;
use std::cell::Cell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

/// 单个测试方法的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOutcome {
    pub status: TestStatus,
    pub message: Option<String>,
}

impl MethodOutcome {
    fn passed() -> Self {
        Self {
            status: TestStatus::Passed,
            message: None,
        }
    }

    fn new(status: TestStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    /// 按错误类型分类：断言 → 失败，跳过 → 跳过，其余 → 错误
    pub fn from_error(err: &TestingError) -> Self {
        match err {
            TestingError::Assertion(inner) => Self::new(TestStatus::Failed, inner.to_string()),
            TestingError::Skipped(reason) => Self::new(TestStatus::Skipped, reason.clone()),
            other => Self::new(TestStatus::Errored, other.to_string()),
        }
    }

    /// 测试方法中的 panic 默认视为断言失败（`assert!` 系列、`panic!`）；
    /// `unwrap` / 越界 / 溢出 / `todo!` 等运行时故障计为错误
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = panic_message(payload);
        if RUNTIME_FAULTS.iter().any(|marker| message.contains(marker)) {
            Self::new(TestStatus::Errored, format!("panicked: {}", message))
        } else {
            Self::new(TestStatus::Failed, message)
        }
    }
}

/// 标准库运行时故障的 panic 信息特征
const RUNTIME_FAULTS: &[&str] = &[
    "called `Option::unwrap()`",
    "called `Result::unwrap()`",
    "called `Result::unwrap_err()`",
    "index out of bounds",
    "attempt to add with overflow",
    "attempt to subtract with overflow",
    "attempt to multiply with overflow",
    "attempt to divide by zero",
    "attempt to calculate the remainder with a divisor of zero",
    "not yet implemented",
    "not implemented",
    "internal error: entered unreachable code",
    "byte index",
    "already borrowed",
    "already mutably borrowed",
];

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// 安装一次全局 panic hook：测试方法执行期间不向 stderr 打印 panic 信息，
/// 其余时间交给原来的 hook
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

struct CaptureGuard;

impl CaptureGuard {
    fn enter() -> Self {
        install_quiet_hook();
        CAPTURING.with(|c| c.set(true));
        CaptureGuard
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(false));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// 类型擦除后的测试用例类型
pub trait TestCaseClass: Send + Sync {
    /// 类型名（不含模块路径）
    fn class_name(&self) -> &'static str;

    fn kind(&self) -> TestKind;

    /// 以 `test_` 开头的测试方法名，按声明顺序
    fn method_names(&self) -> Vec<&'static str>;

    /// 在全新实例上运行一个测试方法（含 setUp / tearDown）
    fn run_method<'a>(&'a self, method: &'a str) -> LocalBoxFuture<'a, MethodOutcome>;
}

struct ClassEntry<T>(PhantomData<fn() -> T>);

impl<T: TestCase> TestCaseClass for ClassEntry<T> {
    fn class_name(&self) -> &'static str {
        let full = std::any::type_name::<T>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn kind(&self) -> TestKind {
        <T::Fixture as Fixture>::KIND
    }

    fn method_names(&self) -> Vec<&'static str> {
        T::test_methods()
            .iter()
            .filter(|m| m.is_test())
            .map(TestMethod::name)
            .collect()
    }

    fn run_method<'a>(&'a self, method: &'a str) -> LocalBoxFuture<'a, MethodOutcome> {
        async move {
            let Some(test) = T::test_methods()
                .into_iter()
                .find(|m| m.is_test() && m.name() == method)
            else {
                let err = RunnerError::UnknownTest {
                    class: self.class_name().to_string(),
                    method: method.to_string(),
                };
                return MethodOutcome::new(TestStatus::Errored, err.to_string());
            };

            let mut case = T::default();
            run_isolated(&mut case, &test).await
        }
        .boxed_local()
    }
}

async fn run_body<T: TestCase>(case: &mut T, test: &TestMethod<T>) -> Result<()> {
    case.fixture().set_up()?;
    case.set_up()?;
    test.call(case).await
}

/// 夹具 setUp → 用例 setUp → 测试方法 → 用例 tearDown → 夹具 tearDown
///
/// 两个 tearDown 各自独立执行；任一 panic 时若测试本身已通过则计为错误。
async fn run_isolated<T: TestCase>(case: &mut T, test: &TestMethod<T>) -> MethodOutcome {
    let guard = CaptureGuard::enter();

    let body = AssertUnwindSafe(run_body(case, test)).catch_unwind().await;
    let outcome = match body {
        Ok(Ok(())) => MethodOutcome::passed(),
        Ok(Err(err)) => MethodOutcome::from_error(&err),
        Err(payload) => MethodOutcome::from_panic(payload.as_ref()),
    };

    let case_teardown = panic::catch_unwind(AssertUnwindSafe(|| case.tear_down()));
    let fixture_teardown = panic::catch_unwind(AssertUnwindSafe(|| case.fixture().tear_down()));
    drop(guard);

    match case_teardown.and(fixture_teardown) {
        Err(payload) if outcome.status == TestStatus::Passed => MethodOutcome::new(
            TestStatus::Errored,
            format!("tear_down {}", panic_message(payload.as_ref())),
        ),
        _ => outcome,
    }
}

/// 已注册的测试模块
#[derive(Clone)]
pub struct RegisteredModule {
    pub name: String,
    pub classes: Vec<Arc<dyn TestCaseClass>>,
}

/// 测试用例注册表，保持注册顺序
#[derive(Clone, Default)]
pub struct TestRegistry {
    modules: Vec<RegisteredModule>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把测试用例类型注册到模块下
    pub fn register<T: TestCase>(&mut self, module: &str) -> &mut Self {
        let class: Arc<dyn TestCaseClass> = Arc::new(ClassEntry::<T>(PhantomData));
        match self.modules.iter_mut().find(|m| m.name == module) {
            Some(existing) => existing.classes.push(class),
            None => self.modules.push(RegisteredModule {
                name: module.to_string(),
                classes: vec![class],
            }),
        }
        self
    }

    /// 链式注册
    pub fn with_case<T: TestCase>(mut self, module: &str) -> Self {
        self.register::<T>(module);
        self
    }

    pub fn module(&self, name: &str) -> Option<&RegisteredModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn modules(&self) -> &[RegisteredModule] {
        &self.modules
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// 按类型名查找（返回所属模块名与用例类型）
    pub fn find_class(&self, class: &str) -> Option<(&str, Arc<dyn TestCaseClass>)> {
        self.modules.iter().find_map(|m| {
            m.classes
                .iter()
                .find(|c| c.class_name() == class)
                .map(|c| (m.name.as_str(), c.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssertionError, Result};
    use crate::fixtures::{AgentTestCase, CrewTestCase};
    use crate::test_methods;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEARDOWNS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Lifecycle {
        base: AgentTestCase,
        set_up_ran: bool,
    }

    impl Lifecycle {
        async fn test_passes(&mut self) -> Result<()> {
            assert!(self.set_up_ran);
            let agent = self.base.create_test_agent("Writer", "Write", "Skilled", vec![]);
            assert_eq!(agent.role, "Writer");
            Ok(())
        }

        async fn test_fails(&mut self) -> Result<()> {
            Err(AssertionError::ContentMismatch("missing".to_string()).into())
        }

        async fn test_errors(&mut self) -> Result<()> {
            Err(TestingError::Other("boom".to_string()))
        }

        async fn test_skips(&mut self) -> Result<()> {
            Err(TestingError::skip("not today"))
        }

        async fn test_assert_panics(&mut self) -> Result<()> {
            assert_eq!(1, 2);
            Ok(())
        }

        async fn test_assert_message_panics(&mut self) -> Result<()> {
            let score = 3;
            assert!(score > 5, "quality score too low: {}", score);
            Ok(())
        }

        async fn test_assert_ne_panics(&mut self) -> Result<()> {
            assert_ne!("draft", "draft");
            Ok(())
        }

        async fn test_unwrap_panics(&mut self) -> Result<()> {
            let missing: Option<&str> = None;
            let _ = missing.unwrap();
            Ok(())
        }

        async fn helper(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl TestCase for Lifecycle {
        type Fixture = AgentTestCase;

        fn fixture(&mut self) -> &mut AgentTestCase {
            &mut self.base
        }

        fn set_up(&mut self) -> Result<()> {
            self.set_up_ran = true;
            Ok(())
        }

        fn tear_down(&mut self) {
            TEARDOWNS.fetch_add(1, Ordering::SeqCst);
        }

        fn test_methods() -> Vec<TestMethod<Self>> {
            test_methods![
                test_passes,
                test_fails,
                test_errors,
                test_skips,
                test_assert_panics,
                test_assert_message_panics,
                test_assert_ne_panics,
                test_unwrap_panics,
                helper,
            ]
        }
    }

    #[derive(Default)]
    struct CrewCase {
        base: CrewTestCase,
    }

    impl CrewCase {
        async fn test_nothing(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl TestCase for CrewCase {
        type Fixture = CrewTestCase;

        fn fixture(&mut self) -> &mut CrewTestCase {
            &mut self.base
        }

        fn test_methods() -> Vec<TestMethod<Self>> {
            test_methods![test_nothing]
        }
    }

    #[test]
    fn test_class_metadata() {
        let registry = TestRegistry::new()
            .with_case::<Lifecycle>("test_lifecycle")
            .with_case::<CrewCase>("test_lifecycle");

        let module = registry.module("test_lifecycle").unwrap();
        assert_eq!(module.classes.len(), 2);
        assert_eq!(module.classes[0].class_name(), "Lifecycle");
        assert_eq!(module.classes[0].kind(), TestKind::Agent);
        assert_eq!(module.classes[1].kind(), TestKind::Crew);
        assert_eq!(module.classes[0].method_names().len(), 8);
        assert!(!module.classes[0].method_names().contains(&"helper"));

        let (module_name, class) = registry.find_class("CrewCase").unwrap();
        assert_eq!(module_name, "test_lifecycle");
        assert_eq!(class.method_names(), vec!["test_nothing"]);
    }

    #[tokio::test]
    async fn test_outcome_classification() {
        let registry = TestRegistry::new().with_case::<Lifecycle>("m");
        let class = registry.module("m").unwrap().classes[0].clone();
        let before = TEARDOWNS.load(Ordering::SeqCst);

        let expected = [
            ("test_passes", TestStatus::Passed),
            ("test_fails", TestStatus::Failed),
            ("test_errors", TestStatus::Errored),
            ("test_skips", TestStatus::Skipped),
            ("test_assert_panics", TestStatus::Failed),
            ("test_assert_message_panics", TestStatus::Failed),
            ("test_assert_ne_panics", TestStatus::Failed),
            ("test_unwrap_panics", TestStatus::Errored),
        ];
        for (method, status) in expected {
            let outcome = class.run_method(method).await;
            assert_eq!(outcome.status, status, "{method}: {:?}", outcome.message);
        }

        // 每个测试之后 tear_down 都会执行，包括 panic 的测试
        assert_eq!(TEARDOWNS.load(Ordering::SeqCst) - before, expected.len());

        let outcome = class.run_method("test_assert_message_panics").await;
        assert_eq!(outcome.message.as_deref(), Some("quality score too low: 3"));

        let outcome = class.run_method("helper").await;
        assert_eq!(outcome.status, TestStatus::Errored);
        assert!(outcome.message.unwrap().contains("not registered"));
    }

    static FIXTURE_TEARDOWNS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct CountingFixture;

    impl Fixture for CountingFixture {
        const KIND: TestKind = TestKind::Agent;

        fn tear_down(&mut self) {
            FIXTURE_TEARDOWNS.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct BrokenTeardown {
        base: CountingFixture,
    }

    impl BrokenTeardown {
        async fn test_passes(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl TestCase for BrokenTeardown {
        type Fixture = CountingFixture;

        fn fixture(&mut self) -> &mut CountingFixture {
            &mut self.base
        }

        fn tear_down(&mut self) {
            panic!("cleanup exploded");
        }

        fn test_methods() -> Vec<TestMethod<Self>> {
            test_methods![test_passes]
        }
    }

    #[tokio::test]
    async fn test_fixture_teardown_runs_after_case_teardown_panics() {
        let registry = TestRegistry::new().with_case::<BrokenTeardown>("m");
        let class = registry.module("m").unwrap().classes[0].clone();
        let before = FIXTURE_TEARDOWNS.load(Ordering::SeqCst);

        let outcome = class.run_method("test_passes").await;
        assert_eq!(outcome.status, TestStatus::Errored);
        assert_eq!(outcome.message.as_deref(), Some("tear_down cleanup exploded"));
        assert_eq!(FIXTURE_TEARDOWNS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_panic_classification() {
        let failed = MethodOutcome::from_panic(&"assertion `left == right` failed");
        assert_eq!(failed.status, TestStatus::Failed);

        let custom = MethodOutcome::from_panic(&String::from("summary missing sources"));
        assert_eq!(custom.status, TestStatus::Failed);

        let fault = MethodOutcome::from_panic(
            &"called `Result::unwrap()` on an `Err` value: NotFound",
        );
        assert_eq!(fault.status, TestStatus::Errored);
        assert!(fault.message.unwrap().starts_with("panicked: "));
    }

    #[test]
    fn test_capture_guard_scopes_quiet_hook() {
        assert!(!CAPTURING.with(Cell::get));
        {
            let _guard = CaptureGuard::enter();
            assert!(CAPTURING.with(Cell::get));
        }
        assert!(!CAPTURING.with(Cell::get));

        let seen = std::thread::spawn(|| CAPTURING.with(Cell::get)).join().unwrap();
        assert!(!seen);
    }
}
