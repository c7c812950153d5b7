//! 测试运行器
//!
//! 状态机：`Idle → Discovering → Running → Completed | Aborted`。
//! 发现失败或 fail-fast 触发时进入 `Aborted`。
//!
//! 测试在当前线程上按发现顺序逐个执行；每个测试方法使用全新的用例实例。

mod discovery;
mod observer;
mod registry;
mod result;

pub use discovery::{SuiteCase, TestSuite};
pub use observer::RunObserver;
pub use registry::{MethodOutcome, RegisteredModule, TestCaseClass, TestRegistry};
pub use result::{StatusCounts, Summary, TestId, TestRecord, TestRunResult, TestStatus};

pub(crate) use result::ResultCollector;

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 运行器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    /// 正在发现或已发现、尚未运行
    Discovering,
    Running,
    Completed,
    Aborted,
}

pub struct TestRunner {
    registry: TestRegistry,
    config: RunnerConfig,
    observers: Vec<Arc<dyn RunObserver>>,
    state: RunnerState,
    suite: Option<TestSuite>,
}

impl TestRunner {
    pub fn new(registry: TestRegistry, config: RunnerConfig) -> Self {
        Self {
            registry,
            config,
            observers: Vec::new(),
            state: RunnerState::Idle,
            suite: None,
        }
    }

    /// 添加运行回调
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// 最近一次发现得到的测试集
    pub fn suite(&self) -> Option<&TestSuite> {
        self.suite.as_ref()
    }

    /// 在 `test_dir` 中发现匹配 `pattern` 的测试模块
    pub fn discover_crew_tests(
        &mut self,
        test_dir: impl AsRef<Path>,
        pattern: &str,
    ) -> Result<TestSuite> {
        let test_dir = test_dir.as_ref();
        self.state = RunnerState::Discovering;

        match discovery::discover(&self.registry, test_dir, pattern) {
            Ok(suite) => {
                self.suite = Some(suite.clone());
                Ok(suite)
            }
            Err(err) => {
                warn!(dir = %test_dir.display(), error = %err, "测试发现失败");
                self.state = RunnerState::Aborted;
                Err(err)
            }
        }
    }

    /// 运行测试集中的全部测试方法
    pub async fn run_tests(&mut self, suite: &TestSuite) -> TestRunResult {
        let plan = suite
            .iter()
            .flat_map(|case| {
                case.class
                    .method_names()
                    .into_iter()
                    .map(move |method| (case, method))
            })
            .collect::<Vec<_>>();
        self.execute(&plan).await
    }

    /// 运行最近一次发现的测试集
    pub async fn run_discovered(&mut self) -> Result<TestRunResult> {
        let suite = self.suite.clone().ok_or(RunnerError::NoSuite)?;
        Ok(self.run_tests(&suite).await)
    }

    /// 按类型名与方法名运行单个测试
    pub async fn run_single_test(&mut self, class: &str, method: &str) -> Result<TestRunResult> {
        let unknown = || RunnerError::UnknownTest {
            class: class.to_string(),
            method: method.to_string(),
        };

        let (module, entry) = self.registry.find_class(class).ok_or_else(unknown)?;
        let method = entry
            .method_names()
            .into_iter()
            .find(|m| *m == method)
            .ok_or_else(unknown)?;

        let case = SuiteCase {
            module: module.to_string(),
            path: PathBuf::from(module),
            class: entry,
        };
        Ok(self.execute(&[(&case, method)]).await)
    }

    async fn execute(&mut self, plan: &[(&SuiteCase, &'static str)]) -> TestRunResult {
        self.state = RunnerState::Running;
        info!(tests = plan.len(), "开始运行测试");
        for observer in &self.observers {
            observer.on_run_start(plan.len());
        }

        let mut collector = ResultCollector::start();
        let mut aborted = false;

        for (case, method) in plan {
            let id = TestId::new(&case.module, case.class.class_name(), *method);
            let kind = case.class.kind();
            for observer in &self.observers {
                observer.on_test_start(&id, kind);
            }

            let started = Instant::now();
            let outcome = case.class.run_method(method).await;
            let record = TestRecord {
                id,
                kind,
                status: outcome.status,
                duration: started.elapsed(),
                message: outcome.message,
            };
            debug!(test = %record.id, status = %record.status, "测试完成");

            for observer in &self.observers {
                observer.on_test_end(&record);
            }
            let failed = matches!(record.status, TestStatus::Failed | TestStatus::Errored);
            collector.record(record);

            if failed && self.config.fail_fast {
                warn!("fail-fast 已启用，停止运行剩余测试");
                aborted = true;
                break;
            }
        }

        let result = collector.finish(aborted);
        self.state = if aborted {
            RunnerState::Aborted
        } else {
            RunnerState::Completed
        };
        for observer in &self.observers {
            observer.on_run_end(&result);
        }

        let counts = result.counts();
        info!(
            passed = counts.passed,
            failed = counts.failed,
            errored = counts.errored,
            skipped = counts.skipped,
            aborted,
            "测试运行结束"
        );
        result
    }
}
