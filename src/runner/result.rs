//! 运行结果

use crate::fixtures::TestKind;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// 单个测试的结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    Passed,
    /// 断言失败
    Failed,
    /// 断言以外的错误或 panic
    Errored,
    Skipped,
}

impl TestStatus {
    /// 进度输出使用的单字符标记
    pub fn symbol(self) -> char {
        match self {
            TestStatus::Passed => '.',
            TestStatus::Failed => 'F',
            TestStatus::Errored => 'E',
            TestStatus::Skipped => 's',
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "ok"),
            TestStatus::Failed => write!(f, "FAIL"),
            TestStatus::Errored => write!(f, "ERROR"),
            TestStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// 测试标识：模块 / 用例类型 / 方法
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestId {
    pub module: String,
    pub class: String,
    pub method: String,
}

impl TestId {
    pub fn new(
        module: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.module, self.class, self.method)
    }
}

/// 单个测试的执行记录
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub id: TestId,
    pub kind: TestKind,
    pub status: TestStatus,
    pub duration: Duration,
    /// 失败 / 错误 / 跳过的原因
    pub message: Option<String>,
}

/// 各状态的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    fn add(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Errored => self.errored += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
    }
}

/// 汇总信息
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    /// 百分比，0.0 ~ 100.0；没有测试时为 0
    pub success_rate: f64,
    pub agent_tests: usize,
    pub crew_tests: usize,
}

/// 一次运行的完整结果，生成后不可修改
#[derive(Debug, Clone)]
pub struct TestRunResult {
    run_id: Uuid,
    counts: StatusCounts,
    records: Vec<TestRecord>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    aborted: bool,
}

impl TestRunResult {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// 运行是否因 fail-fast 或发现错误而提前终止
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn total(&self) -> usize {
        self.counts.total()
    }

    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// 没有失败也没有错误
    pub fn was_successful(&self) -> bool {
        self.counts.failed == 0 && self.counts.errored == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.with_status(TestStatus::Failed)
    }

    pub fn errors(&self) -> impl Iterator<Item = &TestRecord> {
        self.with_status(TestStatus::Errored)
    }

    pub fn with_status(&self, status: TestStatus) -> impl Iterator<Item = &TestRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    pub fn summary(&self) -> Summary {
        let total = self.total();
        let success_rate = if total > 0 {
            self.counts.passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let of_kind = |kind: TestKind| self.records.iter().filter(|r| r.kind == kind).count();

        Summary {
            total,
            successes: self.counts.passed,
            failures: self.counts.failed,
            errors: self.counts.errored,
            skipped: self.counts.skipped,
            success_rate,
            agent_tests: of_kind(TestKind::Agent),
            crew_tests: of_kind(TestKind::Crew),
        }
    }
}

/// 运行期间累积结果
pub(crate) struct ResultCollector {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    counts: StatusCounts,
    records: Vec<TestRecord>,
}

impl ResultCollector {
    pub(crate) fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            counts: StatusCounts::default(),
            records: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, record: TestRecord) {
        self.counts.add(record.status);
        self.records.push(record);
    }

    pub(crate) fn finish(self, aborted: bool) -> TestRunResult {
        TestRunResult {
            run_id: self.run_id,
            counts: self.counts,
            records: self.records,
            started_at: self.started_at,
            finished_at: Utc::now(),
            aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, kind: TestKind, status: TestStatus) -> TestRecord {
        TestRecord {
            id: TestId::new("test_module", "TestCase", method),
            kind,
            status,
            duration: Duration::from_millis(5),
            message: (status != TestStatus::Passed).then(|| format!("{} reason", method)),
        }
    }

    #[test]
    fn test_counts_match_records() {
        let mut collector = ResultCollector::start();
        collector.record(record("test_a", TestKind::Agent, TestStatus::Passed));
        collector.record(record("test_b", TestKind::Agent, TestStatus::Failed));
        collector.record(record("test_c", TestKind::Crew, TestStatus::Errored));
        collector.record(record("test_d", TestKind::Crew, TestStatus::Skipped));
        let result = collector.finish(false);

        assert_eq!(result.total(), 4);
        assert_eq!(result.total(), result.records().len());
        assert!(!result.was_successful());
        assert_eq!(result.failures().count(), 1);
        assert_eq!(result.errors().next().unwrap().id.method, "test_c");

        let summary = result.summary();
        assert_eq!(summary.success_rate, 25.0);
        assert_eq!(summary.agent_tests, 2);
        assert_eq!(summary.crew_tests, 2);
        assert!(result.finished_at() >= result.started_at());
    }

    #[test]
    fn test_empty_run() {
        let result = ResultCollector::start().finish(false);
        assert_eq!(result.total(), 0);
        assert!(result.was_successful());
        assert_eq!(result.summary().success_rate, 0.0);
    }

    #[test]
    fn test_id_display() {
        let id = TestId::new("test_agent_behavior", "TestResearchAgent", "test_output");
        assert_eq!(
            id.to_string(),
            "test_agent_behavior::TestResearchAgent::test_output"
        );
        assert_eq!(TestStatus::Errored.symbol(), 'E');
    }
}
