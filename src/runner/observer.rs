use super::result::{TestId, TestRecord, TestRunResult};
use crate::fixtures::TestKind;

/// 运行过程回调，所有方法默认为空实现
pub trait RunObserver: Send + Sync {
    fn on_run_start(&self, _total_tests: usize) {}
    fn on_test_start(&self, _id: &TestId, _kind: TestKind) {}
    fn on_test_end(&self, _record: &TestRecord) {}
    fn on_run_end(&self, _result: &TestRunResult) {}
}
