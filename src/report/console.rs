//! 控制台输出

use crate::config::{RunnerConfig, Verbosity};
use crate::runner::{RunObserver, TestRecord, TestRunResult, TestStatus};
use std::fmt::Write as _;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

/// 把运行结果渲染为确定性的文本摘要
///
/// 失败与错误详情总会输出；逐个测试的结果由 [`ConsoleProgress`] 在运行过程中输出。
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &TestRunResult) -> String {
        let summary = result.summary();
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "\n{}", rule);
        let _ = writeln!(out, "Crew Test Results Summary");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Total Tests: {}", summary.total);
        let _ = writeln!(out, "Successes: {}", summary.successes);
        let _ = writeln!(out, "Failures: {}", summary.failures);
        let _ = writeln!(out, "Errors: {}", summary.errors);
        let _ = writeln!(out, "Skipped: {}", summary.skipped);
        let _ = writeln!(out, "Success Rate: {:.1}%", summary.success_rate);
        let _ = writeln!(out, "Agent Tests: {}", summary.agent_tests);
        let _ = writeln!(out, "Crew Tests: {}", summary.crew_tests);

        write_details(&mut out, "Failures", result.failures());
        write_details(&mut out, "Errors", result.errors());

        if result.aborted() {
            let _ = writeln!(out, "\nRun aborted before all tests finished (fail-fast)");
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "Ran {} test{} in {:.3}s",
            summary.total,
            if summary.total == 1 { "" } else { "s" },
            result.elapsed().as_secs_f64()
        );
        let _ = writeln!(out, "{}", final_line(result));
        out
    }

    pub fn print_results(&self, result: &TestRunResult) {
        print!("{}", self.render(result));
    }
}

fn write_details<'a>(out: &mut String, title: &str, records: impl Iterator<Item = &'a TestRecord>) {
    let records: Vec<_> = records.collect();
    if records.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{} ({}):", title, records.len());
    for record in records {
        let _ = writeln!(
            out,
            "- {}: {}",
            record.id,
            record.message.as_deref().unwrap_or("")
        );
    }
}

/// `OK` / `OK (skipped=n)` / `FAILED (failures=n, errors=m)`
pub fn final_line(result: &TestRunResult) -> String {
    let counts = result.counts();
    if result.was_successful() {
        if counts.skipped > 0 {
            format!("OK (skipped={})", counts.skipped)
        } else {
            "OK".to_string()
        }
    } else {
        format!(
            "FAILED (failures={}, errors={})",
            counts.failed, counts.errored
        )
    }
}

/// 运行过程中的进度输出
///
/// - 详细程度 1：每个测试输出一个字符（`.` / `F` / `E` / `s`）
/// - 详细程度 2：每个测试输出一行
#[derive(Debug, Clone)]
pub struct ConsoleProgress {
    verbosity: Verbosity,
}

impl ConsoleProgress {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            verbosity: config.verbosity,
        }
    }

    /// 单个测试的进度文本；详细程度 0 时为空
    pub fn progress_text(&self, record: &TestRecord) -> String {
        match self.verbosity {
            Verbosity::Quiet => String::new(),
            Verbosity::Normal => record.status.symbol().to_string(),
            Verbosity::Verbose => match (&record.message, record.status) {
                (Some(reason), TestStatus::Skipped) => {
                    format!("{} ... skipped '{}'\n", record.id, reason)
                }
                _ => format!("{} ... {}\n", record.id, record.status),
            },
        }
    }
}

impl RunObserver for ConsoleProgress {
    fn on_test_end(&self, record: &TestRecord) {
        let text = self.progress_text(record);
        if text.is_empty() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn on_run_end(&self, _result: &TestRunResult) {
        if self.verbosity == Verbosity::Normal {
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestKind;
    use crate::runner::{ResultCollector, TestId};
    use std::time::Duration;

    fn record(method: &str, status: TestStatus, message: Option<&str>) -> TestRecord {
        TestRecord {
            id: TestId::new("test_agent_behavior", "TestResearchAgent", method),
            kind: TestKind::Agent,
            status,
            duration: Duration::from_millis(12),
            message: message.map(str::to_string),
        }
    }

    fn mixed_result() -> TestRunResult {
        let mut collector = ResultCollector::start();
        collector.record(record("test_ok", TestStatus::Passed, None));
        collector.record(record("test_bad", TestStatus::Failed, Some("missing 'AI'")));
        collector.record(record("test_broken", TestStatus::Errored, Some("mock exhausted")));
        collector.finish(false)
    }

    #[test]
    fn test_summary_always_includes_details() {
        let text = ConsoleReporter::new().render(&mixed_result());
        assert!(text.contains("Crew Test Results Summary"));
        assert!(text.contains("Total Tests: 3"));
        assert!(text.contains("Success Rate: 33.3%"));
        assert!(text.contains("Failures (1):"));
        assert!(text.contains(
            "- test_agent_behavior::TestResearchAgent::test_bad: missing 'AI'"
        ));
        assert!(text.contains("Errors (1):"));
        assert!(text.contains("mock exhausted"));
        assert!(text.contains("Ran 3 tests in"));
        assert!(text.trim_end().ends_with("FAILED (failures=1, errors=1)"));
    }

    #[test]
    fn test_summary_does_not_repeat_progress_lines() {
        let text = ConsoleReporter::new().render(&mixed_result());
        assert!(!text.contains("\nTests:"));
        assert!(!text.contains("test_ok"));
    }

    #[test]
    fn test_empty_run_is_ok() {
        let result = ResultCollector::start().finish(false);
        let text = ConsoleReporter::new().render(&result);
        assert!(text.contains("Ran 0 tests in"));
        assert!(!text.contains("Failures ("));
        assert!(text.trim_end().ends_with("OK"));
    }

    #[test]
    fn test_progress_text() {
        let skipped = record("test_later", TestStatus::Skipped, Some("no key"));

        let normal = ConsoleProgress::new(&RunnerConfig::new(Verbosity::Normal));
        assert_eq!(normal.progress_text(&skipped), "s");

        let verbose = ConsoleProgress::new(&RunnerConfig::new(Verbosity::Verbose));
        assert_eq!(
            verbose.progress_text(&skipped),
            "test_agent_behavior::TestResearchAgent::test_later ... skipped 'no key'\n"
        );

        let quiet = ConsoleProgress::new(&RunnerConfig::new(Verbosity::Quiet));
        assert!(quiet.progress_text(&skipped).is_empty());
    }
}
