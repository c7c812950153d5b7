//! 静态 HTML 报告

use crate::error::{ReportError, Result};
use crate::runner::{TestRunResult, TestStatus};
use html_escape::encode_text;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{error, info};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 40px; }
.summary { background: #f5f5f5; padding: 20px; border-radius: 5px; }
.success { color: green; }
.failure { color: red; }
.error { color: orange; }
.skipped { color: gray; }
table { border-collapse: collapse; width: 100%; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; vertical-align: top; }
th { background-color: #f2f2f2; }
pre { margin: 0; white-space: pre-wrap; }";

/// 生成不依赖外部资源的单文件 HTML 报告
#[derive(Debug, Clone, Default)]
pub struct HtmlReporter;

impl HtmlReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &TestRunResult) -> String {
        let summary = result.summary();
        let mut html = String::new();

        let _ = writeln!(html, "<!DOCTYPE html>\n<html>\n<head>");
        let _ = writeln!(html, "<meta charset=\"utf-8\">");
        let _ = writeln!(html, "<title>Crew Test Report</title>");
        let _ = writeln!(html, "<style>\n{}\n</style>\n</head>\n<body>", STYLE);
        let _ = writeln!(html, "<h1>Crew Test Report</h1>");

        let _ = writeln!(html, "<div class=\"summary\">\n<h2>Summary</h2>");
        let _ = writeln!(html, "<p>Run: {}</p>", result.run_id());
        let _ = writeln!(
            html,
            "<p>Started: {} &middot; Duration: {:.3}s</p>",
            result.started_at().to_rfc3339(),
            result.elapsed().as_secs_f64()
        );
        let _ = writeln!(html, "<p>Total Tests: {}</p>", summary.total);
        let _ = writeln!(html, "<p class=\"success\">Successes: {}</p>", summary.successes);
        let _ = writeln!(html, "<p class=\"failure\">Failures: {}</p>", summary.failures);
        let _ = writeln!(html, "<p class=\"error\">Errors: {}</p>", summary.errors);
        let _ = writeln!(html, "<p class=\"skipped\">Skipped: {}</p>", summary.skipped);
        let _ = writeln!(html, "<p>Success Rate: {:.1}%</p>", summary.success_rate);
        let _ = writeln!(html, "<p>Agent Tests: {}</p>", summary.agent_tests);
        let _ = writeln!(html, "<p>Crew Tests: {}</p>", summary.crew_tests);
        if result.aborted() {
            let _ = writeln!(html, "<p class=\"failure\">Run aborted (fail-fast)</p>");
        }
        let _ = writeln!(html, "</div>");

        if !result.records().is_empty() {
            let _ = writeln!(html, "<table>");
            let _ = writeln!(
                html,
                "<tr><th>Test</th><th>Kind</th><th>Status</th><th>Duration</th><th>Message</th></tr>"
            );
            for record in result.records() {
                let _ = writeln!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{:.3}s</td><td><pre>{}</pre></td></tr>",
                    encode_text(&record.id.to_string()),
                    record.kind,
                    status_class(record.status),
                    record.status,
                    record.duration.as_secs_f64(),
                    encode_text(record.message.as_deref().unwrap_or(""))
                );
            }
            let _ = writeln!(html, "</table>");
        }

        let _ = writeln!(html, "</body>\n</html>");
        html
    }

    /// 写入报告
    ///
    /// 先写入目标目录下的临时文件再重命名，失败时不会留下不完整的报告。
    pub fn generate_report(&self, result: &TestRunResult, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_error = |source: std::io::Error| {
            error!(path = %path.display(), error = %source, "写入测试报告失败");
            ReportError::Write {
                path: path.to_path_buf(),
                source,
            }
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(self.render(result).as_bytes())
            .map_err(write_error)?;
        tmp.flush().map_err(write_error)?;
        tmp.persist(path).map_err(|e| write_error(e.error))?;

        info!(path = %path.display(), "测试报告已生成");
        Ok(())
    }
}

fn status_class(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "success",
        TestStatus::Failed => "failure",
        TestStatus::Errored => "error",
        TestStatus::Skipped => "skipped",
    }
}
