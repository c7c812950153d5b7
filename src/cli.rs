//! `crew-test` 命令行入口
//!
//! 参数优先级：命令行 / 环境变量 > 配置文件 > 默认值。

use crate::config::HarnessConfig;
use crate::error::{DiscoveryError, Result, TestingError};
use crate::report::{ConsoleProgress, ConsoleReporter, HtmlReporter};
use crate::runner::{TestRegistry, TestRunner};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};

/// 所有测试通过（或没有发现测试）
pub const EXIT_SUCCESS: u8 = 0;
/// 存在失败或错误的测试
pub const EXIT_TEST_FAILURE: u8 = 1;
/// 发现 / 配置 / 报告阶段出错
pub const EXIT_HARNESS_ERROR: u8 = 2;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "crew-test", version)]
#[command(about = "Discover and run agent and crew tests")]
pub struct CliArgs {
    /// Directory containing test files [default: tests]
    #[arg(short = 'd', long, env = "CREW_TEST_DIR")]
    pub test_dir: Option<PathBuf>,

    /// Glob pattern for test file names [default: test_*.rs]
    #[arg(short = 'p', long, env = "CREW_TEST_PATTERN")]
    pub pattern: Option<String>,

    /// Progress output: 0 none, 1 one character per test, 2 one line per test [default: 2]
    #[arg(short = 'v', long, env = "CREW_TEST_VERBOSITY",
          value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbosity: Option<u8>,

    /// Generate an HTML report
    #[arg(long, env = "CREW_TEST_REPORT")]
    pub report: bool,

    /// HTML report path [default: crewai_test_report.html]
    #[arg(long, env = "CREW_TEST_REPORT_FILE")]
    pub report_file: Option<PathBuf>,

    /// Stop after the first failure or error
    #[arg(long, env = "CREW_TEST_FAIL_FAST")]
    pub fail_fast: bool,

    /// YAML config file
    #[arg(short = 'c', long, env = "CREW_TEST_CONFIG")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// 合并配置文件与命令行参数
    pub fn resolve(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(dir) = &self.test_dir {
            config.test_dir = dir.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if let Some(verbosity) = self.verbosity {
            config.verbosity = verbosity;
        }
        if let Some(file) = &self.report_file {
            config.report_file = file.clone();
        }
        config.report |= self.report;
        config.fail_fast |= self.fail_fast;

        config.validate()?;
        Ok(config)
    }
}

/// 一次命令执行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed,
    NoTests,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Passed | RunOutcome::NoTests => EXIT_SUCCESS,
            RunOutcome::Failed => EXIT_TEST_FAILURE,
        }
    }
}

/// 运行命令并返回进程退出码
pub async fn run(args: CliArgs, registry: TestRegistry) -> ExitCode {
    match execute(&args, registry).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            error!(error = %err, "crew-test 运行失败");
            eprintln!("Error running tests: {}", err);
            ExitCode::from(EXIT_HARNESS_ERROR)
        }
    }
}

/// 发现 → 运行 → 输出摘要 → 生成报告
pub async fn execute(args: &CliArgs, registry: TestRegistry) -> Result<RunOutcome> {
    let config = args.resolve()?;
    let runner_config = config.runner_config()?;

    let progress = Arc::new(ConsoleProgress::new(&runner_config));
    let mut runner = TestRunner::new(registry, runner_config.clone()).with_observer(progress);

    println!(
        "Discovering crew tests in '{}' with pattern '{}'...",
        config.test_dir.display(),
        config.pattern
    );
    let suite = match runner.discover_crew_tests(&config.test_dir, &config.pattern) {
        Ok(suite) => suite,
        Err(TestingError::Discovery(DiscoveryError::NotFound(dir))) => {
            print_getting_started(&dir.display().to_string());
            return Err(DiscoveryError::NotFound(dir).into());
        }
        Err(err) => return Err(err),
    };

    let total = suite.count_test_cases();
    if total == 0 {
        warn!(dir = %config.test_dir.display(), "没有发现测试");
        print_no_tests_hint();
        return Ok(RunOutcome::NoTests);
    }

    println!("Found {} test(s)", total);
    println!("Running tests...");
    let result = runner.run_tests(&suite).await;

    ConsoleReporter::new().print_results(&result);

    if config.report {
        HtmlReporter::new().generate_report(&result, &config.report_file)?;
        println!("Report generated: {}", config.report_file.display());
    }

    Ok(if result.was_successful() {
        RunOutcome::Passed
    } else {
        RunOutcome::Failed
    })
}

fn print_getting_started(dir: &str) {
    println!("Test directory '{}' not found.", dir);
    println!("To get started with crew testing:");
    println!("1. Create a '{}' directory", dir);
    println!("2. Add test files matching the pattern 'test_*.rs'");
    println!("3. Register AgentTestCase or CrewTestCase based test cases under each file's module name");
}

fn print_no_tests_hint() {
    println!("No crew tests found.");
    println!("Make sure your test files:");
    println!("- Match the file pattern and are registered under their file stem");
    println!("- Contain test cases built on AgentTestCase or CrewTestCase");
    println!("- Have test methods starting with 'test_'");
}
