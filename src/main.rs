use clap::Parser;
use crew_testing::cli::{self, CliArgs};
use crew_testing::runner::TestRegistry;
use dotenv::dotenv;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[path = "../demos/test_agent_behavior.rs"]
mod test_agent_behavior;
#[path = "../demos/test_crew_workflows.rs"]
mod test_crew_workflows;

/// 内置的示例测试模块；对应 `demos/` 下的同名文件
fn builtin_registry() -> TestRegistry {
    let mut registry = TestRegistry::new();
    test_agent_behavior::register(&mut registry);
    test_crew_workflows::register(&mut registry);
    registry
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crew_testing=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::run(CliArgs::parse(), builtin_registry()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_testing::config::{RunnerConfig, Verbosity};
    use crew_testing::runner::{TestRunner, TestStatus};

    #[tokio::test]
    async fn test_demo_suites_pass() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let mut runner = TestRunner::new(builtin_registry(), RunnerConfig::new(Verbosity::Quiet));

        let suite = runner.discover_crew_tests(&demos, "test_*.rs").unwrap();
        assert_eq!(
            suite.modules(),
            vec!["test_agent_behavior", "test_crew_workflows"]
        );
        assert_eq!(suite.count_test_cases(), 11);

        let result = runner.run_tests(&suite).await;
        let problems: Vec<_> = result
            .records()
            .iter()
            .filter(|r| r.status != TestStatus::Passed)
            .map(|r| format!("{}: {:?}", r.id, r.message))
            .collect();
        assert!(problems.is_empty(), "{:#?}", problems);

        let summary = result.summary();
        assert_eq!(summary.agent_tests, 6);
        assert_eq!(summary.crew_tests, 5);
    }
}
