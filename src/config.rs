//! 运行配置
//!
//! 配置以显式对象的形式传入 [`TestRunner`](crate::runner::TestRunner) 与各 Reporter，
//! 库内部不读取任何全局状态。YAML 配置文件示例：
//!
//! ```yaml
//! test_dir: tests
//! pattern: "test_*.rs"
//! verbosity: 1
//! report: true
//! report_file: target/crew_report.html
//! fail_fast: false
//! ```

use crate::error::{ConfigError, Result, TestingError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TEST_DIR: &str = "tests";
pub const DEFAULT_PATTERN: &str = "test_*.rs";
pub const DEFAULT_REPORT_FILE: &str = "crewai_test_report.html";

/// 输出详细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// 运行中不输出进度
    Quiet,
    /// 每个测试输出一个状态字符
    Normal,
    /// 每个测试输出一行
    #[default]
    Verbose,
}

impl TryFrom<u8> for Verbosity {
    type Error = ConfigError;

    fn try_from(level: u8) -> std::result::Result<Self, Self::Error> {
        match level {
            0 => Ok(Verbosity::Quiet),
            1 => Ok(Verbosity::Normal),
            2 => Ok(Verbosity::Verbose),
            other => Err(ConfigError::InvalidValue {
                field: "verbosity".to_string(),
                message: format!("expected 0, 1 or 2, got {}", other),
            }),
        }
    }
}

impl From<Verbosity> for u8 {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Quiet => 0,
            Verbosity::Normal => 1,
            Verbosity::Verbose => 2,
        }
    }
}

/// 运行器与 Reporter 共用的运行时配置
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub verbosity: Verbosity,
    /// 首个失败或错误出现后中止运行
    pub fail_fast: bool,
}

impl RunnerConfig {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            fail_fast: false,
        }
    }

    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }
}

/// 完整的命令行运行配置，可从 YAML 文件加载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub test_dir: PathBuf,
    pub pattern: String,
    pub verbosity: u8,
    pub report: bool,
    pub report_file: PathBuf,
    pub fail_fast: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_dir: PathBuf::from(DEFAULT_TEST_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            verbosity: 2,
            report: false,
            report_file: PathBuf::from(DEFAULT_REPORT_FILE),
            fail_fast: false,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: HarnessConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: HarnessConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Verbosity::try_from(self.verbosity)?;
        if self.pattern.trim().is_empty() {
            return Err(TestingError::Config(ConfigError::InvalidValue {
                field: "pattern".to_string(),
                message: "must not be empty".to_string(),
            }));
        }
        Ok(())
    }

    pub fn verbosity(&self) -> Result<Verbosity> {
        Ok(Verbosity::try_from(self.verbosity)?)
    }

    pub fn runner_config(&self) -> Result<RunnerConfig> {
        Ok(RunnerConfig::new(self.verbosity()?).fail_fast(self.fail_fast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.test_dir, PathBuf::from("tests"));
        assert_eq!(config.pattern, "test_*.rs");
        assert_eq!(config.verbosity, 2);
        assert!(!config.report);
        assert_eq!(config.report_file, PathBuf::from("crewai_test_report.html"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = HarnessConfig::from_yaml_str("verbosity: 0\nreport: true\n").unwrap();
        assert_eq!(config.verbosity().unwrap(), Verbosity::Quiet);
        assert!(config.report);
        assert_eq!(config.pattern, DEFAULT_PATTERN);
    }

    #[test]
    fn test_invalid_verbosity_rejected() {
        let err = HarnessConfig::from_yaml_str("verbosity: 7").unwrap_err();
        assert!(matches!(
            err,
            TestingError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "test_dir: suites\nfail_fast: true").unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.test_dir, PathBuf::from("suites"));
        assert!(config.runner_config().unwrap().fail_fast);
    }

    #[test]
    fn test_missing_file() {
        let err = HarnessConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(
            err,
            TestingError::Config(ConfigError::FileNotFound(_))
        ));
    }
}
