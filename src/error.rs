use std::path::PathBuf;
use thiserror::Error;

/// 测试框架的统一错误类型
///
/// 运行器按变体对测试方法的返回值分类：
/// [`TestingError::Assertion`] 计为失败，[`TestingError::Skipped`] 计为跳过，
/// 其余一律计为错误。
#[derive(Debug, Error)]
pub enum TestingError {
    /// 断言失败
    #[error("Assertion failed: {0}")]
    Assertion(#[from] AssertionError),
    /// Mock 对象错误
    #[error("Mock error: {0}")]
    Mock(#[from] MockError),
    /// 测试夹具使用错误
    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),
    /// 外部评估器错误
    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),
    /// 测试发现错误
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    /// 报告生成错误
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// 运行器状态错误
    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),
    /// 正则表达式无效（测试代码本身的问题，计为错误而非失败）
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// 主动跳过测试
    #[error("Skipped: {0}")]
    Skipped(String),
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 其他错误
    #[error("Error: {0}")]
    Other(String),
}

impl TestingError {
    /// 在测试方法中跳过当前测试
    pub fn skip(reason: impl Into<String>) -> Self {
        TestingError::Skipped(reason.into())
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, TestingError::Assertion(_))
    }
}

/// 断言失败的具体类别
///
/// 每个变体携带面向用户的失败信息，可通过 [`AssertionError::with_message`] 覆盖。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssertionError {
    /// 输出中缺少预期内容
    #[error("{0}")]
    ContentMismatch(String),
    /// 输出格式不符合预期
    #[error("{0}")]
    FormatError(String),
    /// 输出不匹配给定模式
    #[error("{0}")]
    PatternMismatch(String),
    /// 质量评分低于阈值
    #[error("{0}")]
    QualityBelowThreshold(String),
    /// 检测到幻觉内容
    #[error("{0}")]
    HallucinationDetected(String),
    /// Crew 执行失败
    #[error("{0}")]
    CrewExecutionFailed(String),
    /// Agent 未调用预期工具
    #[error("{0}")]
    ToolNotCalled(String),
    /// 任务执行顺序不符
    #[error("{0}")]
    TaskSequenceMismatch(String),
    /// 参与协作的 Agent 数量不足
    #[error("{0}")]
    InsufficientCollaboration(String),
    /// 通用断言失败
    #[error("{0}")]
    Failed(String),
}

impl AssertionError {
    /// 保留断言类别，替换失败信息
    pub fn with_message(self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match self {
            AssertionError::ContentMismatch(_) => AssertionError::ContentMismatch(msg),
            AssertionError::FormatError(_) => AssertionError::FormatError(msg),
            AssertionError::PatternMismatch(_) => AssertionError::PatternMismatch(msg),
            AssertionError::QualityBelowThreshold(_) => AssertionError::QualityBelowThreshold(msg),
            AssertionError::HallucinationDetected(_) => AssertionError::HallucinationDetected(msg),
            AssertionError::CrewExecutionFailed(_) => AssertionError::CrewExecutionFailed(msg),
            AssertionError::ToolNotCalled(_) => AssertionError::ToolNotCalled(msg),
            AssertionError::TaskSequenceMismatch(_) => AssertionError::TaskSequenceMismatch(msg),
            AssertionError::InsufficientCollaboration(_) => {
                AssertionError::InsufficientCollaboration(msg)
            }
            AssertionError::Failed(_) => AssertionError::Failed(msg),
        }
    }

    /// 断言类别名，用于报告
    pub fn kind(&self) -> &'static str {
        match self {
            AssertionError::ContentMismatch(_) => "ContentMismatch",
            AssertionError::FormatError(_) => "FormatError",
            AssertionError::PatternMismatch(_) => "PatternMismatch",
            AssertionError::QualityBelowThreshold(_) => "QualityBelowThreshold",
            AssertionError::HallucinationDetected(_) => "HallucinationDetected",
            AssertionError::CrewExecutionFailed(_) => "CrewExecutionFailed",
            AssertionError::ToolNotCalled(_) => "ToolNotCalled",
            AssertionError::TaskSequenceMismatch(_) => "TaskSequenceMismatch",
            AssertionError::InsufficientCollaboration(_) => "InsufficientCollaboration",
            AssertionError::Failed(_) => "AssertionError",
        }
    }
}

/// Mock 对象错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MockError {
    /// 调用次数超过预设响应数量
    #[error("Mock agent '{agent}' exhausted its {provided} scripted response(s)")]
    ExhaustedResponses { agent: String, provided: usize },
    /// 预设的失败响应
    #[error("Mock agent '{agent}' failed: {message}")]
    ScriptedFailure { agent: String, message: String },
    /// Agent 未持有该工具
    #[error("Mock agent '{agent}' has no tool named '{tool}'")]
    UnknownTool { agent: String, tool: String },
    /// MockCrew 中没有对应角色的 Agent
    #[error("No mock agent registered for role '{0}'")]
    UnknownAgent(String),
}

/// 测试夹具错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FixtureError {
    #[error("No agent available. Create an agent first or pass one explicitly.")]
    NoAgent,
    #[error("No agents available. Create agents first or pass them explicitly.")]
    NoAgents,
    #[error("No tasks available. Create tasks first or pass them explicitly.")]
    NoTasks,
    #[error("No crew available for execution. Create a crew first.")]
    NoCrew,
    #[error("No evaluator configured for quality assertions.")]
    NoEvaluator,
}

/// 评估器错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluatorError {
    /// 评估器没有返回结果
    #[error("Evaluator returned no response")]
    NoResponse,
    /// 评估结果无法解析
    #[error("Invalid evaluator verdict: {0}")]
    InvalidVerdict(String),
    /// 评估服务不可用
    #[error("Evaluator unavailable: {0}")]
    Unavailable(String),
}

/// 测试发现错误
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// 测试目录不存在
    #[error("Test directory '{0}' not found")]
    NotFound(PathBuf),
    /// 路径存在但不是目录
    #[error("Test path '{0}' is not a directory")]
    NotADirectory(PathBuf),
    /// 文件名 glob 模式无效
    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// 遍历目录失败
    #[error("Failed to walk '{path}': {message}")]
    Walk { path: PathBuf, message: String },
}

/// 报告写入错误
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// 配置解析失败
    #[error("Failed to parse config: {0}")]
    ParseFailed(String),
    /// 配置值无效
    #[error("Invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// 运行器错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunnerError {
    #[error("No test suite available. Run discovery first.")]
    NoSuite,
    #[error("Test '{class}::{method}' is not registered")]
    UnknownTest { class: String, method: String },
}

impl From<serde_yaml::Error> for TestingError {
    fn from(err: serde_yaml::Error) -> Self {
        TestingError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, TestingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_message_keeps_kind() {
        let err = AssertionError::ContentMismatch("default".to_string()).with_message("custom");
        assert_eq!(err, AssertionError::ContentMismatch("custom".to_string()));
        assert_eq!(err.kind(), "ContentMismatch");
    }

    #[test]
    fn test_assertion_converts_into_testing_error() {
        let err: TestingError = AssertionError::Failed("boom".to_string()).into();
        assert!(err.is_assertion());
        assert_eq!(err.to_string(), "Assertion failed: boom");
    }

    #[test]
    fn test_mock_error_is_not_assertion() {
        let err: TestingError = MockError::ExhaustedResponses {
            agent: "writer".to_string(),
            provided: 2,
        }
        .into();
        assert!(!err.is_assertion());
        assert!(err.to_string().contains("exhausted its 2"));
    }
}
