//! 断言库
//!
//! 所有断言都返回 [`Result`]；断言不成立时返回
//! [`TestingError::Assertion`]，运行器据此把测试计为失败。
//! 其他错误（例如无效正则、评估器不可用）会被计为错误。
//!
//! 文本类断言接受任何 `AsRef<str>`：`&str`、`String`、
//! [`TaskOutput`](crate::fixtures::TaskOutput)、[`CrewOutput`](crate::fixtures::CrewOutput)。
//!
//! ```rust
//! use crew_testing::assertions::{assert_output_format, AssertionResultExt, OutputFormat};
//!
//! let err = assert_output_format("plain words", OutputFormat::Markdown)
//!     .with_message("summary must be markdown")
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "Assertion failed: summary must be markdown");
//! ```

mod content;
mod crew;
mod format;
mod quality;

pub use content::{assert_agent_response_contains, assert_crew_output_matches};
pub use crew::{
    assert_agent_called_tool, assert_agent_collaboration, assert_crew_completed_successfully,
    assert_task_sequence,
};
pub use format::{OutputFormat, assert_output_format};
pub use quality::{assert_agent_response_quality, assert_no_hallucination};

use crate::error::{Result, TestingError};

/// 为断言结果替换失败信息
pub trait AssertionResultExt<T> {
    /// 断言失败时用 `msg` 替换默认信息（保留断言类别）；其他错误原样返回
    fn with_message(self, msg: impl Into<String>) -> Result<T>;
}

impl<T> AssertionResultExt<T> for Result<T> {
    fn with_message(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|err| match err {
            TestingError::Assertion(inner) => TestingError::Assertion(inner.with_message(msg)),
            other => other,
        })
    }
}
