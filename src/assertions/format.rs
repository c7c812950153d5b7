use crate::error::{AssertionError, Result, TestingError};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_MARKDOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)",
        r"^ {0,3}#{1,6}\s",               // 标题
        r"|^\s*(?:[-*+]|\d+\.)\s+\S",     // 列表
        r"|\*\*[^*\n]+\*\*|__[^_\n]+__",  // 粗体
        r"|\*[^*\s][^*\n]*\*",            // 斜体
        r"|`[^`\n]+`|^```",               // 代码
        r"|\[[^\]\n]+\]\([^)\s]+\)",      // 链接
    ))
    .expect("valid regex")
});

/// 可校验的输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = TestingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(TestingError::Other(format!(
                "Unsupported output format '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// 断言输出符合指定格式
pub fn assert_output_format<O>(output: &O, format: OutputFormat) -> Result<()>
where
    O: AsRef<str> + ?Sized,
{
    let content = output.as_ref();
    let problem = match format {
        OutputFormat::Text => None,
        OutputFormat::Json => serde_json::from_str::<serde_json::Value>(content)
            .err()
            .map(|e| format!("Output is not valid JSON: {}", e)),
        OutputFormat::Markdown => (!RE_MARKDOWN.is_match(content))
            .then(|| "Output does not appear to be Markdown format".to_string()),
        OutputFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
            .err()
            .map(|e| format!("Output is not valid YAML: {}", e)),
    };

    match problem {
        Some(msg) => Err(AssertionError::FormatError(msg).into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails(output: &str, format: OutputFormat) -> bool {
        matches!(
            assert_output_format(output, format),
            Err(TestingError::Assertion(AssertionError::FormatError(_)))
        )
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" Markdown ".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json() {
        assert!(assert_output_format(r#"{"a": [1, 2]}"#, OutputFormat::Json).is_ok());
        assert!(assert_output_format("42", OutputFormat::Json).is_ok());
        assert!(fails("{a: 1}", OutputFormat::Json));
        assert!(fails("", OutputFormat::Json));
    }

    #[test]
    fn test_markdown_markers() {
        for sample in [
            "# Title",
            "intro\n## Section",
            "- item one",
            "1. first",
            "some **bold** words",
            "an *emphasised* word",
            "call `run()` now",
            "see [docs](https://example.com)",
        ] {
            assert!(
                assert_output_format(sample, OutputFormat::Markdown).is_ok(),
                "expected markdown: {sample}"
            );
        }
        assert!(fails("just a plain sentence.", OutputFormat::Markdown));
        assert!(fails("#hashtag without space", OutputFormat::Markdown));
    }

    #[test]
    fn test_yaml_and_text() {
        assert!(assert_output_format("key: value\nlist:\n  - a\n", OutputFormat::Yaml).is_ok());
        assert!(fails("key: [unclosed", OutputFormat::Yaml));
        assert!(assert_output_format("", OutputFormat::Text).is_ok());
    }
}
