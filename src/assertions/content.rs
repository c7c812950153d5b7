use crate::error::{AssertionError, Result, TestingError};
use regex::Regex;

/// 断言输出中包含预期内容
///
/// `case_sensitive` 为 `false` 时两侧都转为小写后比较。
pub fn assert_agent_response_contains<O>(output: &O, expected: &str, case_sensitive: bool) -> Result<()>
where
    O: AsRef<str> + ?Sized,
{
    let actual = output.as_ref();
    let found = if case_sensitive {
        actual.contains(expected)
    } else {
        actual.to_lowercase().contains(&expected.to_lowercase())
    };

    if !found {
        return Err(AssertionError::ContentMismatch(format!(
            "Expected content '{}' not found in agent output",
            expected
        ))
        .into());
    }
    Ok(())
}

/// 断言 Crew 输出匹配给定模式
///
/// `regex` 为 `false` 时做子串匹配，否则做正则搜索（任意位置匹配即可）。
/// 正则本身无效时返回 [`TestingError::InvalidPattern`]，计为错误而非失败。
pub fn assert_crew_output_matches<O>(output: &O, pattern: &str, regex: bool) -> Result<()>
where
    O: AsRef<str> + ?Sized,
{
    let actual = output.as_ref();

    if !regex {
        if !actual.contains(pattern) {
            return Err(AssertionError::PatternMismatch(format!(
                "Expected pattern '{}' not found in crew output",
                pattern
            ))
            .into());
        }
        return Ok(());
    }

    let re = Regex::new(pattern).map_err(|e| TestingError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    if !re.is_match(actual) {
        return Err(AssertionError::PatternMismatch(format!(
            "Crew output does not match regex pattern: {}",
            pattern
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{CrewOutput, TaskOutput};

    #[test]
    fn test_contains_case_insensitive_by_flag() {
        let output = TaskOutput::new("research", "AI Trends in 2024", "Researcher");
        assert!(assert_agent_response_contains(&output, "ai trends", false).is_ok());

        let err = assert_agent_response_contains(&output, "ai trends", true).unwrap_err();
        assert!(matches!(
            err,
            TestingError::Assertion(AssertionError::ContentMismatch(_))
        ));
        assert!(err.to_string().contains("'ai trends'"));
    }

    #[test]
    fn test_empty_expected_always_matches() {
        assert!(assert_agent_response_contains("", "", true).is_ok());
    }

    #[test]
    fn test_output_matches_substring_and_regex() {
        let output = CrewOutput::new("Revenue: $1,234 (Q3)");
        assert!(assert_crew_output_matches(&output, "(Q3)", false).is_ok());
        assert!(assert_crew_output_matches(&output, r"\$[\d,]+", true).is_ok());

        let err = assert_crew_output_matches(&output, r"^\d+$", true).unwrap_err();
        assert!(matches!(
            err,
            TestingError::Assertion(AssertionError::PatternMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_regex_is_not_an_assertion() {
        let err = assert_crew_output_matches("anything", "([unclosed", true).unwrap_err();
        assert!(matches!(err, TestingError::InvalidPattern { .. }));
        assert!(!err.is_assertion());
    }
}
