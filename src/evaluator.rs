//! 输出质量评估接口
//!
//! 框架本身不做打分，只通过 [`Evaluator`] 委托给外部评估组件。
//! [`LlmJudgeEvaluator`] 把评估请求组装成提示词，交给任意 [`JudgeClient`]
//! （通常是一个语言模型客户端），再从回复中解析出 JSON 结论。

use crate::error::{EvaluatorError, Result};
use crate::fixtures::TaskSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 质量评分上限
pub const MAX_SCORE: f64 = 10.0;

/// 质量评估结果；`score` 为空表示评估器无法给出分数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: String,
}

impl EvaluationScore {
    pub fn new(score: f64, feedback: impl Into<String>) -> Self {
        Self {
            score: Some(score),
            feedback: feedback.into(),
        }
    }

    pub fn unscored(feedback: impl Into<String>) -> Self {
        Self {
            score: None,
            feedback: feedback.into(),
        }
    }
}

/// 事实一致性检查结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingVerdict {
    pub grounded: bool,
    #[serde(default)]
    pub unsupported_claims: Vec<String>,
    #[serde(default)]
    pub feedback: String,
}

impl GroundingVerdict {
    pub fn grounded() -> Self {
        Self {
            grounded: true,
            unsupported_claims: Vec::new(),
            feedback: String::new(),
        }
    }

    pub fn ungrounded(claims: Vec<String>, feedback: impl Into<String>) -> Self {
        Self {
            grounded: false,
            unsupported_claims: claims,
            feedback: feedback.into(),
        }
    }
}

/// 外部评估组件
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// 按任务描述与期望输出为实际输出打分（0 ~ 10）
    async fn evaluate_quality(&self, task: &TaskSpec, output: &str) -> Result<EvaluationScore>;

    /// 检查输出是否能由参考资料支撑
    async fn check_grounding(&self, output: &str, references: &[String])
    -> Result<GroundingVerdict>;
}

/// 评审模型的最小接口：输入提示词，返回文本回复
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// 基于评审模型的评估器
pub struct LlmJudgeEvaluator {
    client: Arc<dyn JudgeClient>,
}

impl LlmJudgeEvaluator {
    pub fn new(client: Arc<dyn JudgeClient>) -> Self {
        Self { client }
    }

    fn quality_prompt(task: &TaskSpec, output: &str) -> String {
        let expected = task
            .expected_output
            .as_deref()
            .unwrap_or("High quality response");
        format!(
            "You are evaluating the output of an AI agent.\n\
             Task: {}\n\
             Expected output: {}\n\
             Actual output:\n{}\n\n\
             Rate the actual output from 0 to 10 for how well it fulfils the task.\n\
             Reply with JSON only: {{\"score\": <number>, \"feedback\": \"<short explanation>\"}}",
            task.description, expected, output
        )
    }

    fn grounding_prompt(output: &str, references: &[String]) -> String {
        let sources = references
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {}", i + 1, r))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Check whether every factual claim in the output is supported by the sources.\n\
             Sources:\n{}\n\n\
             Output:\n{}\n\n\
             Reply with JSON only: {{\"grounded\": <bool>, \"unsupported_claims\": [<string>], \"feedback\": \"<short explanation>\"}}",
            sources, output
        )
    }
}

/// 从回复中取出 JSON 对象：整体可解析时直接使用，否则截取首个 `{` 到最后一个 `}`
fn extract_json(reply: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(reply.trim()) {
        return Ok(value);
    }
    let candidate = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => return Err(EvaluatorError::InvalidVerdict(reply.to_string()).into()),
    };
    serde_json::from_str(candidate)
        .map_err(|e| EvaluatorError::InvalidVerdict(format!("{}: {}", e, candidate)).into())
}

#[async_trait]
impl Evaluator for LlmJudgeEvaluator {
    async fn evaluate_quality(&self, task: &TaskSpec, output: &str) -> Result<EvaluationScore> {
        let reply = self
            .client
            .complete(&Self::quality_prompt(task, output))
            .await?;
        if reply.trim().is_empty() {
            return Err(EvaluatorError::NoResponse.into());
        }

        let mut verdict: EvaluationScore = serde_json::from_value(extract_json(&reply)?)
            .map_err(|e| EvaluatorError::InvalidVerdict(e.to_string()))?;
        verdict.score = match verdict.score {
            Some(s) if !s.is_finite() => {
                return Err(EvaluatorError::InvalidVerdict(format!("score {}", s)).into());
            }
            Some(s) => Some(s.clamp(0.0, MAX_SCORE)),
            None => None,
        };
        debug!(score = ?verdict.score, "质量评估完成");
        Ok(verdict)
    }

    async fn check_grounding(
        &self,
        output: &str,
        references: &[String],
    ) -> Result<GroundingVerdict> {
        let reply = self
            .client
            .complete(&Self::grounding_prompt(output, references))
            .await?;
        if reply.trim().is_empty() {
            return Err(EvaluatorError::NoResponse.into());
        }

        let verdict: GroundingVerdict = serde_json::from_value(extract_json(&reply)?)
            .map_err(|e| EvaluatorError::InvalidVerdict(e.to_string()))?;
        debug!(grounded = verdict.grounded, "事实一致性检查完成");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TestingError;
    use std::sync::Mutex;

    struct ScriptedJudge {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedJudge {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl JudgeClient for ScriptedJudge {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_quality_reply_in_prose() {
        let judge = ScriptedJudge::new(
            "Sure! Here is my verdict:\n{\"score\": 8.5, \"feedback\": \"thorough\"}\nThanks.",
        );
        let evaluator = LlmJudgeEvaluator::new(judge.clone());
        let task = TaskSpec::new("Summarize AI trends").expected_output("a summary");

        let score = evaluator.evaluate_quality(&task, "AI is growing").await.unwrap();
        assert_eq!(score, EvaluationScore::new(8.5, "thorough"));

        let prompt = judge.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Summarize AI trends"));
        assert!(prompt.contains("a summary"));
    }

    #[tokio::test]
    async fn test_quality_score_clamped() {
        let evaluator = LlmJudgeEvaluator::new(ScriptedJudge::new(r#"{"score": 42}"#));
        let score = evaluator
            .evaluate_quality(&TaskSpec::new("t"), "o")
            .await
            .unwrap();
        assert_eq!(score.score, Some(MAX_SCORE));
    }

    #[tokio::test]
    async fn test_invalid_and_empty_replies() {
        let evaluator = LlmJudgeEvaluator::new(ScriptedJudge::new("no json here"));
        let err = evaluator
            .evaluate_quality(&TaskSpec::new("t"), "o")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestingError::Evaluator(EvaluatorError::InvalidVerdict(_))
        ));

        let evaluator = LlmJudgeEvaluator::new(ScriptedJudge::new("   "));
        let err = evaluator.check_grounding("o", &[]).await.unwrap_err();
        assert!(matches!(err, TestingError::Evaluator(EvaluatorError::NoResponse)));
    }

    #[tokio::test]
    async fn test_grounding_verdict() {
        let judge = ScriptedJudge::new(
            r#"{"grounded": false, "unsupported_claims": ["AI cured cancer"], "feedback": "unsupported"}"#,
        );
        let evaluator = LlmJudgeEvaluator::new(judge.clone());
        let refs = vec!["AI adoption grew in 2024".to_string()];

        let verdict = evaluator
            .check_grounding("AI cured cancer", &refs)
            .await
            .unwrap();
        assert!(!verdict.grounded);
        assert_eq!(verdict.unsupported_claims, vec!["AI cured cancer"]);
        assert!(judge.prompts.lock().unwrap()[0].contains("[1] AI adoption grew in 2024"));
    }
}
