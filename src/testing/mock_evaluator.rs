//! Mock 评估器，用于在不调用评审模型的情况下测试质量 / 幻觉断言。
//!
//! # 示例
//!
//! ```rust
//! use crew_testing::evaluator::Evaluator;
//! use crew_testing::fixtures::TaskSpec;
//! use crew_testing::testing::MockEvaluator;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let evaluator = MockEvaluator::new().with_score(8.5, "well structured");
//!
//! let task = TaskSpec::new("Summarize AI trends");
//! let score = evaluator.evaluate_quality(&task, "AI is growing").await.unwrap();
//! assert_eq!(score.score, Some(8.5));
//! assert_eq!(evaluator.call_count(), 1);
//! # }
//! ```

use super::lock;
use crate::error::{EvaluatorError, Result, TestingError};
use crate::evaluator::{EvaluationScore, Evaluator, GroundingVerdict};
use crate::fixtures::TaskSpec;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 评估调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationCall {
    Quality { task: String, output: String },
    Grounding { output: String, references: Vec<String> },
}

/// 可脚本化的 Mock 评估器。
///
/// 质量评分与事实检查各有一个响应队列，按顺序消费；
/// 队列耗尽后返回 [`EvaluatorError::NoResponse`]。
#[derive(Clone, Default)]
pub struct MockEvaluator {
    scores: Arc<Mutex<VecDeque<Result<EvaluationScore>>>>,
    verdicts: Arc<Mutex<VecDeque<Result<GroundingVerdict>>>>,
    calls: Arc<Mutex<Vec<EvaluationCall>>>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条质量评分
    pub fn with_score(self, score: f64, feedback: impl Into<String>) -> Self {
        lock(&self.scores).push_back(Ok(EvaluationScore::new(score, feedback)));
        self
    }

    /// 追加一条无分数的评估结果
    pub fn with_unscored(self, feedback: impl Into<String>) -> Self {
        lock(&self.scores).push_back(Ok(EvaluationScore::unscored(feedback)));
        self
    }

    /// 追加一条事实检查结论
    pub fn with_verdict(self, verdict: GroundingVerdict) -> Self {
        lock(&self.verdicts).push_back(Ok(verdict));
        self
    }

    /// 追加一次评估服务不可用（质量评分队列）
    pub fn with_unavailable(self, msg: impl Into<String>) -> Self {
        lock(&self.scores).push_back(Err(EvaluatorError::Unavailable(msg.into()).into()));
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<EvaluationCall> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<EvaluationCall> {
        lock(&self.calls).last().cloned()
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }
}

fn no_response() -> TestingError {
    EvaluatorError::NoResponse.into()
}

#[async_trait]
impl Evaluator for MockEvaluator {
    async fn evaluate_quality(&self, task: &TaskSpec, output: &str) -> Result<EvaluationScore> {
        lock(&self.calls).push(EvaluationCall::Quality {
            task: task.description.clone(),
            output: output.to_string(),
        });
        lock(&self.scores).pop_front().unwrap_or_else(|| Err(no_response()))
    }

    async fn check_grounding(
        &self,
        output: &str,
        references: &[String],
    ) -> Result<GroundingVerdict> {
        lock(&self.calls).push(EvaluationCall::Grounding {
            output: output.to_string(),
            references: references.to_vec(),
        });
        lock(&self.verdicts).pop_front().unwrap_or_else(|| Err(no_response()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scores_consumed_in_order() {
        let evaluator = MockEvaluator::new()
            .with_score(9.0, "great")
            .with_unscored("cannot judge")
            .with_unavailable("judge offline");
        let task = TaskSpec::new("Write a poem");

        let first = evaluator.evaluate_quality(&task, "roses").await.unwrap();
        assert_eq!(first.score, Some(9.0));
        let second = evaluator.evaluate_quality(&task, "violets").await.unwrap();
        assert_eq!(second.score, None);

        let err = evaluator.evaluate_quality(&task, "x").await.unwrap_err();
        assert!(matches!(
            err,
            TestingError::Evaluator(EvaluatorError::Unavailable(_))
        ));
        let err = evaluator.evaluate_quality(&task, "y").await.unwrap_err();
        assert!(matches!(err, TestingError::Evaluator(EvaluatorError::NoResponse)));

        assert_eq!(evaluator.call_count(), 4);
        assert_eq!(
            evaluator.calls()[0],
            EvaluationCall::Quality {
                task: "Write a poem".to_string(),
                output: "roses".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_grounding_calls_recorded() {
        let evaluator = MockEvaluator::new().with_verdict(GroundingVerdict::grounded());
        let refs = vec!["source".to_string()];

        assert!(evaluator.check_grounding("claim", &refs).await.unwrap().grounded);
        assert_eq!(
            evaluator.last_call(),
            Some(EvaluationCall::Grounding {
                output: "claim".to_string(),
                references: refs
            })
        );

        evaluator.reset_calls();
        assert_eq!(evaluator.call_count(), 0);
    }
}
