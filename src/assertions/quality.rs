use crate::error::{AssertionError, Result};
use crate::evaluator::{EvaluationScore, Evaluator};
use crate::fixtures::TaskSpec;
use tracing::debug;

/// 断言输出质量不低于 `min_score`（0 ~ 10）
///
/// 评分委托给 `evaluator`；评估器未给出分数时视为通过。返回评估结果供进一步检查。
pub async fn assert_agent_response_quality<E, O>(
    evaluator: &E,
    output: &O,
    task: &TaskSpec,
    min_score: f64,
) -> Result<EvaluationScore>
where
    E: Evaluator + ?Sized,
    O: AsRef<str> + ?Sized,
{
    let score = evaluator.evaluate_quality(task, output.as_ref()).await?;
    debug!(score = ?score.score, min_score, "质量断言");

    if let Some(value) = score.score.filter(|s| *s < min_score) {
        return Err(AssertionError::QualityBelowThreshold(format!(
            "Agent response quality below threshold. Score: {:.1}/{}. Feedback: {}",
            value, min_score, score.feedback
        ))
        .into());
    }
    Ok(score)
}

/// 断言输出中的事实都能由参考资料支撑
pub async fn assert_no_hallucination<E, O>(
    evaluator: &E,
    output: &O,
    references: &[String],
) -> Result<()>
where
    E: Evaluator + ?Sized,
    O: AsRef<str> + ?Sized,
{
    let verdict = evaluator.check_grounding(output.as_ref(), references).await?;
    if verdict.grounded {
        return Ok(());
    }

    let mut msg = "Agent output contains claims not supported by the references".to_string();
    if !verdict.unsupported_claims.is_empty() {
        msg.push_str(&format!(": {}", verdict.unsupported_claims.join("; ")));
    }
    if !verdict.feedback.is_empty() {
        msg.push_str(&format!(" ({})", verdict.feedback));
    }
    Err(AssertionError::HallucinationDetected(msg).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvaluatorError, TestingError};
    use crate::evaluator::GroundingVerdict;
    use crate::testing::MockEvaluator;

    #[tokio::test]
    async fn test_quality_threshold() {
        let evaluator = MockEvaluator::new()
            .with_score(7.0, "solid")
            .with_score(6.9, "vague");
        let task = TaskSpec::new("Recommend AI ethics practices");

        let score = assert_agent_response_quality(&evaluator, "answer", &task, 7.0)
            .await
            .unwrap();
        assert_eq!(score.feedback, "solid");

        let err = assert_agent_response_quality(&evaluator, "answer", &task, 7.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestingError::Assertion(AssertionError::QualityBelowThreshold(_))
        ));
        assert!(err.to_string().contains("Score: 6.9/7"));
    }

    #[tokio::test]
    async fn test_absent_score_passes() {
        let evaluator = MockEvaluator::new().with_unscored("no rubric");
        let task = TaskSpec::new("Anything");
        let score = assert_agent_response_quality(&evaluator, "x", &task, 9.0)
            .await
            .unwrap();
        assert!(score.score.is_none());
    }

    #[tokio::test]
    async fn test_evaluator_failure_is_not_an_assertion() {
        let evaluator = MockEvaluator::new().with_unavailable("timeout");
        let err = assert_agent_response_quality(&evaluator, "x", &TaskSpec::new("t"), 5.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestingError::Evaluator(EvaluatorError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_hallucination_verdicts() {
        let evaluator = MockEvaluator::new()
            .with_verdict(GroundingVerdict::grounded())
            .with_verdict(GroundingVerdict::ungrounded(
                vec!["AI cured cancer".to_string()],
                "not in sources",
            ));
        let refs = vec!["AI adoption grew".to_string()];

        assert!(assert_no_hallucination(&evaluator, "AI adoption grew", &refs).await.is_ok());

        let err = assert_no_hallucination(&evaluator, "AI cured cancer", &refs)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestingError::Assertion(AssertionError::HallucinationDetected(_))
        ));
        assert!(err.to_string().contains("AI cured cancer"));
    }
}
