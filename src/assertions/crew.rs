use crate::error::{AssertionError, Result};
use crate::fixtures::{CrewOutput, CrewStatus};
use crate::testing::MockAgent;
use std::collections::BTreeSet;

/// 断言 Crew 执行成功：有输出且没有任何任务报错
pub fn assert_crew_completed_successfully(output: &CrewOutput) -> Result<()> {
    match output.status() {
        CrewStatus::Success => Ok(()),
        CrewStatus::Empty => Err(AssertionError::CrewExecutionFailed(
            "Crew execution produced no output".to_string(),
        )
        .into()),
        CrewStatus::Failed(error) => Err(AssertionError::CrewExecutionFailed(format!(
            "Crew execution failed with task error: {}",
            error
        ))
        .into()),
    }
}

/// 断言 Agent 调用过指定工具
pub fn assert_agent_called_tool(agent: &MockAgent, tool: &str) -> Result<()> {
    let used_tool = agent
        .tools()
        .iter()
        .any(|t| t.name() == tool && t.was_called());
    if agent.called_tool(tool) || used_tool {
        return Ok(());
    }
    Err(AssertionError::ToolNotCalled(format!(
        "Agent '{}' did not call expected tool '{}'",
        agent.role(),
        tool
    ))
    .into())
}

/// 断言任务按预期顺序执行
///
/// 第 i 个任务输出的描述必须包含 `expected[i]`，且数量一致。
pub fn assert_task_sequence(output: &CrewOutput, expected: &[&str]) -> Result<()> {
    let actual: Vec<&str> = output
        .tasks_output
        .iter()
        .map(|t| t.description.as_str())
        .collect();

    let in_order = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| a.contains(e));
    if in_order {
        return Ok(());
    }
    Err(AssertionError::TaskSequenceMismatch(format!(
        "Tasks were not executed in the expected sequence. Expected: {:?}, actual: {:?}",
        expected, actual
    ))
    .into())
}

/// 断言至少 `min_agents` 个不同的 Agent 成功产出了任务结果
pub fn assert_agent_collaboration(output: &CrewOutput, min_agents: usize) -> Result<()> {
    let participants: BTreeSet<&str> = output
        .tasks_output
        .iter()
        .filter(|t| t.is_success())
        .map(|t| t.agent.as_str())
        .collect();

    if participants.len() >= min_agents {
        return Ok(());
    }
    Err(AssertionError::InsufficientCollaboration(format!(
        "Expected at least {} collaborating agents, found {}: {:?}",
        min_agents,
        participants.len(),
        participants
    ))
    .into())
}
