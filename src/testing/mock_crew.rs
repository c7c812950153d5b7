//! Mock Crew：按角色把 [`TestCrew`] 的任务分派给 [`MockAgent`]

use super::mock_agent::MockAgent;
use crate::error::{MockError, Result};
use crate::fixtures::{AgentExecutor, CrewExecutor, CrewOutput, TaskSpec, TestCrew};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// 用一组 [`MockAgent`] 实现 [`CrewExecutor`]。
///
/// 任务按顺序执行；每个任务交给角色相同的 Mock Agent，
/// 未指派 Agent 的任务交给 Crew 中的第一个 Agent。
/// 任务描述中的 `{key}` 占位符会被 kickoff 输入替换。
#[derive(Debug, Clone, Default)]
pub struct MockCrew {
    agents: Vec<MockAgent>,
}

impl MockCrew {
    pub fn new(agents: Vec<MockAgent>) -> Self {
        Self { agents }
    }

    pub fn agent(&self, role: &str) -> Option<&MockAgent> {
        self.agents.iter().find(|a| a.role() == role)
    }

    pub fn agents(&self) -> &[MockAgent] {
        &self.agents
    }

    fn agent_mut(&mut self, role: &str) -> Result<&mut MockAgent> {
        self.agents
            .iter_mut()
            .find(|a| a.role() == role)
            .ok_or_else(|| MockError::UnknownAgent(role.to_string()).into())
    }
}

/// 替换 `{key}` 占位符，未知占位符原样保留。
///
/// 模板只从左到右扫描一遍，替换进来的值不会再被展开。
pub(crate) fn interpolate(template: &str, inputs: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match inputs.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

#[async_trait]
impl CrewExecutor for MockCrew {
    async fn kickoff(
        &mut self,
        crew: &TestCrew,
        inputs: &HashMap<String, String>,
    ) -> Result<CrewOutput> {
        let started = Instant::now();
        let default_role = crew.agents().first().map(|a| a.role.clone());
        let mut outputs = Vec::with_capacity(crew.tasks().len());

        for task in crew.tasks() {
            let role = task
                .agent_role()
                .map(str::to_string)
                .or_else(|| default_role.clone())
                .ok_or_else(|| MockError::UnknownAgent("<unassigned>".to_string()))?;

            let mut resolved = TaskSpec::new(interpolate(&task.description, inputs));
            resolved.expected_output = task.expected_output.clone();
            resolved.agent = task.agent.clone();

            debug!(role = %role, task = %resolved.description, "分派任务");
            let agent = self.agent_mut(&role)?;
            outputs.push(agent.execute_task(&resolved).await?);
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        let mut output = CrewOutput::new(raw).with_task_outputs(outputs);
        output.duration = Some(started.elapsed());
        Ok(output)
    }
}
