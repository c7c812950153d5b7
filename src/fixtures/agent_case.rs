//! 单 Agent 测试夹具

use super::descriptors::{AgentExecutor, AgentSpec, TaskOutput, TaskSpec, ToolSpec};
use super::{Fixture, TestKind};
use crate::assertions;
use crate::error::{FixtureError, Result};
use crate::evaluator::{EvaluationScore, Evaluator};
use std::sync::Arc;
use tracing::debug;

/// 单 Agent 测试夹具
///
/// 通过 [`create_test_agent`](AgentTestCase::create_test_agent) /
/// [`create_test_task`](AgentTestCase::create_test_task) 构造描述对象，
/// 并记录经 [`AgentExecutor`] 执行得到的输出。每个测试结束后状态被清空。
#[derive(Default)]
pub struct AgentTestCase {
    agent: Option<AgentSpec>,
    test_tasks: Vec<TaskSpec>,
    agent_outputs: Vec<TaskOutput>,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl AgentTestCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注入质量评估器，供 [`assert_agent_response_quality`](Self::assert_agent_response_quality) 使用
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn set_evaluator(&mut self, evaluator: Arc<dyn Evaluator>) {
        self.evaluator = Some(evaluator);
    }

    /// 创建测试 Agent 并设为当前 Agent
    pub fn create_test_agent(
        &mut self,
        role: &str,
        goal: &str,
        backstory: &str,
        tools: Vec<ToolSpec>,
    ) -> AgentSpec {
        let agent = AgentSpec::new(role, goal, backstory).with_tools(tools);
        debug!(role = %agent.role, "创建测试 Agent");
        self.agent = Some(agent.clone());
        agent
    }

    /// 创建测试任务；未指定 Agent 时使用当前 Agent
    pub fn create_test_task(
        &mut self,
        description: &str,
        expected_output: Option<&str>,
        agent: Option<&AgentSpec>,
    ) -> Result<TaskSpec> {
        let task_agent = agent
            .or(self.agent.as_ref())
            .cloned()
            .ok_or(FixtureError::NoAgent)?;

        let mut task = TaskSpec::new(description).assigned_to(task_agent);
        task.expected_output = expected_output.map(str::to_string);
        self.test_tasks.push(task.clone());
        Ok(task)
    }

    /// 通过执行器运行任务并记录输出
    pub async fn execute_agent_task(
        &mut self,
        task: &TaskSpec,
        executor: &mut dyn AgentExecutor,
    ) -> Result<TaskOutput> {
        let output = executor.execute_task(task).await?;
        self.agent_outputs.push(output.clone());
        Ok(output)
    }

    pub fn agent(&self) -> Option<&AgentSpec> {
        self.agent.as_ref()
    }

    pub fn test_tasks(&self) -> &[TaskSpec] {
        &self.test_tasks
    }

    pub fn agent_outputs(&self) -> &[TaskOutput] {
        &self.agent_outputs
    }

    pub fn last_agent_output(&self) -> Option<&TaskOutput> {
        self.agent_outputs.last()
    }

    /// 所有包含指定内容（不区分大小写）的输出
    pub fn agent_outputs_containing(&self, content: &str) -> Vec<&TaskOutput> {
        let needle = content.to_lowercase();
        self.agent_outputs
            .iter()
            .filter(|o| o.raw.to_lowercase().contains(&needle))
            .collect()
    }

    /// 使用注入的评估器检查输出质量
    pub async fn assert_agent_response_quality<O>(
        &self,
        output: &O,
        task: &TaskSpec,
        min_score: f64,
    ) -> Result<EvaluationScore>
    where
        O: AsRef<str> + ?Sized,
    {
        let evaluator = self.evaluator.as_ref().ok_or(FixtureError::NoEvaluator)?;
        assertions::assert_agent_response_quality(evaluator.as_ref(), output, task, min_score).await
    }
}

impl Fixture for AgentTestCase {
    const KIND: TestKind = TestKind::Agent;

    fn tear_down(&mut self) {
        self.agent = None;
        self.test_tasks.clear();
        self.agent_outputs.clear();
    }
}
