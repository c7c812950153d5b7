//! Agent / Task / Crew 的内存描述对象
//!
//! 这些类型只是数据，不会发起任何模型调用；真实执行由外部编排引擎负责，
//! 通过 [`AgentExecutor`] / [`CrewExecutor`] 接入。

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// 工具描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Agent 描述：角色、目标、背景与可用工具
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolSpec>,
    pub verbose: bool,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self::new(
            "Test Agent",
            "Perform testing tasks effectively",
            "A specialized agent created for testing purposes",
        )
    }
}

impl AgentSpec {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
            verbose: false,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }
}

/// 任务描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: Option<String>,
    /// 指派的 Agent（为空时由 Crew 决定）
    pub agent: Option<AgentSpec>,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: None,
            agent: None,
        }
    }

    pub fn expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    pub fn assigned_to(mut self, agent: AgentSpec) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn agent_role(&self) -> Option<&str> {
        self.agent.as_ref().map(|a| a.role.as_str())
    }
}

/// Crew 的执行流程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// 按任务顺序依次执行
    #[default]
    Sequential,
    /// 任务之间无先后依赖
    Parallel,
    /// 由管理者 Agent 分派任务
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Process::Sequential => write!(f, "sequential"),
            Process::Parallel => write!(f, "parallel"),
            Process::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// 待测试的 Crew 快照，创建后不可修改
#[derive(Debug, Clone, PartialEq)]
pub struct TestCrew {
    agents: Vec<AgentSpec>,
    tasks: Vec<TaskSpec>,
    process: Process,
    verbose: bool,
}

impl TestCrew {
    pub(crate) fn new(agents: Vec<AgentSpec>, tasks: Vec<TaskSpec>, process: Process) -> Self {
        Self {
            agents,
            tasks,
            process,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// 单个任务的执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub raw: String,
    /// 产生该输出的 Agent 角色
    pub agent: String,
    pub error: Option<String>,
}

impl TaskOutput {
    pub fn new(
        description: impl Into<String>,
        raw: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            raw: raw.into(),
            agent: agent.into(),
            error: None,
        }
    }

    pub fn failed(
        description: impl Into<String>,
        agent: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            raw: String::new(),
            agent: agent.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl AsRef<str> for TaskOutput {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Crew 执行状态
#[derive(Debug, Clone, PartialEq)]
pub enum CrewStatus {
    Success,
    /// 没有任何输出
    Empty,
    /// 至少一个任务失败，携带首个错误
    Failed(String),
}

/// Crew 的整体执行结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrewOutput {
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    /// 执行耗时（由执行器填写）
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl CrewOutput {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            tasks_output: Vec::new(),
            duration: None,
        }
    }

    pub fn with_task_outputs(mut self, outputs: Vec<TaskOutput>) -> Self {
        self.tasks_output = outputs;
        self
    }

    pub fn status(&self) -> CrewStatus {
        if let Some(err) = self.tasks_output.iter().find_map(|t| t.error.as_ref()) {
            return CrewStatus::Failed(err.clone());
        }
        if self.raw.trim().is_empty() && self.tasks_output.is_empty() {
            return CrewStatus::Empty;
        }
        CrewStatus::Success
    }
}

impl AsRef<str> for CrewOutput {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// 单 Agent 执行接口，由外部编排引擎或 [`MockAgent`](crate::testing::MockAgent) 实现
#[async_trait]
pub trait AgentExecutor: Send {
    async fn execute_task(&mut self, task: &TaskSpec) -> Result<TaskOutput>;
}

/// Crew 执行接口，由外部编排引擎或 [`MockCrew`](crate::testing::MockCrew) 实现
#[async_trait]
pub trait CrewExecutor: Send {
    async fn kickoff(
        &mut self,
        crew: &TestCrew,
        inputs: &HashMap<String, String>,
    ) -> Result<CrewOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crew_status() {
        assert_eq!(CrewOutput::default().status(), CrewStatus::Empty);
        assert_eq!(CrewOutput::new("done").status(), CrewStatus::Success);

        let failed = CrewOutput::new("partial").with_task_outputs(vec![
            TaskOutput::new("a", "ok", "researcher"),
            TaskOutput::failed("b", "writer", "Invalid data format"),
        ]);
        assert_eq!(
            failed.status(),
            CrewStatus::Failed("Invalid data format".to_string())
        );
    }

    #[test]
    fn test_task_output_as_ref() {
        let output = TaskOutput::new("desc", "raw text", "agent");
        let text: &str = output.as_ref();
        assert_eq!(text, "raw text");
    }

    #[test]
    fn test_process_serde() {
        let p: Process = serde_json::from_str("\"hierarchical\"").unwrap();
        assert_eq!(p, Process::Hierarchical);
        assert_eq!(Process::default().to_string(), "sequential");
    }
}
