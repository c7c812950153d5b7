//! 多 Agent（Crew）测试夹具

use super::descriptors::{AgentSpec, CrewExecutor, CrewOutput, Process, TaskOutput, TaskSpec, TestCrew};
use super::{Fixture, TestKind};
use crate::error::{FixtureError, Result};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info};

/// Crew 执行的性能指标
#[derive(Debug, Clone, PartialEq)]
pub struct CrewPerformance {
    pub execution_time: Duration,
    /// 夹具中创建的任务总数
    pub total_tasks: usize,
    /// 无错误完成的任务输出数
    pub successful_tasks: usize,
    /// 每个 Agent 角色产出的任务数
    pub agent_utilization: BTreeMap<String, usize>,
    /// 实际产出结果的 Agent 占 Crew 全部 Agent 的比例，范围 0.0 ~ 1.0
    pub collaboration_score: f64,
}

/// Crew 测试夹具
#[derive(Debug, Default)]
pub struct CrewTestCase {
    crew: Option<TestCrew>,
    test_agents: Vec<AgentSpec>,
    test_tasks: Vec<TaskSpec>,
    crew_outputs: Vec<CrewOutput>,
}

impl CrewTestCase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_test_agent(&mut self, role: &str, goal: &str, backstory: &str) -> AgentSpec {
        self.push_agent(AgentSpec::new(role, goal, backstory))
    }

    /// 添加测试任务；未指定 Agent 时分配给第一个已添加的 Agent
    pub fn add_test_task(
        &mut self,
        description: &str,
        expected_output: Option<&str>,
        agent: Option<&AgentSpec>,
    ) -> TaskSpec {
        let mut task = TaskSpec::new(description);
        task.expected_output = expected_output.map(str::to_string);
        task.agent = agent.or(self.test_agents.first()).cloned();
        self.push_task(task)
    }

    /// 创建 Crew
    ///
    /// 显式列表为空时使用已累积的 Agent / 任务；两者都为空则报错。
    pub fn create_test_crew(
        &mut self,
        process: Process,
        agents: Vec<AgentSpec>,
        tasks: Vec<TaskSpec>,
    ) -> Result<TestCrew> {
        let agents = if agents.is_empty() {
            self.test_agents.clone()
        } else {
            agents
        };
        let tasks = if tasks.is_empty() {
            self.test_tasks.clone()
        } else {
            tasks
        };

        if agents.is_empty() {
            return Err(FixtureError::NoAgents.into());
        }
        if tasks.is_empty() {
            return Err(FixtureError::NoTasks.into());
        }

        debug!(
            agents = agents.len(),
            tasks = tasks.len(),
            %process,
            "创建测试 Crew"
        );
        let crew = TestCrew::new(agents, tasks, process);
        self.crew = Some(crew.clone());
        Ok(crew)
    }

    /// 批量创建协作场景：未指定 Agent 的任务按轮询方式分配
    pub fn create_collaborative_scenario(
        &mut self,
        scenario_name: &str,
        agent_configs: Vec<AgentSpec>,
        task_configs: Vec<TaskSpec>,
    ) -> (Vec<AgentSpec>, Vec<TaskSpec>) {
        let agents: Vec<AgentSpec> = agent_configs
            .into_iter()
            .map(|agent| self.push_agent(agent))
            .collect();

        let tasks = task_configs
            .into_iter()
            .enumerate()
            .map(|(i, mut task)| {
                if task.agent.is_none() && !agents.is_empty() {
                    task.agent = Some(agents[i % agents.len()].clone());
                }
                self.push_task(task)
            })
            .collect::<Vec<_>>();

        info!(
            scenario = scenario_name,
            agents = agents.len(),
            tasks = tasks.len(),
            "协作场景已创建"
        );
        (agents, tasks)
    }

    /// 通过执行器启动当前 Crew 并记录输出
    pub async fn execute_crew(
        &mut self,
        executor: &mut dyn CrewExecutor,
        inputs: &HashMap<String, String>,
    ) -> Result<CrewOutput> {
        let crew = self.crew.as_ref().ok_or(FixtureError::NoCrew)?;
        let output = executor.kickoff(crew, inputs).await?;
        self.crew_outputs.push(output.clone());
        Ok(output)
    }

    pub fn crew(&self) -> Option<&TestCrew> {
        self.crew.as_ref()
    }

    pub fn test_agents(&self) -> &[AgentSpec] {
        &self.test_agents
    }

    pub fn test_tasks(&self) -> &[TaskSpec] {
        &self.test_tasks
    }

    pub fn crew_outputs(&self) -> &[CrewOutput] {
        &self.crew_outputs
    }

    pub fn last_crew_output(&self) -> Option<&CrewOutput> {
        self.crew_outputs.last()
    }

    /// 指定输出（缺省为最近一次输出）中的各任务结果
    pub fn crew_task_outputs<'a>(&'a self, output: Option<&'a CrewOutput>) -> &'a [TaskOutput] {
        output
            .or(self.last_crew_output())
            .map(|o| o.tasks_output.as_slice())
            .unwrap_or_default()
    }

    pub fn measure_crew_performance(&self, output: &CrewOutput) -> CrewPerformance {
        let mut agent_utilization = BTreeMap::new();
        for task in &output.tasks_output {
            *agent_utilization.entry(task.agent.clone()).or_insert(0) += 1;
        }

        let successful_tasks = output.tasks_output.iter().filter(|t| t.is_success()).count();

        let crew_size = self
            .crew
            .as_ref()
            .map(|c| c.agents().len())
            .unwrap_or(self.test_agents.len());
        let collaboration_score = if crew_size == 0 {
            0.0
        } else {
            let active = output
                .tasks_output
                .iter()
                .filter(|t| t.is_success())
                .map(|t| t.agent.as_str())
                .collect::<std::collections::BTreeSet<_>>()
                .len();
            (active as f64 / crew_size as f64).min(1.0)
        };

        CrewPerformance {
            execution_time: output.duration.unwrap_or_default(),
            total_tasks: self.test_tasks.len(),
            successful_tasks,
            agent_utilization,
            collaboration_score,
        }
    }

    fn push_agent(&mut self, agent: AgentSpec) -> AgentSpec {
        self.test_agents.push(agent.clone());
        agent
    }

    fn push_task(&mut self, task: TaskSpec) -> TaskSpec {
        self.test_tasks.push(task.clone());
        task
    }
}

impl Fixture for CrewTestCase {
    const KIND: TestKind = TestKind::Crew;

    fn tear_down(&mut self) {
        self.crew = None;
        self.test_agents.clear();
        self.test_tasks.clear();
        self.crew_outputs.clear();
    }
}
