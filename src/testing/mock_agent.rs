//! Mock Agent，实现 [`AgentExecutor`]，用于在不发起真实模型调用的情况下测试 Agent / Crew 行为。
//!
//! 在测试中我们通常希望：
//! - 控制 Agent 每次返回的内容
//! - 验证 Agent 被调用了几次，以及每次收到什么输入
//! - 检查 Agent 调用了哪些工具
//!
//! # 示例
//!
//! ```rust
//! use crew_testing::testing::MockAgent;
//!
//! let agent = MockAgent::new("Researcher")
//!     .with_response("AI trends in 2024")
//!     .with_response("More findings");
//!
//! assert_eq!(agent.respond("research AI").unwrap(), "AI trends in 2024");
//! assert_eq!(agent.respond("dig deeper").unwrap(), "More findings");
//! assert!(agent.respond("again").is_err()); // 默认策略：用尽即报错
//! assert_eq!(agent.call_count(), 3);
//! ```

use super::lock;
use super::mock_tool::MockTool;
use crate::error::{MockError, Result, TestingError};
use crate::fixtures::{AgentExecutor, AgentSpec, TaskOutput, TaskSpec};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 预设响应用尽后的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsePolicy {
    /// 返回 [`MockError::ExhaustedResponses`]
    #[default]
    Exhaust,
    /// 从头循环
    Cycle,
    /// 一直重复最后一条
    RepeatLast,
}

#[derive(Debug, Clone)]
enum ScriptedResponse {
    Reply(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct ResponseScript {
    responses: Vec<ScriptedResponse>,
    cursor: usize,
}

impl ResponseScript {
    fn next(&mut self, policy: ResponsePolicy) -> Option<ScriptedResponse> {
        let len = self.responses.len();
        if len == 0 {
            return None;
        }
        let index = if self.cursor < len {
            self.cursor
        } else {
            match policy {
                ResponsePolicy::Exhaust => return None,
                ResponsePolicy::Cycle => self.cursor % len,
                ResponsePolicy::RepeatLast => len - 1,
            }
        };
        self.cursor += 1;
        Some(self.responses[index].clone())
    }

    fn remaining(&self) -> usize {
        self.responses.len().saturating_sub(self.cursor)
    }
}

/// 一次任务执行记录
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    pub task: String,
    pub response: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// 一次工具调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub tool: String,
    pub query: String,
    pub result: String,
}

/// 可脚本化的 Mock Agent。
///
/// 按顺序返回预设响应，用尽后的行为由 [`ResponsePolicy`] 决定。
/// 每次调用的输入在选择响应之前写入调用日志。克隆体共享同一份状态。
#[derive(Clone)]
pub struct MockAgent {
    role: String,
    goal: String,
    backstory: String,
    policy: ResponsePolicy,
    tools: Vec<MockTool>,
    script: Arc<Mutex<ResponseScript>>,
    calls: Arc<Mutex<Vec<String>>>,
    history: Arc<Mutex<Vec<ExecutionRecord>>>,
    tool_calls: Arc<Mutex<Vec<ToolCall>>>,
}

impl MockAgent {
    pub fn new(role: impl Into<String>) -> Self {
        let defaults = AgentSpec::default();
        Self {
            role: role.into(),
            goal: defaults.goal,
            backstory: defaults.backstory,
            policy: ResponsePolicy::default(),
            tools: Vec::new(),
            script: Arc::new(Mutex::new(ResponseScript::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
            history: Arc::new(Mutex::new(Vec::new())),
            tool_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// 追加一条预设响应
    pub fn with_response(self, text: impl Into<String>) -> Self {
        lock(&self.script)
            .responses
            .push(ScriptedResponse::Reply(text.into()));
        self
    }

    /// 批量追加多条预设响应
    pub fn with_responses(self, texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        {
            let mut script = lock(&self.script);
            for t in texts {
                script.responses.push(ScriptedResponse::Reply(t.into()));
            }
        }
        self
    }

    /// 追加一条失败响应（用于测试 Crew 的容错路径）
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.script)
            .responses
            .push(ScriptedResponse::Failure(message.into()));
        self
    }

    pub fn with_policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tools(mut self, tools: Vec<MockTool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn tools(&self) -> &[MockTool] {
        &self.tools
    }

    /// 转换为描述对象
    pub fn spec(&self) -> AgentSpec {
        AgentSpec::new(&self.role, &self.goal, &self.backstory)
            .with_tools(self.tools.iter().map(MockTool::spec).collect())
    }

    /// 返回下一条预设响应
    pub fn respond(&self, input: &str) -> Result<String> {
        lock(&self.calls).push(input.to_string());

        let mut script = lock(&self.script);
        match script.next(self.policy) {
            Some(ScriptedResponse::Reply(text)) => Ok(text),
            Some(ScriptedResponse::Failure(message)) => Err(MockError::ScriptedFailure {
                agent: self.role.clone(),
                message,
            }
            .into()),
            None => Err(MockError::ExhaustedResponses {
                agent: self.role.clone(),
                provided: script.responses.len(),
            }
            .into()),
        }
    }

    /// 调用 Agent 持有的工具并记录
    pub fn call_tool(&self, name: &str, query: &str) -> Result<String> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| MockError::UnknownTool {
                agent: self.role.clone(),
                tool: name.to_string(),
            })?;
        let result = tool.run(query);
        self.simulate_tool_call(name, query, &result);
        Ok(result)
    }

    /// 不经过工具直接记录一次工具调用
    pub fn simulate_tool_call(&self, tool: &str, query: &str, result: &str) {
        debug!(agent = %self.role, tool, "记录工具调用");
        lock(&self.tool_calls).push(ToolCall {
            tool: tool.to_string(),
            query: query.to_string(),
            result: result.to_string(),
        });
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        lock(&self.tool_calls).clone()
    }

    pub fn called_tool(&self, name: &str) -> bool {
        lock(&self.tool_calls).iter().any(|c| c.tool == name)
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// 所有历史输入（按时序排列）
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn last_input(&self) -> Option<String> {
        lock(&self.calls).last().cloned()
    }

    pub fn execution_history(&self) -> Vec<ExecutionRecord> {
        lock(&self.history).clone()
    }

    /// 尚未消费的预设响应数量
    pub fn remaining(&self) -> usize {
        lock(&self.script).remaining()
    }

    /// 清空调用日志、执行历史与工具调用记录（响应脚本不受影响）
    pub fn reset_history(&self) {
        lock(&self.calls).clear();
        lock(&self.history).clear();
        lock(&self.tool_calls).clear();
    }

    fn record(&self, task: &str, response: &str, success: bool) {
        lock(&self.history).push(ExecutionRecord {
            task: task.to_string(),
            response: response.to_string(),
            success,
            timestamp: Utc::now(),
        });
    }
}

#[async_trait]
impl AgentExecutor for MockAgent {
    async fn execute_task(&mut self, task: &TaskSpec) -> Result<TaskOutput> {
        match self.respond(&task.description) {
            Ok(response) => {
                self.record(&task.description, &response, true);
                Ok(TaskOutput::new(&task.description, response, &self.role))
            }
            Err(TestingError::Mock(MockError::ScriptedFailure { message, .. })) => {
                self.record(&task.description, &message, false);
                Ok(TaskOutput::failed(&task.description, &self.role, message))
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for MockAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAgent")
            .field("role", &self.role)
            .field("policy", &self.policy)
            .field("call_count", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaust_policy_fails_after_script() {
        let agent = MockAgent::new("Writer").with_responses(["one", "two"]);
        assert_eq!(agent.respond("a").unwrap(), "one");
        assert_eq!(agent.respond("b").unwrap(), "two");
        assert_eq!(agent.remaining(), 0);

        let err = agent.respond("c").unwrap_err();
        assert!(matches!(
            err,
            TestingError::Mock(MockError::ExhaustedResponses { provided: 2, .. })
        ));
        // 输入在选择响应之前被记录
        assert_eq!(agent.calls(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_and_repeat_last() {
        let cycling = MockAgent::new("A")
            .with_responses(["x", "y"])
            .with_policy(ResponsePolicy::Cycle);
        let replies: Vec<_> = (0..5).map(|_| cycling.respond("q").unwrap()).collect();
        assert_eq!(replies, vec!["x", "y", "x", "y", "x"]);

        let repeating = MockAgent::new("B")
            .with_responses(["x", "y"])
            .with_policy(ResponsePolicy::RepeatLast);
        let replies: Vec<_> = (0..4).map(|_| repeating.respond("q").unwrap()).collect();
        assert_eq!(replies, vec!["x", "y", "y", "y"]);
    }

    #[test]
    fn test_empty_script_exhausts_under_any_policy() {
        let agent = MockAgent::new("Empty").with_policy(ResponsePolicy::Cycle);
        assert!(agent.respond("hi").is_err());
        assert_eq!(agent.last_input().as_deref(), Some("hi"));
    }

    #[test]
    fn test_tool_calls() {
        let agent = MockAgent::new("Researcher")
            .with_tools(vec![MockTool::new("search", "Search the web", "results")]);

        assert_eq!(agent.call_tool("search", "AI").unwrap(), "results");
        assert!(agent.called_tool("search"));
        assert!(agent.tools()[0].was_called_with("AI"));

        let err = agent.call_tool("calculator", "1+1").unwrap_err();
        assert!(matches!(err, TestingError::Mock(MockError::UnknownTool { .. })));

        agent.simulate_tool_call("calculator", "1+1", "2");
        assert_eq!(agent.tool_calls().len(), 2);
        assert!(agent.spec().has_tool("search"));
    }

    #[tokio::test]
    async fn test_execute_task_records_history() {
        let mut agent = MockAgent::new("Analyst")
            .with_response("Revenue grew 12%")
            .with_failure("Invalid data format");
        let task = TaskSpec::new("Analyze sales");

        let ok = agent.execute_task(&task).await.unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.agent, "Analyst");

        let failed = agent.execute_task(&task).await.unwrap();
        assert_eq!(failed.error.as_deref(), Some("Invalid data format"));

        let history = agent.execution_history();
        assert_eq!(history.len(), 2);
        assert!(history[0].success);
        assert!(!history[1].success);

        assert!(agent.execute_task(&task).await.is_err());

        agent.reset_history();
        assert_eq!(agent.call_count(), 0);
        assert!(agent.execution_history().is_empty());
    }
}
