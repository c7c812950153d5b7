//! 单 Agent 行为测试示例
//!
//! 使用 `crew-test -d demos` 运行；文件名（不含扩展名）即注册用的模块名。

use crew_testing::assertions::{
    OutputFormat, assert_agent_called_tool, assert_agent_response_contains, assert_output_format,
};
use crew_testing::error::{AssertionError, Result};
use crew_testing::fixtures::{AgentTestCase, TestCase, TestMethod};
use crew_testing::runner::TestRegistry;
use crew_testing::test_methods;
use crew_testing::testing::{MockAgent, MockEvaluator, MockTool};
use std::sync::Arc;

pub const MODULE: &str = "test_agent_behavior";

pub fn register(registry: &mut TestRegistry) {
    registry
        .register::<TestResearchAgent>(MODULE)
        .register::<TestWritingAgent>(MODULE);
}

const RESEARCH_ROLE: &str = "Senior Research Analyst";

const QUANTUM_RESPONSE: &str = "\
Quantum computing presents both opportunities and challenges for cybersecurity:

Impact on Encryption:
- Current RSA encryption vulnerable to quantum attacks via Shor's algorithm
- Timeline: 10-15 years for cryptographically relevant quantum computers

Risks:
1. Cryptographic obsolescence
2. Data harvesting for future decryption
3. Infrastructure vulnerabilities

Mitigation Strategies:
1. Post-quantum cryptography implementation
2. Hybrid security models
3. Quantum key distribution
";

const ETHICS_RESPONSE: &str = "\
Implementing AI Ethics in Organizations: A Practical Framework

1. Governance Structure
- Establish AI Ethics Committee with diverse expertise
- Define clear roles and responsibilities

2. Policy Development
- Draft comprehensive AI ethics policy
- Address bias, transparency, and accountability

3. Implementation Strategy
- Conduct ethics training for development teams
- Implement bias testing protocols
";

#[derive(Default)]
pub struct TestResearchAgent {
    base: AgentTestCase,
}

impl TestResearchAgent {
    async fn test_agent_provides_research_insights(&mut self) -> Result<()> {
        let task = self.base.create_test_task(
            "Research the latest trends in artificial intelligence",
            Some("A comprehensive analysis of current AI trends with key insights and supporting evidence"),
            None,
        )?;
        let mut agent = MockAgent::new(RESEARCH_ROLE).with_response(
            "AI trends in 2024 include: 1) Multimodal AI systems, 2) AI governance frameworks, 3) Edge AI deployment...",
        );

        let output = self.base.execute_agent_task(&task, &mut agent).await?;

        assert_agent_response_contains(&output, "AI trends", false)?;
        assert_agent_response_contains(&output, "2024", true)?;
        assert_output_format(&output, OutputFormat::Text)?;
        if agent.last_input().as_deref() != Some(task.description.as_str()) {
            return Err(AssertionError::Failed("agent did not receive the task description".to_string()).into());
        }
        Ok(())
    }

    async fn test_agent_handles_complex_queries(&mut self) -> Result<()> {
        let task = self.base.create_test_task(
            "Analyze the impact of quantum computing on cybersecurity, including potential risks and mitigation strategies",
            Some("Detailed analysis covering encryption impact, vulnerabilities, and defensive strategies"),
            None,
        )?;
        let mut agent = MockAgent::new(RESEARCH_ROLE).with_response(QUANTUM_RESPONSE);
        let output = self.base.execute_agent_task(&task, &mut agent).await?;

        for topic in ["encryption", "risks", "mitigation"] {
            assert_agent_response_contains(&output, topic, false)?;
        }
        assert_agent_response_contains(&output, "1.", true)?;
        assert_agent_response_contains(&output, "2.", true)
    }

    async fn test_agent_response_quality(&mut self) -> Result<()> {
        let task = self.base.create_test_task(
            "Provide recommendations for implementing AI ethics in organizations",
            Some("Practical, actionable recommendations for establishing AI ethics frameworks"),
            None,
        )?;
        let evaluator = MockEvaluator::new().with_score(8.5, "Structured and actionable");
        self.base.set_evaluator(Arc::new(evaluator.clone()));

        let score = self
            .base
            .assert_agent_response_quality(ETHICS_RESPONSE, &task, 8.0)
            .await?;
        if score.score != Some(8.5) || evaluator.call_count() != 1 {
            return Err(AssertionError::Failed(format!("unexpected evaluation: {:?}", score)).into());
        }
        Ok(())
    }

    async fn test_agent_tool_usage(&mut self) -> Result<()> {
        let search = MockTool::new(
            "search_tool",
            "Search recent publications",
            "Attention Is All You Need; Scaling Laws for Neural Language Models",
        );
        let agent_spec = self.base.create_test_agent(
            RESEARCH_ROLE,
            "Conduct thorough research and provide accurate insights",
            "You are an experienced research analyst.",
            vec![search.spec()],
        );
        let task = self.base.create_test_task(
            "Search for recent publications on machine learning",
            Some("List of recent ML publications with summaries"),
            Some(&agent_spec),
        )?;

        let mut agent = MockAgent::new(RESEARCH_ROLE)
            .with_tools(vec![search.clone()])
            .with_response("Recent ML publications: Scaling Laws for Neural Language Models");
        let found = agent.call_tool("search_tool", "machine learning 2024")?;
        let output = self.base.execute_agent_task(&task, &mut agent).await?;

        assert_agent_called_tool(&agent, "search_tool")?;
        assert_agent_response_contains(&found, "Scaling Laws", true)?;
        assert_agent_response_contains(&output, "publications", false)
    }
}

impl TestCase for TestResearchAgent {
    type Fixture = AgentTestCase;

    fn fixture(&mut self) -> &mut AgentTestCase {
        &mut self.base
    }

    fn set_up(&mut self) -> Result<()> {
        self.base.create_test_agent(
            RESEARCH_ROLE,
            "Conduct thorough research and provide accurate insights",
            "You are an experienced research analyst with expertise in gathering and analyzing information from various sources.",
            Vec::new(),
        );
        Ok(())
    }

    fn test_methods() -> Vec<TestMethod<Self>> {
        test_methods![
            test_agent_provides_research_insights,
            test_agent_handles_complex_queries,
            test_agent_response_quality,
            test_agent_tool_usage,
        ]
    }
}

const MARKDOWN_GUIDE: &str = "\
# Development Environment Setup Guide

## Prerequisites

Before starting, ensure you have:
- Rust toolchain installed
- Git configured

## Installation Steps

### 1. Clone the Repository

```bash
git clone https://github.com/example/project.git
cd project
```

### 2. Build

```bash
cargo build
```

## Next Steps

Refer to the [Usage Guide](usage.md) for detailed instructions.
";

const README: &str = "\
# Project Name

Brief description of the project and its purpose.

## Features

- Feature 1
- Feature 2

## Installation

Step-by-step installation instructions.

## Usage

Basic usage examples and API documentation.

## Contributing

Guidelines for contributing to the project.

## License

MIT License information.
";

#[derive(Default)]
pub struct TestWritingAgent {
    base: AgentTestCase,
    writer: Option<MockAgent>,
}

impl TestWritingAgent {
    fn writer(&mut self) -> Result<&mut MockAgent> {
        self.writer
            .as_mut()
            .ok_or_else(|| AssertionError::Failed("writer was not set up".to_string()).into())
    }

    async fn test_markdown_output_format(&mut self) -> Result<()> {
        let task = self.base.create_test_task(
            "Write a technical guide for setting up a development environment",
            Some("A well-structured Markdown guide with headers, code blocks, and clear instructions"),
            None,
        )?;
        let mut writer = self.writer()?.clone();
        let output = self.base.execute_agent_task(&task, &mut writer).await?;

        assert_output_format(&output, OutputFormat::Markdown)?;
        assert_agent_response_contains(&output, "Prerequisites", true)?;
        assert_agent_response_contains(&output, "Installation Steps", true)?;
        assert_agent_response_contains(&output, "```bash", true)
    }

    async fn test_content_structure(&mut self) -> Result<()> {
        let task = self.base.create_test_task(
            "Create a project README file",
            Some("Complete README with description, installation, usage and contribution guidelines"),
            None,
        )?;
        let mut writer = self.writer()?.clone();
        // 第一条响应是安装指南
        writer.respond("warm-up")?;
        let output = self.base.execute_agent_task(&task, &mut writer).await?;

        for section in ["Features", "Installation", "Usage", "Contributing", "License"] {
            assert_agent_response_contains(&output, section, true)?;
        }
        Ok(())
    }
}

impl TestCase for TestWritingAgent {
    type Fixture = AgentTestCase;

    fn fixture(&mut self) -> &mut AgentTestCase {
        &mut self.base
    }

    fn set_up(&mut self) -> Result<()> {
        let spec = self.base.create_test_agent(
            "Technical Writer",
            "Create clear, comprehensive, and engaging technical documentation",
            "You are a skilled technical writer with expertise in making complex topics accessible to various audiences.",
            Vec::new(),
        );
        self.writer = Some(MockAgent::new(spec.role).with_responses([MARKDOWN_GUIDE, README]));
        Ok(())
    }

    fn test_methods() -> Vec<TestMethod<Self>> {
        test_methods![test_markdown_output_format, test_content_structure]
    }
}
