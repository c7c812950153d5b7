//! Crew 工作流测试示例

use crew_testing::assertions::{
    AssertionResultExt, OutputFormat, assert_agent_collaboration, assert_crew_completed_successfully,
    assert_crew_output_matches, assert_output_format, assert_task_sequence,
};
use crew_testing::error::{AssertionError, Result, TestingError};
use crew_testing::fixtures::{AgentSpec, CrewTestCase, Process, TaskSpec, TestCase, TestMethod};
use crew_testing::runner::TestRegistry;
use crew_testing::test_methods;
use crew_testing::testing::{MockAgent, MockCrew};
use std::collections::HashMap;

pub const MODULE: &str = "test_crew_workflows";

pub fn register(registry: &mut TestRegistry) {
    registry
        .register::<TestContentCreationCrew>(MODULE)
        .register::<TestAnalyticsCrew>(MODULE);
}

const ARTICLE: &str = "\
# Renewable Energy: The Future is Now

## Introduction

Renewable energy technology has reached unprecedented levels of efficiency in 2024.

## Key Developments

- Perovskite solar cells achieving 31% efficiency
- Offshore wind turbines reaching 15MW capacity
- Grid-scale storage deployments doubling yearly

## Economic Impact

The renewable energy sector now employs over 13 million people globally.

## Conclusion

The next decade will likely see renewables become the dominant global energy source.
";

const ANALYTICS_JSON: &str = r#"
{
    "executive_summary": {
        "overall_satisfaction": 4.2,
        "trend": "improving"
    },
    "detailed_analysis": {
        "correlation_analysis": {
            "product_quality": 0.78,
            "customer_support": 0.65,
            "pricing": 0.43
        }
    },
    "recommendations": [
        "Focus quality improvements on individual customer segment",
        "Enhance customer support training"
    ]
}
"#;

fn ensure(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(AssertionError::Failed(message.into()).into())
    }
}

#[derive(Default)]
pub struct TestContentCreationCrew {
    base: CrewTestCase,
    researcher: AgentSpec,
    writer: AgentSpec,
    editor: AgentSpec,
}

impl TestContentCreationCrew {
    fn mock_crew(&self) -> MockCrew {
        MockCrew::new(vec![
            MockAgent::new(&self.researcher.role)
                .with_response("Findings on {topic}: solar and wind capacity keep growing"),
            MockAgent::new(&self.writer.role).with_response("Draft article on renewable energy"),
            MockAgent::new(&self.editor.role).with_response(ARTICLE),
        ])
    }

    async fn test_sequential_content_workflow(&mut self) -> Result<()> {
        let research = self.base.add_test_task(
            "Research the latest developments in {topic} technology",
            Some("Comprehensive research summary with key findings"),
            Some(&self.researcher),
        );
        let writing = self.base.add_test_task(
            "Write a 1000-word article about {topic} based on the research",
            Some("Well-structured article with introduction, main points, and conclusion"),
            Some(&self.writer),
        );
        let editing = self.base.add_test_task(
            "Edit and polish the article for publication",
            Some("Final polished article ready for publication"),
            Some(&self.editor),
        );

        self.base.create_test_crew(
            Process::Sequential,
            vec![self.researcher.clone(), self.writer.clone(), self.editor.clone()],
            vec![research, writing, editing],
        )?;

        let mut crew = self.mock_crew();
        let inputs = HashMap::from([("topic".to_string(), "renewable energy".to_string())]);
        let output = self.base.execute_crew(&mut crew, &inputs).await?;

        assert_crew_completed_successfully(&output)?;
        assert_task_sequence(&output, &["Research", "Write", "Edit"])?;
        assert_agent_collaboration(&output, 3)?;
        for pattern in ["Renewable Energy", "solar", "wind"] {
            assert_crew_output_matches(&output, pattern, false)?;
        }
        assert_output_format(&output, OutputFormat::Markdown)?;
        for section in ["Introduction", "Key Developments", "Economic Impact", "Conclusion"] {
            assert_crew_output_matches(&output, &format!("(?m)^## {}$", section), true)
                .with_message(format!("article is missing the '{}' section", section))?;
        }

        let researcher_input = crew
            .agent(&self.researcher.role)
            .and_then(MockAgent::last_input)
            .unwrap_or_default();
        ensure(
            researcher_input.contains("renewable energy technology"),
            format!("inputs were not interpolated: {}", researcher_input),
        )
    }

    async fn test_collaborative_research_crew(&mut self) -> Result<()> {
        let agents = vec![
            AgentSpec::new(
                "Primary Researcher",
                "Lead research efforts and coordinate with team",
                "Senior researcher with project management experience",
            ),
            AgentSpec::new(
                "Data Analyst",
                "Analyze data and provide statistical insights",
                "Expert in data analysis and statistical modeling",
            ),
            AgentSpec::new(
                "Subject Matter Expert",
                "Provide domain expertise and validate findings",
                "Industry expert with deep knowledge of the research domain",
            ),
        ];
        let tasks = vec![
            TaskSpec::new("Define research methodology and coordinate team efforts"),
            TaskSpec::new("Analyze collected data and generate statistical insights"),
            TaskSpec::new("Review findings and provide expert validation"),
        ];

        let (agents, tasks) =
            self.base
                .create_collaborative_scenario("collaborative_research", agents, tasks);
        ensure(
            tasks[2].agent_role() == Some("Subject Matter Expert"),
            "tasks were not assigned round-robin",
        )?;
        self.base.create_test_crew(Process::Sequential, agents, tasks)?;

        let mut crew = MockCrew::new(vec![
            MockAgent::new("Primary Researcher")
                .with_response("## Methodology\nMixed-methods approach with weekly team coordination"),
            MockAgent::new("Data Analyst")
                .with_response("## Statistical Analysis\n78% increase in efficiency metrics"),
            MockAgent::new("Subject Matter Expert").with_response(
                "## Expert Validation\nMethodology is sound and the team coordination was effective.",
            ),
        ]);
        let output = self.base.execute_crew(&mut crew, &HashMap::new()).await?;

        assert_crew_completed_successfully(&output)?;
        assert_agent_collaboration(&output, 3)?;
        let contributions = self
            .base
            .crew_task_outputs(None)
            .iter()
            .map(|t| t.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        for contribution in ["Methodology", "Statistical Analysis", "Expert Validation"] {
            assert_crew_output_matches(&contributions, contribution, false)?;
        }
        assert_crew_output_matches(&output, "team", false)?;
        assert_crew_output_matches(&output, "coordination", false)
    }

    async fn test_error_handling_in_crew(&mut self) -> Result<()> {
        let task = self.base.add_test_task(
            "Process invalid data format",
            Some("Processed results"),
            Some(&self.researcher),
        );
        self.base
            .create_test_crew(Process::Sequential, vec![self.researcher.clone()], vec![task])?;

        let mut crew = MockCrew::new(vec![
            MockAgent::new(&self.researcher.role).with_failure("Invalid data format"),
        ]);
        let output = self.base.execute_crew(&mut crew, &HashMap::new()).await?;

        match assert_crew_completed_successfully(&output) {
            Err(TestingError::Assertion(AssertionError::CrewExecutionFailed(message))) => ensure(
                message.contains("Invalid data format"),
                format!("unexpected failure message: {}", message),
            ),
            other => Err(AssertionError::Failed(format!(
                "expected a crew execution failure, got {:?}",
                other
            ))
            .into()),
        }
    }

    async fn test_crew_performance_metrics(&mut self) -> Result<()> {
        for description in ["Gather sources", "Draft summary", "Review summary"] {
            self.base.add_test_task(description, None, None);
        }
        self.base.create_test_crew(Process::Sequential, Vec::new(), Vec::new())?;

        let mut crew = MockCrew::new(vec![
            MockAgent::new(&self.researcher.role).with_responses(["sources", "summary", "review"]),
        ]);
        let output = self.base.execute_crew(&mut crew, &HashMap::new()).await?;
        let metrics = self.base.measure_crew_performance(&output);

        ensure(metrics.total_tasks == self.base.test_tasks().len(), "total_tasks mismatch")?;
        ensure(metrics.successful_tasks == 3, "expected 3 successful tasks")?;
        ensure(
            metrics.agent_utilization.get(&self.researcher.role) == Some(&3),
            format!("unexpected utilization: {:?}", metrics.agent_utilization),
        )?;
        // 三个 Agent 中只有研究员参与
        ensure(
            (metrics.collaboration_score - 1.0 / 3.0).abs() < 1e-9,
            format!("unexpected collaboration score {}", metrics.collaboration_score),
        )
    }
}

impl TestCase for TestContentCreationCrew {
    type Fixture = CrewTestCase;

    fn fixture(&mut self) -> &mut CrewTestCase {
        &mut self.base
    }

    fn set_up(&mut self) -> Result<()> {
        self.researcher = self.base.add_test_agent(
            "Content Researcher",
            "Gather accurate and relevant information for content creation",
            "You are a meticulous researcher who ensures all content is well-researched and factually accurate.",
        );
        self.writer = self.base.add_test_agent(
            "Content Writer",
            "Create engaging and well-structured content based on research",
            "You are a skilled writer who transforms research into compelling, readable content.",
        );
        self.editor = self.base.add_test_agent(
            "Content Editor",
            "Review and polish content for clarity, accuracy, and style",
            "You are an experienced editor with an eye for detail and a commitment to quality.",
        );
        Ok(())
    }

    fn test_methods() -> Vec<TestMethod<Self>> {
        test_methods![
            test_sequential_content_workflow,
            test_collaborative_research_crew,
            test_error_handling_in_crew,
            test_crew_performance_metrics,
        ]
    }
}

#[derive(Default)]
pub struct TestAnalyticsCrew {
    base: CrewTestCase,
}

impl TestAnalyticsCrew {
    async fn test_data_analysis_pipeline(&mut self) -> Result<()> {
        let collector = self.base.add_test_agent(
            "Data Collection Specialist",
            "Gather and validate data from multiple sources",
            "Expert in data collection with attention to data quality and integrity",
        );
        let analyst = self.base.add_test_agent(
            "Senior Data Analyst",
            "Perform comprehensive data analysis and generate insights",
            "Experienced analyst skilled in statistical methods and data interpretation",
        );
        let reporter = self.base.add_test_agent(
            "Report Generator",
            "Create clear, actionable reports from analysis results",
            "Specialist in transforming complex analysis into understandable business insights",
        );

        self.base.add_test_task(
            "Collect customer satisfaction data from surveys, reviews, and support tickets",
            Some("Clean dataset with validated customer satisfaction metrics"),
            Some(&collector),
        );
        self.base.add_test_task(
            "Analyze customer satisfaction trends and identify key drivers",
            Some("Statistical analysis with trend identification and correlation analysis"),
            Some(&analyst),
        );
        self.base.add_test_task(
            "Generate executive report with findings and recommendations",
            Some("Executive summary with key insights, trends, and actionable recommendations"),
            Some(&reporter),
        );
        let crew_spec = self
            .base
            .create_test_crew(Process::Sequential, Vec::new(), Vec::new())?;
        ensure(crew_spec.tasks().len() == 3, "crew should carry all three tasks")?;

        let mut crew = MockCrew::new(vec![
            MockAgent::new(&collector.role).with_response("1,204 validated survey responses"),
            MockAgent::new(&analyst.role).with_response("Product quality correlates at 0.78"),
            MockAgent::new(&reporter.role).with_response(ANALYTICS_JSON),
        ]);
        let output = self.base.execute_crew(&mut crew, &HashMap::new()).await?;

        assert_crew_completed_successfully(&output)?;
        assert_output_format(&output, OutputFormat::Json)?;
        assert_crew_output_matches(&output, "satisfaction", false)?;
        assert_crew_output_matches(&output, "recommendations", false)?;
        assert_crew_output_matches(&output, r#""correlation_analysis"\s*:\s*\{"#, true)
    }
}

impl TestCase for TestAnalyticsCrew {
    type Fixture = CrewTestCase;

    fn fixture(&mut self) -> &mut CrewTestCase {
        &mut self.base
    }

    fn test_methods() -> Vec<TestMethod<Self>> {
        test_methods![test_data_analysis_pipeline]
    }
}
