pub mod assertions;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod testing;

pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::error::{AssertionError, Result, TestingError};
    pub use crate::evaluator::{EvaluationScore, Evaluator, GroundingVerdict};
    pub use crate::fixtures::{
        AgentSpec, AgentTestCase, CrewOutput, CrewTestCase, Process, TaskOutput, TaskSpec,
        TestCase, TestMethod,
    };
    pub use crate::runner::{TestRegistry, TestRunner};
    pub use crate::test_methods;
    pub use crate::testing::{MockAgent, MockCrew, MockEvaluator, MockTool};
}
