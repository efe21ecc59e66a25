//! Core data models for scenario analysis
//!
//! A [`Dataset`] is the read-only snapshot handed over by the feature/step
//! parser. Field names on the wire follow the parser's JSON output
//! (`feature_file`, `test_num`, `test_case`, `steps[].step_num`, ...).

use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};

lazy_static! {
    static ref QUOTED_ARGUMENT: Regex = Regex::new(r#""[^"]*""#).unwrap();
}

/// Replace every double-quoted step argument with `""`.
///
/// `Given a file named "a.txt"` and `Given a file named "b.txt"` both clean
/// to `Given a file named ""`.
pub fn clean_step_name(step_name: &str) -> String {
    QUOTED_ARGUMENT.replace_all(step_name, r#""""#).into_owned()
}

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position within the scenario
    #[serde(rename = "step_num")]
    pub ordinal: usize,
    /// Step text as written in the feature file
    pub step_name: String,
    /// Step text with quoted arguments blanked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name_cleaned: Option<String>,
    /// Glue-code body, `None` when no step definition matched
    #[serde(rename = "step_definition", default)]
    pub body: Option<String>,
    /// File the glue code was found in
    #[serde(rename = "step_definition_file", default)]
    pub body_file: Option<String>,
}

impl Step {
    pub fn new(ordinal: usize, step_name: impl Into<String>, body: Option<&str>) -> Self {
        Self {
            ordinal,
            step_name: step_name.into(),
            step_name_cleaned: None,
            body: body.map(str::to_string),
            body_file: None,
        }
    }

    /// Cleaned step name, derived on the fly when the parser did not provide it.
    pub fn cleaned_name(&self) -> String {
        match &self.step_name_cleaned {
            Some(cleaned) => cleaned.clone(),
            None => clean_step_name(&self.step_name),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.body.is_some()
    }
}

/// A single behavioural scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique ordinal identifier
    #[serde(rename = "test_num")]
    pub id: usize,
    /// Scenario title
    #[serde(rename = "test_case")]
    pub title: String,
    /// Ground-truth group, the originating feature file
    #[serde(rename = "feature_file")]
    pub source_group: String,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl TestCase {
    pub fn new(
        id: usize,
        title: impl Into<String>,
        source_group: impl Into<String>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            source_group: source_group.into(),
            steps,
        }
    }
}

/// Step attribute a corpus is projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAttribute {
    /// Step text
    StepName,
    /// Step text with quoted arguments blanked
    CleanedStepName,
    /// Glue-code body
    StepBody,
    /// Scenario title (one line per test case, no step iteration)
    ScenarioTitle,
}

impl StepAttribute {
    /// Attributes analysed by default.
    pub const DEFAULT: [StepAttribute; 3] = [
        StepAttribute::StepName,
        StepAttribute::StepBody,
        StepAttribute::ScenarioTitle,
    ];

    /// Human-readable label used in branch names.
    pub fn label(&self) -> &'static str {
        match self {
            StepAttribute::StepName => "Step Name",
            StepAttribute::CleanedStepName => "Cleaned Step Name",
            StepAttribute::StepBody => "Step Definition",
            StepAttribute::ScenarioTitle => "Scenario Title",
        }
    }

    /// Parse attribute from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "step-name" | "step_name" | "name" => Some(StepAttribute::StepName),
            "cleaned-step-name" | "cleaned_step_name" | "cleaned" => {
                Some(StepAttribute::CleanedStepName)
            }
            "step-body" | "step_body" | "body" | "step-definition" | "step_definition" => {
                Some(StepAttribute::StepBody)
            }
            "scenario-title" | "scenario_title" | "title" => Some(StepAttribute::ScenarioTitle),
            _ => None,
        }
    }
}

impl fmt::Display for StepAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counts describing a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub test_cases: usize,
    pub steps: usize,
    pub unmatched_steps: usize,
    pub groups: usize,
}

/// Ordered collection of test cases; index `i` is corpus index `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    pub test_cases: Vec<TestCase>,
}

impl Dataset {
    pub fn new(test_cases: Vec<TestCase>) -> Self {
        Self { test_cases }
    }

    /// Decode the parser's JSON output and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.test_cases.iter().map(|t| t.title.as_str()).collect()
    }

    /// Number of distinct source groups.
    pub fn group_count(&self) -> usize {
        self.test_cases
            .iter()
            .map(|t| t.source_group.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Check unique ids and dense 1-based step ordinals.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.test_cases.len());
        for test in &self.test_cases {
            if !seen.insert(test.id) {
                return Err(AnalysisError::invalid_dataset(format!(
                    "duplicate test id {}",
                    test.id
                )));
            }
            for (position, step) in test.steps.iter().enumerate() {
                if step.ordinal != position + 1 {
                    return Err(AnalysisError::invalid_dataset(format!(
                        "test {} ('{}'): step at position {} has ordinal {}",
                        test.id,
                        test.title,
                        position + 1,
                        step.ordinal
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> DatasetSummary {
        let steps = self.test_cases.iter().map(|t| t.steps.len()).sum();
        let unmatched_steps = self
            .test_cases
            .iter()
            .flat_map(|t| t.steps.iter())
            .filter(|s| !s.is_matched())
            .count();
        DatasetSummary {
            test_cases: self.test_cases.len(),
            steps,
            unmatched_steps,
            groups: self.group_count(),
        }
    }
}
