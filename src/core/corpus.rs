//! Text projection of test cases into comparable strings.
//!
//! Every corpus built from the same [`Dataset`] shares its index space:
//! `corpus[i]` always describes `dataset.test_cases[i]`.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::models::{Dataset, Step, StepAttribute, TestCase};

/// Rendered value of a step whose glue code was not matched.
pub const UNMATCHED_BODY: &str = "";

/// One string per test case, projected from a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub attribute: StepAttribute,
    entries: Vec<String>,
}

impl Corpus {
    /// Project `dataset` under `attribute`.
    pub fn project(dataset: &Dataset, attribute: StepAttribute) -> Self {
        let entries = match attribute {
            StepAttribute::ScenarioTitle => {
                dataset.test_cases.iter().map(|t| t.title.clone()).collect()
            }
            _ => dataset
                .test_cases
                .iter()
                .map(|test| render_steps(test, attribute))
                .collect(),
        };
        Self { attribute, entries }
    }

    /// Corpus of scenario titles.
    pub fn titles(dataset: &Dataset) -> Self {
        Self::project(dataset, StepAttribute::ScenarioTitle)
    }

    /// Build a corpus from raw strings (tests, benches, external projections).
    pub fn from_entries(attribute: StepAttribute, entries: Vec<String>) -> Self {
        Self { attribute, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Index<usize> for Corpus {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.entries[index]
    }
}

fn step_value(step: &Step, attribute: StepAttribute) -> String {
    match attribute {
        StepAttribute::StepName => step.step_name.clone(),
        StepAttribute::CleanedStepName => step.cleaned_name(),
        StepAttribute::StepBody => step
            .body
            .clone()
            .unwrap_or_else(|| UNMATCHED_BODY.to_string()),
        StepAttribute::ScenarioTitle => String::new(),
    }
}

/// `"{ordinal}: {value}\n"` per step, in step order.
fn render_steps(test: &TestCase, attribute: StepAttribute) -> String {
    let mut rendered = String::new();
    for step in &test.steps {
        rendered.push_str(&format!("{}: {}\n", step.ordinal, step_value(step, attribute)));
    }
    rendered
}
