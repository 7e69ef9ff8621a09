use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub initial_state: Value,
    /// Outcome name to "required" flag.
    #[serde(default)]
    pub expected_outcomes: BTreeMap<String, bool>,
    #[serde(default)]
    pub completion_criteria: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Filled from the enclosing story when imported as part of a bundle.
    #[serde(default)]
    pub story_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Name into the static prompt library.
    #[serde(default)]
    pub prompt_template: String,
    /// Whatever JSON the database holds; `Value::Null` when the stored text
    /// was absent or unparsable.
    #[serde(default = "empty_object")]
    pub state: Value,
    #[serde(default)]
    pub expected_outcome: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default)]
    pub activity_id: String,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub input_request: String,
    /// A JSON object literal, shallow-merged into the activity state.
    #[serde(default)]
    pub state_update_logic: String,
    #[serde(default)]
    pub outcome_check: String,
}

/// A story with its activities and steps, as read from an import file or a
/// seed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBundle {
    #[serde(flatten)]
    pub story: Story,
    #[serde(default)]
    pub activities: Vec<ActivityBundle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityBundle {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl StoryBundle {
    /// Points every nested activity and step at its parent.
    pub fn link_parents(&mut self) {
        for bundle in &mut self.activities {
            bundle.activity.story_id = self.story.id.clone();
            for step in &mut bundle.steps {
                step.activity_id = bundle.activity.id.clone();
            }
        }
    }

    pub fn step_count(&self) -> usize {
        self.activities.iter().map(|bundle| bundle.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_yaml_bundle_links_parents() {
        let mut bundle: StoryBundle = serde_yaml::from_str(
            r#"
id: quick-test
title: Quick Claude Test
expected_outcomes:
  response_received: true
activities:
  - id: instant-test
    title: Instant Test
    steps:
      - id: ask-quick
        order_index: 1
        prompt: Say "Working!" if you can see this.
        state_update_logic: '{"done": true}'
"#,
        )
        .expect("parse bundle");
        bundle.link_parents();

        assert_eq!(bundle.story.initial_state, empty_object());
        assert_eq!(bundle.story.expected_outcomes.get("response_received"), Some(&true));
        let activity = &bundle.activities[0];
        assert_eq!(activity.activity.story_id, "quick-test");
        assert_eq!(activity.activity.state, empty_object());
        assert_eq!(activity.steps[0].activity_id, "instant-test");
        assert_eq!(bundle.step_count(), 1);
    }
}
