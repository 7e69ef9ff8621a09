use crate::runtime::{append_runtime_log, LogEntryLevel, StatePaths};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationReason {
    UnknownProvider,
    CommandUnavailable,
}

/// Progress of a run, in the order it happens. Field names double as the
/// payload keys of the run log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunEvent {
    AgentReady {
        provider: String,
        label: String,
        command: String,
    },
    SimulationMode {
        provider: String,
        command: Option<String>,
        reason: SimulationReason,
    },
    ContinueNotImplemented {
        story_id: String,
    },
    StoryStarted {
        story_id: String,
        title: String,
        description: String,
    },
    ActivityStarted {
        activity_id: String,
        title: String,
        description: String,
        instructions: String,
        prompt_template: Option<String>,
    },
    StepStarted {
        activity_id: String,
        step_id: String,
        position: usize,
        prompt: String,
        input_request: String,
    },
    CurrentState {
        step_id: String,
        state: Value,
    },
    ConfirmationFailed {
        step_id: String,
        error: String,
    },
    StepSkipped {
        step_id: String,
    },
    AgentCalled {
        step_id: String,
        provider: String,
        command_form: Option<String>,
    },
    AgentResponded {
        step_id: String,
        response: String,
    },
    AgentFailed {
        step_id: String,
        error: String,
    },
    Simulated {
        step_id: String,
        prompt: String,
    },
    StateUpdated {
        step_id: String,
        patch: Value,
    },
    InvalidStateLogic {
        step_id: String,
        logic: String,
    },
    OutcomeCheck {
        step_id: String,
        check: String,
    },
    StepCompleted {
        activity_id: String,
        step_id: String,
        position: usize,
    },
    ActivityCompleted {
        activity_id: String,
        title: String,
        expected_outcome: String,
    },
    StoryCompleted {
        story_id: String,
        title: String,
        activities: usize,
    },
}

impl RunEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AgentReady { .. } => "agent.ready",
            Self::SimulationMode { .. } => "agent.simulation_mode",
            Self::ContinueNotImplemented { .. } => "story.continue_not_implemented",
            Self::StoryStarted { .. } => "story.started",
            Self::ActivityStarted { .. } => "activity.started",
            Self::StepStarted { .. } => "step.started",
            Self::CurrentState { .. } => "step.current_state",
            Self::ConfirmationFailed { .. } => "step.confirmation_failed",
            Self::StepSkipped { .. } => "step.skipped",
            Self::AgentCalled { .. } => "step.agent_called",
            Self::AgentResponded { .. } => "step.agent_responded",
            Self::AgentFailed { .. } => "step.agent_failed",
            Self::Simulated { .. } => "step.simulated",
            Self::StateUpdated { .. } => "step.state_updated",
            Self::InvalidStateLogic { .. } => "step.invalid_state_logic",
            Self::OutcomeCheck { .. } => "step.outcome_check",
            Self::StepCompleted { .. } => "step.completed",
            Self::ActivityCompleted { .. } => "activity.completed",
            Self::StoryCompleted { .. } => "story.completed",
        }
    }

    pub fn level(&self) -> LogEntryLevel {
        match self {
            Self::AgentFailed { .. } => LogEntryLevel::Error,
            Self::SimulationMode { .. }
            | Self::ContinueNotImplemented { .. }
            | Self::ConfirmationFailed { .. }
            | Self::StepSkipped { .. }
            | Self::InvalidStateLogic { .. } => LogEntryLevel::Warn,
            _ => LogEntryLevel::Info,
        }
    }

    pub fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub trait RunObserver {
    fn on_event(&mut self, event: &RunEvent);
}

/// Appends every event to `logs/runs.log` under the state root.
#[derive(Debug, Clone)]
pub struct RunLogObserver {
    paths: StatePaths,
}

impl RunLogObserver {
    pub fn new(paths: StatePaths) -> Self {
        Self { paths }
    }
}

impl RunObserver for RunLogObserver {
    fn on_event(&mut self, event: &RunEvent) {
        append_runtime_log(&self.paths, event.level(), event.name(), event.payload());
    }
}

#[derive(Default)]
pub struct FanOutObserver {
    observers: Vec<Box<dyn RunObserver>>,
}

impl FanOutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl RunObserver for FanOutObserver {
    fn on_event(&mut self, event: &RunEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer, so a handle can
/// be kept while the runner owns the observer.
#[derive(Debug, Clone, Default)]
pub struct CollectingObserver {
    events: Rc<RefCell<Vec<RunEvent>>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.borrow().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(RunEvent::name).collect()
    }
}

impl RunObserver for CollectingObserver {
    fn on_event(&mut self, event: &RunEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn payload_is_the_bare_field_object() {
        let event = RunEvent::AgentFailed {
            step_id: "s1".to_string(),
            error: "boom".to_string(),
        };
        assert_eq!(
            event.payload(),
            serde_json::json!({"step_id": "s1", "error": "boom"})
        );
        assert_eq!(event.level(), LogEntryLevel::Error);
    }

    #[test]
    fn fan_out_feeds_log_and_collector() {
        let dir = tempdir().expect("tempdir");
        let paths = StatePaths::new(dir.path());
        let collector = CollectingObserver::new();
        let mut observer = FanOutObserver::new()
            .with(RunLogObserver::new(paths.clone()))
            .with(collector.clone());

        observer.on_event(&RunEvent::StepSkipped {
            step_id: "s2".to_string(),
        });

        assert_eq!(collector.names(), ["step.skipped"]);
        let raw = fs::read_to_string(paths.runs_log_path()).expect("run log");
        let line: Value = serde_json::from_str(raw.trim()).expect("json line");
        assert_eq!(line["event"], "step.skipped");
        assert_eq!(line["level"], "warn");
        assert_eq!(line["step_id"], "s2");
    }
}
