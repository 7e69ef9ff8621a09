use crate::orchestration::confirm::StepConfirmer;
use crate::orchestration::events::{RunEvent, RunObserver};
use crate::orchestration::state::{
    apply_state_update, record_agent_error, record_agent_response, StatePatch,
};
use crate::orchestration::story_runner::StepAgent;
use crate::storage::Step;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDisposition {
    /// The operator refused; nothing ran and nothing was merged.
    Skipped,
    Completed,
    /// The agent call failed; the error was recorded in the state.
    AgentFailed,
    /// No agent was available; the prompt was only reported.
    Simulated,
    /// The step has no prompt; only its state update was applied.
    NoPrompt,
}

pub(crate) struct StepExecutionContext<'a> {
    pub agent: Option<&'a mut (dyn StepAgent + 'static)>,
    pub confirmer: &'a mut dyn StepConfirmer,
    pub observer: &'a mut dyn RunObserver,
    pub auto_confirm: bool,
}

/// Drives one step against the working state. Persisting the state and
/// pausing afterwards are left to the caller.
pub(crate) fn execute_step(
    context: StepExecutionContext<'_>,
    step: &Step,
    state: &mut Map<String, Value>,
) -> StepDisposition {
    let StepExecutionContext {
        agent,
        confirmer,
        observer,
        auto_confirm,
    } = context;

    if !state.is_empty() {
        observer.on_event(&RunEvent::CurrentState {
            step_id: step.id.clone(),
            state: Value::Object(state.clone()),
        });
    }

    let has_prompt = !step.prompt.is_empty();
    if !auto_confirm && has_prompt {
        let approved = match confirmer.confirm("Execute this step?") {
            Ok(approved) => approved,
            Err(err) => {
                observer.on_event(&RunEvent::ConfirmationFailed {
                    step_id: step.id.clone(),
                    error: err.to_string(),
                });
                false
            }
        };
        if !approved {
            observer.on_event(&RunEvent::StepSkipped {
                step_id: step.id.clone(),
            });
            return StepDisposition::Skipped;
        }
    }

    let disposition = match (has_prompt, agent) {
        (false, _) => StepDisposition::NoPrompt,
        (true, Some(agent)) => {
            observer.on_event(&RunEvent::AgentCalled {
                step_id: step.id.clone(),
                provider: agent.name().to_string(),
                command_form: agent.command_form(&step.prompt),
            });
            match agent.execute(&step.prompt) {
                Ok(response) => {
                    record_agent_response(state, &response);
                    observer.on_event(&RunEvent::AgentResponded {
                        step_id: step.id.clone(),
                        response,
                    });
                    StepDisposition::Completed
                }
                Err(err) => {
                    let message = err.to_string();
                    record_agent_error(state, &message);
                    observer.on_event(&RunEvent::AgentFailed {
                        step_id: step.id.clone(),
                        error: message,
                    });
                    StepDisposition::AgentFailed
                }
            }
        }
        (true, None) => {
            observer.on_event(&RunEvent::Simulated {
                step_id: step.id.clone(),
                prompt: step.prompt.clone(),
            });
            StepDisposition::Simulated
        }
    };

    match apply_state_update(state, &step.state_update_logic) {
        StatePatch::Empty => {}
        StatePatch::Applied(patch) => observer.on_event(&RunEvent::StateUpdated {
            step_id: step.id.clone(),
            patch: Value::Object(patch),
        }),
        StatePatch::Malformed => observer.on_event(&RunEvent::InvalidStateLogic {
            step_id: step.id.clone(),
            logic: step.state_update_logic.clone(),
        }),
    }

    if !step.outcome_check.is_empty() {
        observer.on_event(&RunEvent::OutcomeCheck {
            step_id: step.id.clone(),
            check: step.outcome_check.clone(),
        });
    }

    disposition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::confirm::AutoApprove;
    use crate::orchestration::events::CollectingObserver;
    use crate::provider::ProviderError;
    use serde_json::json;
    use std::io;

    struct Refuse;

    impl StepConfirmer for Refuse {
        fn confirm(&mut self, _question: &str) -> io::Result<bool> {
            Ok(false)
        }
    }

    struct BrokenInput;

    impl StepConfirmer for BrokenInput {
        fn confirm(&mut self, _question: &str) -> io::Result<bool> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin gone"))
        }
    }

    struct Failing;

    impl StepAgent for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn execute(&mut self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::SpawnFailed {
                provider: "failing".to_string(),
                command: "missing-cli".to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }

    fn step(prompt: &str, logic: &str) -> Step {
        Step {
            id: "s1".to_string(),
            activity_id: "a1".to_string(),
            order_index: 1,
            prompt: prompt.to_string(),
            input_request: String::new(),
            state_update_logic: logic.to_string(),
            outcome_check: String::new(),
        }
    }

    #[test]
    fn refusal_skips_agent_and_patch() {
        let mut observer = CollectingObserver::new();
        let mut failing = Failing;
        let mut state = Map::new();
        let disposition = execute_step(
            StepExecutionContext {
                agent: Some(&mut failing),
                confirmer: &mut Refuse,
                observer: &mut observer,
                auto_confirm: false,
            },
            &step("do it", r#"{"k": 1}"#),
            &mut state,
        );

        assert_eq!(disposition, StepDisposition::Skipped);
        assert!(state.is_empty());
        assert_eq!(observer.names(), ["step.skipped"]);
    }

    #[test]
    fn unreadable_confirmation_is_reported_and_skips() {
        let mut observer = CollectingObserver::new();
        let mut failing = Failing;
        let mut state = Map::new();
        let disposition = execute_step(
            StepExecutionContext {
                agent: Some(&mut failing),
                confirmer: &mut BrokenInput,
                observer: &mut observer,
                auto_confirm: false,
            },
            &step("do it", r#"{"k": 1}"#),
            &mut state,
        );

        assert_eq!(disposition, StepDisposition::Skipped);
        assert!(state.is_empty());
        assert_eq!(
            observer.names(),
            ["step.confirmation_failed", "step.skipped"]
        );
        match &observer.events()[0] {
            RunEvent::ConfirmationFailed { error, .. } => assert_eq!(error, "stdin gone"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn agent_failure_is_recorded_and_patch_still_applies() {
        let mut observer = CollectingObserver::new();
        let mut failing = Failing;
        let mut state = Map::new();
        let disposition = execute_step(
            StepExecutionContext {
                agent: Some(&mut failing),
                confirmer: &mut AutoApprove,
                observer: &mut observer,
                auto_confirm: true,
            },
            &step("do it", r#"{"k": 1}"#),
            &mut state,
        );

        assert_eq!(disposition, StepDisposition::AgentFailed);
        assert_eq!(state["k"], json!(1));
        assert!(state["step_error"]
            .as_str()
            .expect("error text")
            .starts_with("failed to spawn agent process"));
        assert!(!state.contains_key("step_completed"));
    }

    #[test]
    fn promptless_step_never_asks_or_calls() {
        let mut observer = CollectingObserver::new();
        let mut state = Map::new();
        let disposition = execute_step(
            StepExecutionContext {
                agent: None,
                confirmer: &mut Refuse,
                observer: &mut observer,
                auto_confirm: false,
            },
            &step("", r#"{"ready": true}"#),
            &mut state,
        );

        assert_eq!(disposition, StepDisposition::NoPrompt);
        assert_eq!(state["ready"], json!(true));
        assert_eq!(observer.names(), ["step.state_updated"]);
    }
}
