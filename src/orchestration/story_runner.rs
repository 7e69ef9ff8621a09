use crate::config::{ExecutionSettings, Settings};
use crate::orchestration::confirm::{StepConfirmer, TerminalConfirmer};
use crate::orchestration::error::RunError;
use crate::orchestration::events::{RunEvent, RunObserver, SimulationReason};
use crate::orchestration::state::load_activity_state;
use crate::orchestration::step_execution::{execute_step, StepDisposition, StepExecutionContext};
use crate::prompts::prompt_template;
use crate::provider::{
    build_invocation, is_command_available, AgentInvoker, AgentRegistry, ProviderError,
};
use crate::storage::{Activity, StoryStore};
use serde_json::Value;
use std::thread;

/// What the engine needs from an agent: one prompt in, one response out.
pub trait StepAgent {
    fn name(&self) -> &str;

    fn execute(&mut self, prompt: &str) -> Result<String, ProviderError>;

    /// The command line a prompt would launch, when there is one.
    fn command_form(&self, _prompt: &str) -> Option<String> {
        None
    }
}

impl StepAgent for AgentInvoker {
    fn name(&self) -> &str {
        AgentInvoker::name(self)
    }

    fn execute(&mut self, prompt: &str) -> Result<String, ProviderError> {
        AgentInvoker::execute(self, prompt)
    }

    fn command_form(&self, prompt: &str) -> Option<String> {
        Some(build_invocation(self.descriptor(), prompt).command_form())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub activities: usize,
    pub steps: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub simulated: usize,
}

impl RunSummary {
    fn absorb(&mut self, other: RunSummary) {
        self.activities += other.activities;
        self.steps += other.steps;
        self.completed += other.completed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.simulated += other.simulated;
    }

    fn count(&mut self, disposition: StepDisposition) {
        self.steps += 1;
        match disposition {
            StepDisposition::Completed => self.completed += 1,
            StepDisposition::AgentFailed => self.failed += 1,
            StepDisposition::Skipped => self.skipped += 1,
            StepDisposition::Simulated => self.simulated += 1,
            StepDisposition::NoPrompt => {}
        }
    }
}

enum AgentSlot {
    Pending {
        registry: AgentRegistry,
        provider: String,
    },
    Resolved(Option<Box<dyn StepAgent>>),
}

/// Walks Story -> Activities -> Steps, one step at a time. The agent is
/// resolved on the first run; a provider that is unknown or not installed
/// puts the whole runner in simulation mode.
pub struct StoryRunner {
    store: StoryStore,
    execution: ExecutionSettings,
    agent: AgentSlot,
    confirmer: Box<dyn StepConfirmer>,
    observer: Box<dyn RunObserver>,
}

impl StoryRunner {
    pub fn new(
        store: StoryStore,
        registry: AgentRegistry,
        settings: &Settings,
        observer: impl RunObserver + 'static,
    ) -> Self {
        Self {
            store,
            execution: settings.execution,
            agent: AgentSlot::Pending {
                registry,
                provider: settings.agent.provider.clone(),
            },
            confirmer: Box::new(TerminalConfirmer::new()),
            observer: Box::new(observer),
        }
    }

    /// Uses `agent` for every step instead of resolving the configured
    /// provider.
    pub fn with_agent(mut self, agent: impl StepAgent + 'static) -> Self {
        self.agent = AgentSlot::Resolved(Some(Box::new(agent)));
        self
    }

    pub fn in_simulation(mut self) -> Self {
        self.agent = AgentSlot::Resolved(None);
        self
    }

    pub fn with_confirmer(mut self, confirmer: impl StepConfirmer + 'static) -> Self {
        self.confirmer = Box::new(confirmer);
        self
    }

    pub fn store(&self) -> &StoryStore {
        &self.store
    }

    pub fn run_story(&mut self, story_id: &str) -> Result<RunSummary, RunError> {
        self.ensure_agent();

        let story = self
            .store
            .get_story(story_id)?
            .ok_or_else(|| RunError::StoryNotFound {
                story_id: story_id.to_string(),
            })?;
        self.observer.on_event(&RunEvent::StoryStarted {
            story_id: story.id.clone(),
            title: story.title.clone(),
            description: story.description.clone(),
        });

        let mut summary = RunSummary::default();
        for activity in self.store.activities_for_story(&story.id)? {
            summary.absorb(self.run_loaded_activity(&activity)?);
        }

        self.observer.on_event(&RunEvent::StoryCompleted {
            story_id: story.id,
            title: story.title,
            activities: summary.activities,
        });
        Ok(summary)
    }

    /// Resuming from a checkpoint is not supported; the story is run again
    /// from its first activity on top of the persisted states.
    pub fn continue_story(&mut self, story_id: &str) -> Result<RunSummary, RunError> {
        self.observer.on_event(&RunEvent::ContinueNotImplemented {
            story_id: story_id.to_string(),
        });
        self.run_story(story_id)
    }

    pub fn run_activity(&mut self, activity_id: &str) -> Result<RunSummary, RunError> {
        self.ensure_agent();

        let activity =
            self.store
                .get_activity(activity_id)?
                .ok_or_else(|| RunError::ActivityNotFound {
                    activity_id: activity_id.to_string(),
                })?;
        self.run_loaded_activity(&activity)
    }

    /// Releases the interactive input handle. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.confirmer.close();
    }

    fn run_loaded_activity(&mut self, activity: &Activity) -> Result<RunSummary, RunError> {
        self.observer.on_event(&RunEvent::ActivityStarted {
            activity_id: activity.id.clone(),
            title: activity.title.clone(),
            description: activity.description.clone(),
            instructions: activity.instructions.clone(),
            prompt_template: prompt_template(&activity.prompt_template).map(str::to_string),
        });

        let steps = self.store.steps_for_activity(&activity.id)?;
        let mut state = load_activity_state(&activity.state);
        let mut summary = RunSummary {
            activities: 1,
            ..RunSummary::default()
        };

        for (index, step) in steps.iter().enumerate() {
            let position = index + 1;
            self.observer.on_event(&RunEvent::StepStarted {
                activity_id: activity.id.clone(),
                step_id: step.id.clone(),
                position,
                prompt: step.prompt.clone(),
                input_request: step.input_request.clone(),
            });

            let agent = match &mut self.agent {
                AgentSlot::Resolved(agent) => agent.as_deref_mut(),
                AgentSlot::Pending { .. } => None,
            };
            let disposition = execute_step(
                StepExecutionContext {
                    agent,
                    confirmer: self.confirmer.as_mut(),
                    observer: self.observer.as_mut(),
                    auto_confirm: self.execution.auto_confirm,
                },
                step,
                &mut state,
            );
            summary.count(disposition);

            self.store
                .update_activity_state(&activity.id, &Value::Object(state.clone()))?;

            self.observer.on_event(&RunEvent::StepCompleted {
                activity_id: activity.id.clone(),
                step_id: step.id.clone(),
                position,
            });

            let pause = self.execution.pause_between_steps();
            if disposition != StepDisposition::Skipped && !pause.is_zero() {
                thread::sleep(pause);
            }
        }

        self.observer.on_event(&RunEvent::ActivityCompleted {
            activity_id: activity.id.clone(),
            title: activity.title.clone(),
            expected_outcome: activity.expected_outcome.clone(),
        });
        Ok(summary)
    }

    fn ensure_agent(&mut self) {
        let slot = std::mem::replace(&mut self.agent, AgentSlot::Resolved(None));
        self.agent = match slot {
            AgentSlot::Pending { registry, provider } => {
                AgentSlot::Resolved(resolve_agent(&registry, &provider, self.observer.as_mut()))
            }
            resolved => resolved,
        };
    }
}

fn resolve_agent(
    registry: &AgentRegistry,
    provider: &str,
    observer: &mut dyn RunObserver,
) -> Option<Box<dyn StepAgent>> {
    let Some(descriptor) = registry.lookup(provider) else {
        observer.on_event(&RunEvent::SimulationMode {
            provider: provider.to_string(),
            command: None,
            reason: SimulationReason::UnknownProvider,
        });
        return None;
    };
    if !is_command_available(&descriptor.command) {
        observer.on_event(&RunEvent::SimulationMode {
            provider: provider.to_string(),
            command: Some(descriptor.command.clone()),
            reason: SimulationReason::CommandUnavailable,
        });
        return None;
    }

    observer.on_event(&RunEvent::AgentReady {
        provider: provider.to_string(),
        label: descriptor.label.clone(),
        command: descriptor.command.clone(),
    });
    Some(Box::new(AgentInvoker::new(provider, descriptor.clone())))
}
