use crate::config::LogLevel;
use crate::orchestration::{RunEvent, RunObserver, SimulationReason};
use crossterm::style::Stylize;
use serde_json::Value;

const RESPONSE_PREVIEW_CHARS: usize = 200;

/// Prints run progress to stdout as it happens.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleObserver {
    level: LogLevel,
}

impl ConsoleObserver {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl RunObserver for ConsoleObserver {
    fn on_event(&mut self, event: &RunEvent) {
        for line in render_event(self.level, event) {
            println!("{line}");
        }
    }
}

fn at_least(level: LogLevel, required: LogLevel) -> bool {
    rank(level) >= rank(required)
}

fn rank(level: LogLevel) -> u8 {
    match level {
        LogLevel::Minimal => 0,
        LogLevel::Normal => 1,
        LogLevel::Verbose => 2,
    }
}

pub fn response_preview(response: &str) -> String {
    let mut preview: String = response.chars().take(RESPONSE_PREVIEW_CHARS).collect();
    if response.chars().count() > RESPONSE_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Lines to print for `event` at `level`; empty when the event is filtered.
pub fn render_event(level: LogLevel, event: &RunEvent) -> Vec<String> {
    let normal = at_least(level, LogLevel::Normal);
    let verbose = at_least(level, LogLevel::Verbose);

    match event {
        RunEvent::AgentReady { label, .. } => {
            vec![format!("Agent initialized: {label}").green().to_string()]
        }
        RunEvent::SimulationMode {
            provider,
            command,
            reason,
        } => match reason {
            SimulationReason::UnknownProvider => vec![format!(
                "Agent provider '{provider}' not found. Running in simulation mode."
            )
            .yellow()
            .to_string()],
            SimulationReason::CommandUnavailable => vec![
                format!(
                    "Agent CLI '{}' not found. Running in simulation mode.",
                    command.as_deref().unwrap_or(provider)
                )
                .yellow()
                .to_string(),
                "   Install it or run: stories config agent".dim().to_string(),
            ],
        },
        RunEvent::ContinueNotImplemented { .. } => vec![
            "Continue story functionality not yet implemented; running from the start"
                .yellow()
                .to_string(),
        ],
        RunEvent::StoryStarted {
            title, description, ..
        } => vec![
            format!("Story: {title}").blue().bold().to_string(),
            description.clone().grey().to_string(),
            String::new(),
        ],
        RunEvent::ActivityStarted {
            title,
            description,
            instructions,
            prompt_template,
            ..
        } => {
            let mut lines = vec![
                format!("Activity: {title}").cyan().bold().to_string(),
                description.clone().grey().to_string(),
            ];
            if !instructions.is_empty() {
                lines.push(format!("Instructions: {instructions}").yellow().to_string());
            }
            if verbose {
                if let Some(template) = prompt_template {
                    lines.push(format!("Prompt template: {template}").dim().to_string());
                }
            }
            lines.push(String::new());
            lines
        }
        RunEvent::StepStarted {
            position,
            prompt,
            input_request,
            ..
        } if normal => {
            let prompt = if prompt.is_empty() {
                "Executing step..."
            } else {
                prompt.as_str()
            };
            let mut lines = vec![format!("Step {position}: {prompt}").magenta().to_string()];
            if !input_request.is_empty() {
                lines.push(format!("Input needed: {input_request}").blue().to_string());
            }
            lines
        }
        RunEvent::CurrentState { state, .. } if verbose => {
            vec![format!("Current state: {}", pretty(state)).dim().to_string()]
        }
        RunEvent::ConfirmationFailed { error, .. } => {
            vec![format!("Could not read confirmation: {error}")
                .yellow()
                .to_string()]
        }
        RunEvent::StepSkipped { .. } if normal => {
            vec!["Skipping step...".yellow().to_string()]
        }
        RunEvent::AgentCalled { command_form, .. } if normal => {
            let mut lines = vec!["Calling agent...".blue().to_string()];
            if verbose {
                if let Some(command_form) = command_form {
                    lines.push(format!("   $ {command_form}").dim().to_string());
                }
            }
            lines
        }
        RunEvent::AgentResponded { response, .. } if normal => {
            let body = if verbose {
                response.clone()
            } else {
                response_preview(response)
            };
            vec![
                "Agent response received:".green().to_string(),
                body.cyan().to_string(),
            ]
        }
        RunEvent::AgentFailed { error, .. } => {
            vec![format!("Agent execution failed: {error}").red().to_string()]
        }
        RunEvent::Simulated { prompt, .. } if normal => vec![
            format!("SIMULATION MODE: {prompt}").yellow().to_string(),
            "   (No agent configured - install aichat, claude, etc.)"
                .dim()
                .to_string(),
        ],
        RunEvent::StateUpdated { patch, .. } if normal => {
            vec![format!("State updated: {}", compact(patch)).cyan().to_string()]
        }
        RunEvent::InvalidStateLogic { logic, .. } if normal => {
            vec![format!("Invalid state update logic: {logic}")
                .yellow()
                .to_string()]
        }
        RunEvent::OutcomeCheck { check, .. } if normal => {
            vec![format!("Outcome check: {check}").green().to_string()]
        }
        RunEvent::StepCompleted { position, .. } if normal => vec![
            format!("Step {position} completed").green().to_string(),
            String::new(),
        ],
        RunEvent::ActivityCompleted {
            title,
            expected_outcome,
            ..
        } => vec![
            format!("Activity \"{title}\" completed!").green().bold().to_string(),
            format!("Expected outcome: {expected_outcome}").grey().to_string(),
            String::new(),
        ],
        RunEvent::StoryCompleted { title, .. } => {
            vec![format!("Story \"{title}\" completed!").green().bold().to_string()]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responded(response: &str) -> RunEvent {
        RunEvent::AgentResponded {
            step_id: "s1".to_string(),
            response: response.to_string(),
        }
    }

    #[test]
    fn previews_cut_at_two_hundred_chars() {
        let long = "x".repeat(250);
        let preview = response_preview(&long);
        assert_eq!(preview.len(), 203);
        assert!(preview.ends_with("..."));
        assert_eq!(response_preview("short"), "short");
    }

    #[test]
    fn minimal_level_hides_step_detail_but_keeps_failures() {
        assert!(render_event(LogLevel::Minimal, &responded("hi")).is_empty());
        let failed = RunEvent::AgentFailed {
            step_id: "s1".to_string(),
            error: "timed out".to_string(),
        };
        let lines = render_event(LogLevel::Minimal, &failed);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Agent execution failed: timed out"));
    }

    #[test]
    fn verbose_level_prints_full_response_and_state() {
        let long = "y".repeat(300);
        let lines = render_event(LogLevel::Verbose, &responded(&long));
        assert!(lines[1].contains(&long));

        let state = RunEvent::CurrentState {
            step_id: "s1".to_string(),
            state: serde_json::json!({"k": 1}),
        };
        assert!(render_event(LogLevel::Normal, &state).is_empty());
        assert!(render_event(LogLevel::Verbose, &state)[0].contains("\"k\": 1"));
    }
}
