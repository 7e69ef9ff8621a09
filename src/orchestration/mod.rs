pub mod confirm;
pub mod error;
pub mod events;
pub mod state;
pub mod step_execution;
pub mod story_runner;

pub use confirm::{read_confirmation, AutoApprove, StepConfirmer, TerminalConfirmer};
pub use error::RunError;
pub use events::{
    CollectingObserver, FanOutObserver, RunEvent, RunLogObserver, RunObserver, SimulationReason,
};
pub use state::{
    apply_state_update, load_activity_state, StatePatch, LAST_AGENT_RESPONSE_KEY,
    STEP_COMPLETED_KEY, STEP_ERROR_KEY,
};
pub use step_execution::StepDisposition;
pub use story_runner::{RunSummary, StepAgent, StoryRunner};
