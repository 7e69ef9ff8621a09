pub mod error;
pub mod records;
pub mod repository;

pub use error::StorageError;
pub use records::{Activity, ActivityBundle, Step, Story, StoryBundle};
pub use repository::{ImportSummary, StoryStore};
