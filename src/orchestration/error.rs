use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("story not found: {story_id}")]
    StoryNotFound { story_id: String },
    #[error("activity not found: {activity_id}")]
    ActivityNotFound { activity_id: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
