//! Pipeline stage trait

use crate::error::NoteError;
use crate::state::PipelineState;
use async_trait::async_trait;

/// One step of the note pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name (unique within a pipeline)
    fn name(&self) -> &str;

    /// State key this stage reads; checked before `run`
    fn requires(&self) -> &str;

    async fn run(&self, state: &mut PipelineState) -> Result<(), NoteError>;
}

/// Fail with `MissingInput` unless the stage's input key is present
pub fn check_input(stage: &dyn Stage, state: &PipelineState) -> Result<(), NoteError> {
    if state.contains(stage.requires()) {
        Ok(())
    } else {
        Err(NoteError::MissingInput {
            stage: stage.name().to_string(),
            key: stage.requires().to_string(),
        })
    }
}
