//! The port through which change records leave the hook.
//!
//! The build scheduler is not part of this workspace. Whatever ingests change
//! records implements [`ChangeSink`]; the webhook listener hands every
//! non-empty push to it exactly once.

use async_trait::async_trait;

use crate::{ChangeHookError, PushChanges};

/// Receives the change records of processed pushes.
#[async_trait]
pub trait ChangeSink: Send + Sync {
    /// Accepts the records of one push, in push order.
    ///
    /// # Errors
    ///
    /// [`ChangeHookError::Sink`] when the records could not be handed on.
    async fn add_changes(&self, changes: &PushChanges) -> Result<(), ChangeHookError>;
}
