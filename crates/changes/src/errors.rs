//! Error type for the change hook.
//!
//! Every [`ChangeHookError`] is fatal for the request that produced it: the
//! hook either returns the complete, ordered set of change records for a push
//! or none at all. There is no per-commit partial success.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CommitId;

/// Errors that abort processing of a push.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ChangeHookError {
    /// The payload is not valid JSON, or is missing a required key, or carries
    /// a value of the wrong shape.
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Description of what was wrong with the payload.
        message: String,
    },

    /// The repository's `scm` value is not one the hook knows how to build a
    /// clone URL for.
    ///
    /// Produced instead of emitting records with an unusable repository URL.
    #[error("Unsupported SCM: '{scm}'")]
    UnsupportedScm {
        /// The `scm` value as it appeared in the payload.
        scm: String,
    },

    /// A commit's `utctimestamp` could not be parsed into a UTC instant.
    #[error("Cannot parse timestamp '{value}' of commit {commit}")]
    TimestampParse {
        /// Short id of the offending commit.
        commit: CommitId,
        /// The raw timestamp string.
        value: String,
    },

    /// The downstream [`crate::ChangeSink`] refused the records.
    #[error("Change sink failed: {message}")]
    Sink {
        /// Description supplied by the sink.
        message: String,
    },
}

impl ChangeHookError {
    /// Creates a [`ChangeHookError::MalformedPayload`] from any displayable cause.
    pub fn malformed(message: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            message: message.to_string(),
        }
    }

    /// Returns `true` if the failure was caused by the payload itself rather
    /// than by the downstream sink.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Self::Sink { .. })
    }
}

impl From<serde_json::Error> for ChangeHookError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err)
    }
}
