//! Core domain of pushhook.
//!
//! Converts the push notification posted by a hosted version-control service
//! into an ordered list of change records for a continuous-integration
//! scheduler. The interesting part is branch inference: the payload only names
//! the branch of each tip commit, so the branch of every other commit in the
//! push is reconstructed by walking parent links.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! The HTTP receiver lives in `listener`; the scheduler is reached through the
//! [`ChangeSink`] trait.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CommitId`, `Revision`, `BranchName`, `RequestId`) |
//! | [`types`] | Value types (`ScmKind`, `Timestamp`, `FileChange`, `BranchState`) |
//! | [`errors`] | [`ChangeHookError`] |
//! | [`payload`] | Payload decoding into [`RepositoryDescriptor`] and [`CommitNode`]s |
//! | [`branches`] | Branch propagation from tips to ancestors |
//! | [`records`] | [`ChangeRecord`] construction and clone URL derivation |
//! | [`hook`] | The [`ChangeHook`] orchestrator |
//! | [`sink`] | The [`ChangeSink`] port |

pub mod branches;
pub mod errors;
pub mod hook;
pub mod identifiers;
pub mod payload;
pub mod records;
pub mod sink;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use branches::{resolve_branches, ResolutionStats};
pub use errors::ChangeHookError;
pub use hook::{ChangeHook, ChangeHookConfig, PushChanges};
pub use identifiers::{BranchName, CommitId, RequestId, Revision};
pub use payload::{parse_payload, CommitNode, ParsedPush, RepositoryDescriptor};
pub use records::{ChangeRecord, ChangeRecordBuilder, DEFAULT_SSH_HOST};
pub use sink::ChangeSink;
pub use types::{BranchState, ChangeType, FileChange, ScmKind, Timestamp};
