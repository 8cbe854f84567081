//! Pushhook trigger event source infrastructure.
//!
//! Receives push webhooks over HTTP and feeds them through the
//! [`changes::ChangeHook`]:
//!
//! - [`HookServer`] builds an [`axum::Router`] exposing the webhook endpoint
//!   (`POST /change_hook/bitbucket` by default) and a `GET /health` probe.
//! - [`serve`] binds the router to a socket and runs it until shutdown.
//!
//! ## Request handling
//!
//! The endpoint reads two `application/x-www-form-urlencoded` fields:
//! `payload` (the push body, required) and `project` (optional tag). Bodies
//! up to [`DEFAULT_BODY_LIMIT`] are accepted unless [`HookServer::body_limit`]
//! says otherwise.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | Push with commits | 200 | empty; records handed to the [`changes::ChangeSink`] |
//! | Push without commits | 200 | `no changes found` |
//! | Any processing failure | 500 | `Error processing changes.` |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details and form decoding live here. The
//! [`changes`] crate sees only a payload string and an optional project tag.

pub mod error;
pub mod server;

pub use error::ListenerError;
pub use server::{
    serve, HookForm, HookServer, DEFAULT_BODY_LIMIT, DEFAULT_HOOK_PATH, ERROR_BODY, HEALTH_PATH, NO_CHANGES_BODY,
};
