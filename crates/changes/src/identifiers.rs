//! Newtype domain identifiers.
//!
//! A push payload carries several string-shaped identities that must never be
//! mixed up: the short node id used for parent links, the full revision hash
//! handed to the scheduler, and branch names. Each gets its own newtype so a
//! [`CommitId`] can't be passed where a [`Revision`] is expected even though
//! both are `String` under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// Deserialize that goes through new() so empty values are rejected there too.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = &'static str;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(concat!(stringify!($name), " must not be empty"))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (payload supplied)
// ---------------------------------------------------------------------------

string_id! {
    /// Short commit identifier (the payload's `node`, e.g. `"620ade18607a"`).
    ///
    /// Unique within one push. Parent links refer to commits by this id.
    CommitId
}

string_id! {
    /// Full commit identifier (the payload's `raw_node`, 40 hex characters).
    ///
    /// This is what the scheduler receives as the change's revision.
    Revision
}

string_id! {
    /// A branch name (e.g. `"master"`, `"feature/login"`).
    ///
    /// Payloads encode "no branch" as `null` or `""`; neither ever becomes a
    /// [`BranchName`].
    BranchName
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one webhook request as it flows through the hook.
///
/// Generated fresh for every payload processed; recorded on the processing span
/// so all events from a single push can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
