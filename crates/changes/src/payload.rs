//! Push payload decoding.
//!
//! Turns the JSON body posted by the hosting service into a
//! [`RepositoryDescriptor`] and an ordered list of [`CommitNode`]s. The order
//! of commits is the push order and is carried through to the change records
//! untouched.
//!
//! Decoding is all-or-nothing: a missing required key, a value of the wrong
//! shape, an empty identifier, or a repeated commit id fails the whole payload
//! with [`ChangeHookError::MalformedPayload`].

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::{BranchState, ChangeHookError, CommitId, FileChange, Revision};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPayload {
    canon_url: String,
    repository: RawRepository,
    commits: Vec<RawCommit>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    scm: String,
    absolute_url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    node: String,
    raw_node: String,
    parents: Vec<String>,
    utctimestamp: String,
    #[serde(default, deserialize_with = "present")]
    branch: Option<Option<String>>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    raw_author: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    files: Vec<FileChange>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Wraps a present value (including `null`) in `Some`, so that a missing key
/// (`#[serde(default)]` → `None`) stays distinguishable from an explicit null.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Domain shapes
// ---------------------------------------------------------------------------

/// The repository a push was made to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    /// The `scm` tag exactly as sent (`"git"`, `"hg"`, ...).
    ///
    /// Kept raw here; [`RepositoryDescriptor::scm_kind`] validates it.
    pub scm: String,

    /// Base URL of the hosting service (the payload's `canon_url`).
    pub canonical_url: String,

    /// Path identifying the repository, e.g. `/marcus/project-x/`.
    pub absolute_url: String,

    /// Human-readable repository name, when the payload carries one.
    pub name: Option<String>,

    /// Repository owner, when the payload carries one.
    pub owner: Option<String>,

    /// Caller-supplied project tag.
    pub project: Option<String>,
}

impl RepositoryDescriptor {
    /// Returns the validated SCM flavour.
    ///
    /// # Errors
    ///
    /// [`ChangeHookError::UnsupportedScm`] when the tag is not recognised.
    pub fn scm_kind(&self) -> Result<crate::ScmKind, ChangeHookError> {
        self.scm.parse()
    }

    /// Returns the repository's web URL (`canon_url` + `absolute_url`).
    pub fn web_url(&self) -> String {
        format!("{}{}", self.canonical_url, self.absolute_url)
    }
}

/// One commit of a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    /// Short id; unique within the push.
    pub id: CommitId,

    /// Full id.
    pub revision: Revision,

    /// Short ids of the parent commits, in payload order. Empty for a root.
    ///
    /// Parents outside the push are kept; resolution simply stops at them.
    pub parents: Vec<CommitId>,

    /// Branch attribution; filled in by [`crate::resolve_branches`].
    pub branch: BranchState,

    /// Account name of the author.
    pub author: String,

    /// Author as recorded in the commit (`Name <email>`).
    pub raw_author: String,

    /// Commit message.
    pub message: String,

    /// Files touched, in payload order.
    pub files: Vec<FileChange>,

    /// Local-time timestamp string, informational only.
    pub timestamp_local: Option<String>,

    /// UTC timestamp string; parsed when the change record is built.
    pub timestamp_utc: String,
}

/// A decoded push: where it went and what it contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPush {
    /// The pushed-to repository.
    pub repository: RepositoryDescriptor,

    /// Commits in push order.
    pub commits: Vec<CommitNode>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Decodes a push payload.
///
/// `project` is the caller-supplied project tag; it is carried on the
/// [`RepositoryDescriptor`] unchanged.
///
/// # Errors
///
/// [`ChangeHookError::MalformedPayload`] if the payload is not JSON, lacks a
/// required key (`canon_url`, `repository.scm`, `repository.absolute_url`,
/// `commits`, and per commit `node`, `raw_node`, `parents`, `utctimestamp`),
/// has an empty commit identifier, or repeats a commit id.
pub fn parse_payload(
    payload: &str,
    project: Option<&str>,
) -> Result<ParsedPush, ChangeHookError> {
    let raw: RawPayload = serde_json::from_str(payload)?;

    let repository = RepositoryDescriptor {
        scm: raw.repository.scm,
        canonical_url: raw.canon_url,
        absolute_url: raw.repository.absolute_url,
        name: raw.repository.name,
        owner: raw.repository.owner,
        project: project.map(str::to_string),
    };

    let mut seen = HashSet::with_capacity(raw.commits.len());
    let mut commits = Vec::with_capacity(raw.commits.len());
    for (index, commit) in raw.commits.into_iter().enumerate() {
        let node = convert_commit(index, commit)?;
        if !seen.insert(node.id.clone()) {
            return Err(ChangeHookError::malformed(format_args!(
                "commit id {} appears more than once",
                node.id
            )));
        }
        commits.push(node);
    }

    tracing::debug!(
        scm = %repository.scm,
        repository = %repository.absolute_url,
        commits = commits.len(),
        "Decoded push payload"
    );

    Ok(ParsedPush {
        repository,
        commits,
    })
}

fn convert_commit(index: usize, raw: RawCommit) -> Result<CommitNode, ChangeHookError> {
    let id = CommitId::new(raw.node).ok_or_else(|| {
        ChangeHookError::malformed(format_args!("commits[{index}].node is empty"))
    })?;
    let revision = Revision::new(raw.raw_node).ok_or_else(|| {
        ChangeHookError::malformed(format_args!("commits[{index}].raw_node is empty"))
    })?;
    let parents = raw
        .parents
        .into_iter()
        .map(|parent| {
            CommitId::new(parent).ok_or_else(|| {
                ChangeHookError::malformed(format_args!(
                    "commits[{index}].parents has an empty id"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CommitNode {
        id,
        revision,
        parents,
        branch: BranchState::from_payload(raw.branch),
        author: raw.author.unwrap_or_default(),
        raw_author: raw.raw_author.unwrap_or_default(),
        message: raw.message.unwrap_or_default(),
        files: raw.files,
        timestamp_local: raw.timestamp,
        timestamp_utc: raw.utctimestamp,
    })
}
