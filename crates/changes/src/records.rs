//! Change record construction.
//!
//! A [`ChangeRecord`] is what the build scheduler sees of a commit. Records are
//! produced in the same order as the commits they describe, and either all of
//! a push's records are built or none are.

use serde::{Deserialize, Serialize};

use crate::{
    BranchName, ChangeHookError, CommitNode, RepositoryDescriptor, Revision, ScmKind, Timestamp,
};

/// SSH user and host git clone specs are built against.
pub const DEFAULT_SSH_HOST: &str = "git@bitbucket.org";

/// One commit, as handed to the build scheduler.
///
/// Field names on the wire follow the scheduler's change dictionary
/// (`when_timestamp`, `revlink`, `repository`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Commit author as `Name <email>`.
    pub author: String,

    /// Paths of the files touched, in payload order.
    pub files: Vec<String>,

    /// Commit message.
    pub comments: String,

    /// Full commit identifier.
    pub revision: Revision,

    /// When the commit was made.
    #[serde(rename = "when_timestamp")]
    pub when: Timestamp,

    /// Resolved branch; `None` when no tip in the push reaches the commit.
    pub branch: Option<BranchName>,

    /// Web link to the commit.
    #[serde(rename = "revlink")]
    pub revision_link: String,

    /// URL the scheduler's build steps clone from.
    #[serde(rename = "repository")]
    pub repository_url: String,

    /// Caller-supplied project tag; empty when none was given.
    pub project: String,
}

/// Builds [`ChangeRecord`]s for a resolved push.
#[derive(Debug, Clone)]
pub struct ChangeRecordBuilder {
    ssh_host: String,
}

impl Default for ChangeRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeRecordBuilder {
    /// Creates a builder that clones git repositories from [`DEFAULT_SSH_HOST`].
    pub fn new() -> Self {
        Self {
            ssh_host: DEFAULT_SSH_HOST.to_string(),
        }
    }

    /// Sets the `user@host` prefix of git clone specs.
    pub fn ssh_host(mut self, host: impl Into<String>) -> Self {
        self.ssh_host = host.into();
        self
    }

    /// Derives the clone URL of a repository.
    ///
    /// - git: `<ssh_host>:<owner>/<repo>.git`, built from `absolute_url` with
    ///   its surrounding slashes removed.
    /// - hg: the repository's web URL, verbatim.
    ///
    /// # Errors
    ///
    /// [`ChangeHookError::UnsupportedScm`] for any other `scm` value.
    pub fn clone_url(&self, repository: &RepositoryDescriptor) -> Result<String, ChangeHookError> {
        Ok(match repository.scm_kind()? {
            ScmKind::Git => format!(
                "{}:{}.git",
                self.ssh_host,
                repository.absolute_url.trim_matches('/')
            ),
            ScmKind::Mercurial => repository.web_url(),
        })
    }

    /// Builds one record per commit, preserving order.
    ///
    /// # Errors
    ///
    /// - [`ChangeHookError::UnsupportedScm`] when no clone URL can be derived.
    /// - [`ChangeHookError::TimestampParse`] when any commit's UTC timestamp is
    ///   unparseable. No records are returned in that case.
    pub fn build(
        &self,
        repository: &RepositoryDescriptor,
        commits: &[CommitNode],
    ) -> Result<Vec<ChangeRecord>, ChangeHookError> {
        let repository_url = self.clone_url(repository)?;
        let web_url = repository.web_url();
        let project = repository.project.clone().unwrap_or_default();

        let records = commits
            .iter()
            .map(|commit| -> Result<ChangeRecord, ChangeHookError> {
                let when = Timestamp::parse_utc(&commit.timestamp_utc).ok_or_else(|| {
                    ChangeHookError::TimestampParse {
                        commit: commit.id.clone(),
                        value: commit.timestamp_utc.clone(),
                    }
                })?;

                let record = ChangeRecord {
                    author: commit.raw_author.clone(),
                    files: commit.files.iter().map(|f| f.path.clone()).collect(),
                    comments: commit.message.clone(),
                    revision: commit.revision.clone(),
                    when,
                    branch: commit.branch.name().cloned(),
                    revision_link: format!("{web_url}commits/{}", commit.revision),
                    repository_url: repository_url.clone(),
                    project: project.clone(),
                };
                tracing::info!(node = %commit.id, "New revision");
                Ok(record)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(count = records.len(), "Received changes from push");
        Ok(records)
    }
}
