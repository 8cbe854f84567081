//! The change hook: payload in, ordered change records out.
//!
//! [`ChangeHook::process`] runs the three stages of the hook in sequence:
//!
//! 1. [`parse_payload`] decodes the push.
//! 2. [`resolve_branches`] attributes branches to every reachable commit.
//! 3. [`ChangeRecordBuilder::build`] turns each commit into a [`ChangeRecord`].
//!
//! Processing is synchronous, holds no state between calls, and is atomic: a
//! failure at any stage returns the error and no records.

use serde::{Deserialize, Serialize};

use crate::{
    parse_payload, resolve_branches, ChangeHookError, ChangeRecord, ChangeRecordBuilder,
    RequestId, ScmKind, DEFAULT_SSH_HOST,
};

/// Settings for a [`ChangeHook`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeHookConfig {
    /// `user@host` prefix of git clone specs.
    pub ssh_host: String,
}

impl Default for ChangeHookConfig {
    fn default() -> Self {
        Self {
            ssh_host: DEFAULT_SSH_HOST.to_string(),
        }
    }
}

/// The outcome of processing one push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushChanges {
    /// One record per commit, in push order.
    pub records: Vec<ChangeRecord>,

    /// Flavour of the pushed repository.
    pub scm: ScmKind,
}

impl PushChanges {
    /// Returns `true` if the push contained no commits.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of change records.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Converts push payloads into change records.
#[derive(Debug, Clone, Default)]
pub struct ChangeHook {
    builder: ChangeRecordBuilder,
}

impl ChangeHook {
    /// Creates a hook from its configuration.
    pub fn new(config: ChangeHookConfig) -> Self {
        Self {
            builder: ChangeRecordBuilder::new().ssh_host(config.ssh_host),
        }
    }

    /// Processes one push payload.
    ///
    /// `project` is the caller-supplied project tag; records carry an empty
    /// project when it is `None`.
    ///
    /// # Errors
    ///
    /// Any [`ChangeHookError`] raised while decoding, or while building a
    /// record. The push is rejected as a whole.
    pub fn process(
        &self,
        payload: &str,
        project: Option<&str>,
    ) -> Result<PushChanges, ChangeHookError> {
        let request_id = RequestId::new_random();
        let span = tracing::info_span!("process_push", %request_id);
        let _entered = span.enter();

        let mut push = parse_payload(payload, project)?;
        let stats = resolve_branches(&mut push.commits);
        tracing::debug!(
            seeds = stats.seeds,
            assigned = stats.assigned,
            edges = stats.edges_examined,
            "Resolved branches"
        );

        let records = self.builder.build(&push.repository, &push.commits)?;
        let scm = push.repository.scm_kind()?;

        Ok(PushChanges { records, scm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "canon_url": "https://bitbucket.org",
        "repository": {"scm": "git", "absolute_url": "/marcus/project-x/"},
        "commits": [
            {"node": "38b7a5407d93", "raw_node": "38b7a5407d93087a789ba9c318ddc979e825e2a3",
             "parents": [], "branch": null, "raw_author": "Marcus Bertrand <marcus@somedomain.com>",
             "message": "initial commit\n", "files": [{"type": "added", "file": "foo"}],
             "utctimestamp": "2015-03-09 11:33:42+00:00"},
            {"node": "2efbe7294727", "raw_node": "2efbe7294727a8db7a1fd1e54b14fe5a267e1175",
             "parents": ["38b7a5407d93"], "branch": "master",
             "raw_author": "Marcus Bertrand <marcus@somedomain.com>",
             "message": "2nd commit\n", "files": [{"type": "modified", "file": "foo"}],
             "utctimestamp": "2015-03-09 11:34:31+00:00"}
        ]
    }"#;

    #[test]
    fn test_process_resolves_and_builds() {
        let changes = ChangeHook::default().process(PAYLOAD, Some("px")).unwrap();

        assert_eq!(changes.scm, ScmKind::Git);
        assert_eq!(changes.len(), 2);
        for record in &changes.records {
            assert_eq!(record.branch.as_ref().map(|b| b.as_str()), Some("master"));
            assert_eq!(record.project, "px");
        }
        assert_eq!(
            changes.records[0].revision.as_str(),
            "38b7a5407d93087a789ba9c318ddc979e825e2a3"
        );
    }

    #[test]
    fn test_configured_ssh_host_is_used() {
        let hook = ChangeHook::new(ChangeHookConfig {
            ssh_host: "git@git.example.com".to_string(),
        });
        let changes = hook.process(PAYLOAD, None).unwrap();
        assert_eq!(
            changes.records[0].repository_url,
            "git@git.example.com:marcus/project-x.git"
        );
    }

    #[test]
    fn test_errors_yield_no_records() {
        let broken = PAYLOAD.replace("2015-03-09 11:34:31+00:00", "soon");
        let err = ChangeHook::default().process(&broken, None).unwrap_err();
        assert!(matches!(err, ChangeHookError::TimestampParse { .. }));
    }
}
