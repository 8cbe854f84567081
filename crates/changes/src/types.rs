//! Shared value types for the change hook domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! behaviour: the SCM flavour decides how clone URLs are built, timestamps are
//! parsed from the loose formats push payloads use, and [`BranchState`]
//! enforces the one-shot branch assignment performed by branch resolution.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BranchName, ChangeHookError};

// ---------------------------------------------------------------------------
// SCM flavour
// ---------------------------------------------------------------------------

/// The version-control flavour of the pushed repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScmKind {
    /// Git repository; cloned over SSH.
    #[serde(rename = "git")]
    Git,
    /// Mercurial repository; cloned from its web URL.
    #[serde(rename = "hg")]
    Mercurial,
}

impl ScmKind {
    /// Returns the tag used for this flavour in payloads and change records.
    pub fn as_str(self) -> &'static str {
        match self {
            ScmKind::Git => "git",
            ScmKind::Mercurial => "hg",
        }
    }
}

impl FromStr for ScmKind {
    type Err = ChangeHookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(ScmKind::Git),
            "hg" => Ok(ScmKind::Mercurial),
            other => Err(ChangeHookError::UnsupportedScm {
                scm: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ScmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// How a file was touched by a commit.
///
/// Unknown tags are preserved in [`ChangeType::Other`]; they never fail a push.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeType {
    /// The file was created by the commit.
    Added,
    /// The file's content changed.
    Modified,
    /// The file was deleted.
    Removed,
    /// A tag this hook does not interpret, kept verbatim.
    Other(String),
}

impl From<String> for ChangeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "added" => ChangeType::Added,
            "modified" => ChangeType::Modified,
            "removed" => ChangeType::Removed,
            _ => ChangeType::Other(value),
        }
    }
}

impl From<ChangeType> for String {
    fn from(value: ChangeType) -> Self {
        match value {
            ChangeType::Added => "added".to_string(),
            ChangeType::Modified => "modified".to_string(),
            ChangeType::Removed => "removed".to_string(),
            ChangeType::Other(tag) => tag,
        }
    }
}

/// One file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root.
    #[serde(rename = "file")]
    pub path: String,

    /// How the file was touched.
    #[serde(rename = "type")]
    pub change_type: ChangeType,
}

// ---------------------------------------------------------------------------
// Branch attribution
// ---------------------------------------------------------------------------

/// The branch slot of a commit in a push.
///
/// Payloads only name the branch on tip commits. Everything else arrives as
/// [`BranchState::Null`] (or [`BranchState::Absent`] when the key is missing)
/// and may later be filled in exactly once by branch resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchState {
    /// The payload had no `branch` key for this commit.
    Absent,
    /// The payload had `branch: null` (or an empty string).
    Null,
    /// The payload named the branch; this commit is a branch tip.
    Tip(BranchName),
    /// The branch was inferred from a descendant tip during resolution.
    Inherited(BranchName),
}

impl BranchState {
    /// Builds the state for a raw payload value.
    ///
    /// `None` means the key was absent; `Some(None)` means it was `null`.
    pub fn from_payload(value: Option<Option<String>>) -> Self {
        match value {
            None => BranchState::Absent,
            Some(raw) => match raw.and_then(BranchName::new) {
                Some(name) => BranchState::Tip(name),
                None => BranchState::Null,
            },
        }
    }

    /// Returns the branch name, if one is known.
    pub fn name(&self) -> Option<&BranchName> {
        match self {
            BranchState::Tip(name) | BranchState::Inherited(name) => Some(name),
            BranchState::Absent | BranchState::Null => None,
        }
    }

    /// Returns `true` if no branch has been attributed yet.
    pub fn is_unset(&self) -> bool {
        self.name().is_none()
    }

    /// Assigns an inherited branch if, and only if, the slot is still unset.
    ///
    /// Returns `true` when the assignment took place.
    pub fn inherit(&mut self, name: &BranchName) -> bool {
        if !self.is_unset() {
            return false;
        }
        *self = BranchState::Inherited(name.clone());
        true
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

/// Offset-carrying layouts seen in push payloads, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Offset-less layouts; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl Timestamp {
    /// Parses an ISO-like timestamp such as `2012-05-30 03:58:56+00:00`.
    ///
    /// Accepts RFC 3339, a space in place of the `T` separator, fractional
    /// seconds, and `+hh:mm` or `+hhmm` offsets. A value with no offset is
    /// taken to already be UTC. Returns `None` for anything else.
    pub fn parse_utc(value: &str) -> Option<Self> {
        let value = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(Self(dt.with_timezone(&Utc)));
        }

        if let Some(dt) = OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
        {
            return Some(Self(dt.with_timezone(&Utc)));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .map(|naive| Self(naive.and_utc()))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scm_kind_from_wire_tag() {
        assert_eq!("git".parse::<ScmKind>().unwrap(), ScmKind::Git);
        assert_eq!("hg".parse::<ScmKind>().unwrap(), ScmKind::Mercurial);
        assert_eq!(ScmKind::Mercurial.to_string(), "hg");
    }

    #[test]
    fn test_unknown_scm_is_rejected() {
        let err = "svn".parse::<ScmKind>().unwrap_err();
        assert!(matches!(err, ChangeHookError::UnsupportedScm { scm } if scm == "svn"));
        assert!("Git".parse::<ScmKind>().is_err());
    }

    #[test]
    fn test_payload_timestamp_with_colon_offset() {
        let ts = Timestamp::parse_utc("2012-05-30 03:58:56+00:00").unwrap();
        assert_eq!(ts.as_datetime().timestamp(), 1_338_350_336);
    }

    #[test]
    fn test_non_utc_offset_is_normalised() {
        let local = Timestamp::parse_utc("2015-03-09 12:33:42+01:00").unwrap();
        let utc = Timestamp::parse_utc("2015-03-09T11:33:42Z").unwrap();
        assert_eq!(local, utc);
    }

    #[test]
    fn test_compact_offset_and_fraction() {
        let ts = Timestamp::parse_utc("2012-05-30 03:58:56.250+0000").unwrap();
        assert_eq!(ts.as_datetime().timestamp(), 1_338_350_336);
        assert_eq!(ts.as_datetime().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_naive_timestamp_is_taken_as_utc() {
        let ts = Timestamp::parse_utc("2012-05-30 03:58:56").unwrap();
        assert_eq!(ts.as_datetime().timestamp(), 1_338_350_336);
    }

    #[test]
    fn test_garbage_timestamp_is_rejected() {
        assert!(Timestamp::parse_utc("yesterday").is_none());
        assert!(Timestamp::parse_utc("").is_none());
        assert!(Timestamp::parse_utc("2012-13-40 03:58:56+00:00").is_none());
    }

    #[test]
    fn test_change_type_keeps_unknown_tags() {
        let files: Vec<FileChange> = serde_json::from_str(
            r#"[{"file": "a", "type": "added"}, {"file": "b", "type": "renamed"}]"#,
        )
        .unwrap();
        assert_eq!(files[0].change_type, ChangeType::Added);
        assert_eq!(files[1].change_type, ChangeType::Other("renamed".into()));
    }

    #[test]
    fn test_branch_state_from_payload() {
        assert_eq!(BranchState::from_payload(None), BranchState::Absent);
        assert_eq!(BranchState::from_payload(Some(None)), BranchState::Null);
        assert_eq!(
            BranchState::from_payload(Some(Some(String::new()))),
            BranchState::Null
        );
        let tip = BranchState::from_payload(Some(Some("master".into())));
        assert_eq!(tip.name().map(BranchName::as_str), Some("master"));
    }

    #[test]
    fn test_branch_is_inherited_at_most_once() {
        let first = BranchName::new("branch2").unwrap();
        let second = BranchName::new("branch3").unwrap();

        let mut state = BranchState::Null;
        assert!(state.inherit(&first));
        assert!(!state.inherit(&second));
        assert_eq!(state, BranchState::Inherited(first));

        let mut tip = BranchState::Tip(second.clone());
        assert!(!tip.inherit(&BranchName::new("other").unwrap()));
        assert_eq!(tip, BranchState::Tip(second));
    }
}
