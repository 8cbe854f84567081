//! Hands change records to the scheduler as JSON lines.

use async_trait::async_trait;
use changes::{ChangeHookError, ChangeRecord, ChangeSink, PushChanges, ScmKind};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// One output line: a change record tagged with its repository's SCM flavour.
#[derive(Serialize)]
struct ChangeLine<'a> {
    scm: ScmKind,
    #[serde(flatten)]
    change: &'a ChangeRecord,
}

/// A [`ChangeSink`] writing one JSON object per change record.
///
/// The lines of one push are written under a single lock and flushed together,
/// so pushes processed concurrently never interleave.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W> {
    /// Creates a sink writing to `writer` (stdout in the binary).
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

fn sink_error(err: impl std::fmt::Display) -> ChangeHookError {
    ChangeHookError::Sink {
        message: err.to_string(),
    }
}

#[async_trait]
impl<W> ChangeSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn add_changes(&self, changes: &PushChanges) -> Result<(), ChangeHookError> {
        let mut buffer = Vec::new();
        for change in &changes.records {
            let line = ChangeLine {
                scm: changes.scm,
                change,
            };
            serde_json::to_writer(&mut buffer, &line).map_err(sink_error)?;
            buffer.push(b'\n');
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(&buffer).await.map_err(sink_error)?;
        writer.flush().await.map_err(sink_error)?;

        tracing::debug!(count = changes.len(), "Handed changes to scheduler");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use changes::ChangeHook;

    const PAYLOAD: &str = r#"{
        "canon_url": "https://bitbucket.org",
        "repository": {"scm": "hg", "absolute_url": "/marcus/project-x/"},
        "commits": [
            {"node": "aaa", "raw_node": "aaa111", "parents": [], "branch": null,
             "utctimestamp": "2015-03-09 11:33:42+00:00"},
            {"node": "bbb", "raw_node": "bbb222", "parents": ["aaa"], "branch": "default",
             "utctimestamp": "2015-03-09 11:34:42+00:00"}
        ]
    }"#;

    #[tokio::test]
    async fn test_writes_one_line_per_record() {
        let changes = ChangeHook::default().process(PAYLOAD, Some("px")).unwrap();
        let sink = JsonLinesSink::new(Vec::new());

        sink.add_changes(&changes).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["scm"], "hg");
        assert_eq!(lines[0]["revision"], "aaa111");
        assert_eq!(lines[0]["branch"], "default");
        assert_eq!(lines[1]["revision"], "bbb222");
        assert_eq!(lines[1]["repository"], "https://bitbucket.org/marcus/project-x/");
        assert_eq!(lines[1]["project"], "px");
    }
}
