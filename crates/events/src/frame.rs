//! Gateway frames carrying interactions.

use async_trait::async_trait;
use bookclub_kernel::interaction::Interaction;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

const DISPATCH: u8 = 0;
const INTERACTION_CREATE: &str = "INTERACTION_CREATE";

#[derive(Debug, Deserialize)]
struct DispatchEnvelope {
    op: u8,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    d: Option<Value>,
}

/// Decode one frame. Accepts a dispatch envelope or a bare interaction;
/// returns `None` for frames that carry no interaction.
pub fn parse_frame(text: &str) -> Result<Option<Interaction>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    if value.get("op").is_none() {
        return serde_json::from_value(value).map(Some);
    }

    let envelope: DispatchEnvelope = serde_json::from_value(value)?;
    match (envelope.op, envelope.t.as_deref(), envelope.d) {
        (DISPATCH, Some(INTERACTION_CREATE), Some(d)) => serde_json::from_value(d).map(Some),
        (op, t, _) => {
            tracing::debug!(op, t = ?t, "ignoring gateway frame");
            Ok(None)
        }
    }
}

/// Stream of interactions delivered by the live session.
#[async_trait]
pub trait FrameSource: Send {
    /// Next interaction, or `None` once the session has closed.
    async fn next_interaction(&mut self) -> anyhow::Result<Option<Interaction>>;
}

/// Newline-delimited JSON frames from any async reader.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for LineSource<R> {
    async fn next_interaction(&mut self) -> anyhow::Result<Option<Interaction>> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_frame(line) {
                Ok(Some(interaction)) => return Ok(Some(interaction)),
                Ok(None) => continue,
                Err(err) => tracing::warn!(error = %err, "dropping malformed gateway frame"),
            }
        }
        Ok(None)
    }
}
