//! Newline-delimited JSON gateway event feed.
//!
//! Each non-blank line holds one [`GatewayEvent`]:
//!
//! ```json
//! {"type":"ready"}
//! {"type":"presence_update","user_id":"861974078431821885","old_presence":null,"presence":{"visible_status":"online"}}
//! ```

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use aw_core::GatewayEvent;

/// Counters for one pass over a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub forwarded: usize,
    pub skipped: usize,
}

/// Parses one feed line. Blank lines yield `None`.
pub fn parse_event_line(line: &str) -> Result<Option<GatewayEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(trimmed).context("invalid gateway event")?;
    Ok(Some(event))
}

/// Reads events from `reader` and forwards them to `sender` until EOF.
///
/// Malformed lines are logged and skipped. Returns early, without error, if
/// the receiving side has gone away.
pub async fn forward_events<R>(reader: R, sender: mpsc::Sender<GatewayEvent>) -> Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("failed to read line {}", line_number + 1))?
    {
        line_number += 1;
        match parse_event_line(&line) {
            Ok(Some(event)) => {
                if sender.send(event).await.is_err() {
                    tracing::debug!(line = line_number, "event receiver closed");
                    break;
                }
                stats.forwarded += 1;
            }
            Ok(None) => {}
            Err(err) => {
                stats.skipped += 1;
                tracing::warn!(line = line_number, error = %format!("{err:#}"), "skipping malformed event");
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    use aw_core::Status;

    #[test]
    fn parse_event_line_skips_blank_lines() {
        assert!(parse_event_line("   ").unwrap().is_none());
    }

    #[test]
    fn parse_event_line_reads_presence_update() {
        let line = r#"{"type":"presence_update","user_id":"5","old_presence":{"visible_status":"offline"},"presence":{"visible_status":"online"}}"#;
        let Some(GatewayEvent::PresenceUpdate(update)) = parse_event_line(line).unwrap() else {
            panic!("expected presence update");
        };
        assert_eq!(update.old_status(), Some(Status::Offline));
        assert_eq!(update.new_status(), Status::Online);
    }

    #[test]
    fn parse_event_line_rejects_garbage() {
        let err = parse_event_line("{not json").unwrap_err();
        assert!(err.to_string().contains("invalid gateway event"));
    }

    #[tokio::test]
    async fn forward_events_skips_malformed_lines() {
        let input = concat!(
            "{\"type\":\"ready\"}\n",
            "\n",
            "garbage\n",
            "{\"type\":\"presence_update\",\"user_id\":\"5\",\"presence\":{\"visible_status\":\"idle\"}}\n",
        );
        let (tx, mut rx) = mpsc::channel(8);

        let stats = forward_events(input.as_bytes(), tx).await.unwrap();
        assert_eq!(
            stats,
            FeedStats {
                forwarded: 2,
                skipped: 1,
            }
        );

        assert_eq!(rx.recv().await, Some(GatewayEvent::Ready));
        assert!(matches!(
            rx.recv().await,
            Some(GatewayEvent::PresenceUpdate(_))
        ));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn forward_events_stops_when_receiver_is_dropped() {
        let input = "{\"type\":\"ready\"}\n{\"type\":\"ready\"}\n";
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let stats = forward_events(input.as_bytes(), tx).await.unwrap();
        assert_eq!(stats.forwarded, 0);
    }
}
