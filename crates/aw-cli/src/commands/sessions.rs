//! Sessions command for listing recorded sessions.

use std::io::Write;

use anyhow::Result;

use aw_db::Database;

use super::util::{format_optional_duration, format_optional_timestamp};

pub fn run<W: Write>(writer: &mut W, db: &Database, limit: usize, json: bool) -> Result<()> {
    let sessions = db.list_sessions(limit)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&sessions)?)?;
        return Ok(());
    }

    if sessions.is_empty() {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:>5}  {:<20}  {:<20}  {:<20}  {:>12}  {:>12}",
        "ID", "STARTS", "JOINED", "LEAVE", "ONLINE", "OFFLINE"
    )?;
    for session in sessions {
        writeln!(
            writer,
            "{:>5}  {:<20}  {:<20}  {:<20}  {:>12}  {:>12}",
            session.id,
            format_optional_timestamp(Some(session.starts)),
            format_optional_timestamp(session.joined),
            format_optional_timestamp(session.leave),
            format_optional_duration(session.online_time),
            format_optional_duration(session.offline_time),
        )?;
    }

    Ok(())
}
