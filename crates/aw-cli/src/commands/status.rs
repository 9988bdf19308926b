//! Status command for showing the latest session and accumulated totals.

use std::io::Write;

use anyhow::Result;

use aw_db::Database;

use super::util::{format_duration, format_optional_duration, format_optional_timestamp};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<()> {
    let totals = db.session_totals()?;

    writeln!(writer, "Presence watcher status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Watching: {}", config.watched_user_id)?;

    let Some(latest) = db.latest_session()? else {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    };

    writeln!(writer, "Sessions: {}", totals.sessions)?;
    writeln!(writer, "Latest session:")?;
    writeln!(
        writer,
        "  starts:  {}",
        format_optional_timestamp(Some(latest.starts))
    )?;
    writeln!(
        writer,
        "  joined:  {}",
        format_optional_timestamp(latest.joined)
    )?;
    writeln!(
        writer,
        "  leave:   {}",
        format_optional_timestamp(latest.leave)
    )?;
    writeln!(
        writer,
        "  online:  {}",
        format_optional_duration(latest.online_time)
    )?;
    writeln!(
        writer,
        "  offline: {}",
        format_optional_duration(latest.offline_time)
    )?;
    writeln!(
        writer,
        "Total online:  {}",
        format_duration(totals.online_time)
    )?;
    writeln!(
        writer,
        "Total offline: {}",
        format_duration(totals.offline_time)
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};
    use insta::assert_snapshot;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn status_command_reports_empty_database() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("aw.db");
        let db = Database::open(&db_path).unwrap();
        let config = Config {
            database_path: db_path.clone(),
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &db, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/aw.db");
        assert_snapshot!(output, @r"
        Presence watcher status
        Database: [TEMP]/aw.db
        Watching: 861974078431821885
        No sessions recorded.
        ");
    }

    #[test]
    fn status_command_outputs_latest_session_and_totals() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("aw.db");
        let mut db = Database::open(&db_path).unwrap();

        db.record_started_at(ts("2025-01-01T00:00:00Z")).unwrap();
        db.record_stopped_at(ts("2025-01-01T01:00:00Z")).unwrap();
        db.record_started_at(ts("2025-01-01T01:30:00Z")).unwrap();
        db.record_stopped_at(ts("2025-01-01T01:45:10Z")).unwrap();

        let config = Config {
            database_path: db_path.clone(),
            ..Config::default()
        };
        let starts = format_optional_timestamp(Some(db.latest_session().unwrap().unwrap().starts));

        let mut output = Vec::new();
        run(&mut output, &db, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output
            .replace(&db_path.display().to_string(), "[TEMP]/aw.db")
            .replace(&starts, "[STARTS]");
        assert_snapshot!(output, @r"
        Presence watcher status
        Database: [TEMP]/aw.db
        Watching: 861974078431821885
        Sessions: 2
        Latest session:
          starts:  [STARTS]
          joined:  2025-01-01T01:30:00Z
          leave:   2025-01-01T01:45:10Z
          online:  15m 10s
          offline: 30m 00s
        Total online:  1h 15m 10s
        Total offline: 30m 00s
        ");
    }
}
