//! Play-by-play normalization
//!
//! One scraped row becomes one `PlaybyPlay` event. Events are keyed by
//! (game, quarter, clock, visitor action, home action); re-inserting a known
//! event is a silent no-op.

use crate::batch::{BatchReport, RowFailure, RowOutcome};
use crate::coerce::signed_delta;
use crate::db::NewPlayByPlayEvent;
use crate::schema::play_by_play;
use crate::source::RawRow;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// Rows shorter than this are ignored
pub const MIN_EVENT_CELLS: usize = 7;

/// Map a row to an event. Layout: quarter, clock, visitor action, visitor
/// points (`+2`), score, home points, home action, ..., game id (last cell).
pub fn event_from_row(row: &[String]) -> Option<NewPlayByPlayEvent<'_>> {
    if row.len() < MIN_EVENT_CELLS {
        return None;
    }

    Some(NewPlayByPlayEvent {
        game_id: row[row.len() - 1].as_str(),
        quarter: row[0].as_str(),
        clock: row[1].as_str(),
        visitor_action: row[2].as_str(),
        visitor_pts: signed_delta(&row[3]),
        score: row[4].as_str(),
        home_pts: signed_delta(&row[5]),
        home_action: row[6].as_str(),
    })
}

fn insert_event(conn: &mut SqliteConnection, event: &NewPlayByPlayEvent<'_>) -> RowOutcome {
    match diesel::insert_or_ignore_into(play_by_play::table)
        .values(event)
        .execute(conn)
    {
        Ok(0) => RowOutcome::Duplicate,
        Ok(_) => RowOutcome::Inserted,
        Err(e) => {
            let failure = RowFailure {
                context: format!("game {} {} {}", event.game_id, event.quarter, event.clock),
                reason: e.to_string(),
            };
            tracing::warn!(game_id = event.game_id, error = %e, "play-by-play row not stored");
            RowOutcome::Failed(failure)
        }
    }
}

/// Normalize and store every event row. Bad rows are reported, never fatal.
pub fn insert_play_by_play(conn: &mut SqliteConnection, rows: &[RawRow]) -> BatchReport {
    let mut report = BatchReport::default();
    for row in rows {
        let outcome = match event_from_row(row) {
            Some(event) => insert_event(conn, &event),
            None => RowOutcome::Skipped,
        };
        report.record(outcome);
    }
    tracing::debug!(%report, "play-by-play batch");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;
    use crate::db::PlayByPlayEvent;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn jump_shot() -> RawRow {
        row(&["Q1", "11:30", "Jump shot", "+2", "2-0", "+0", "--", "TOKEN123"])
    }

    #[test]
    fn test_event_mapping() {
        let r = jump_shot();
        let event = event_from_row(&r).unwrap();
        assert_eq!(event.game_id, "TOKEN123");
        assert_eq!(event.quarter, "Q1");
        assert_eq!(event.clock, "11:30");
        assert_eq!(event.visitor_pts, Some(2));
        assert_eq!(event.home_pts, Some(0));
        assert_eq!(event.score, "2-0");
        assert_eq!(event.home_action, "--");
    }

    #[test]
    fn test_non_numeric_delta_is_null() {
        let r = row(&["Q2", "5:00", "Timeout", "", "10-8", "x", "", "G9"]);
        let event = event_from_row(&r).unwrap();
        assert_eq!(event.visitor_pts, None);
        assert_eq!(event.home_pts, None);
    }

    #[test]
    fn test_dedup_on_reprocessing() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();

        let first = insert_play_by_play(&mut conn, &[jump_shot()]);
        let second = insert_play_by_play(&mut conn, &[jump_shot()]);
        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 1);

        let stored: Vec<PlayByPlayEvent> = play_by_play::table
            .select(PlayByPlayEvent::as_select())
            .load(&mut conn)
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].game_id, "TOKEN123");
        assert_eq!(stored[0].quarter, "Q1");
        assert_eq!(stored[0].clock, "11:30");
        assert_eq!(stored[0].visitor_action, "Jump shot");
        assert_eq!(stored[0].home_action, "--");
    }

    #[test]
    fn test_duplicate_does_not_overwrite() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();

        insert_play_by_play(&mut conn, &[jump_shot()]);
        let mut changed = jump_shot();
        changed[4] = "3-0".to_string();
        let report = insert_play_by_play(&mut conn, &[changed]);
        assert_eq!(report.duplicates, 1);

        let score: String = play_by_play::table
            .select(play_by_play::score)
            .first(&mut conn)
            .unwrap();
        assert_eq!(score, "2-0");
    }

    #[test]
    fn test_short_rows_skipped() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();

        let rows = vec![
            row(&["1st Quarter"]),
            row(&["Q1", "12:00", "Start", "+0", "0-0", "+0"]),
            jump_shot(),
        ];
        let report = insert_play_by_play(&mut conn, &rows);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.inserted, 1);
        assert!(!report.has_failures());

        let count: i64 = play_by_play::table.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 1);
    }
}
