//! Full-refresh loaders for season stats and the schedule
//!
//! Both tables are re-fetched wholesale on every run. Season stats replace the
//! previous snapshot; schedule rows are appended. Each load runs in a single
//! transaction so a failure leaves the previous state untouched.

use crate::coerce::{attendance, cell, is_rank, lenient_int, lenient_real};
use crate::db::{DbError, NewScheduledGame, NewSeasonStat, Result};
use crate::schema::{player_season_stats, schedule};
use crate::source::RawRow;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// Schedule rows shorter than this are dropped
pub const MIN_SCHEDULE_CELLS: usize = 7;

/// Normalize one season-stat row. `None` for header/filler rows.
pub fn season_stat_from_row(row: &[String]) -> Option<NewSeasonStat<'_>> {
    if !is_rank(cell(row, 0)) {
        return None;
    }

    let text = |i: usize| row.get(i).map(String::as_str);
    let real = |i: usize| lenient_real(cell(row, i));

    Some(NewSeasonStat {
        rank: lenient_int(cell(row, 0)),
        player: text(1),
        age: lenient_int(cell(row, 2)),
        team: text(3),
        position: text(4),
        games: lenient_int(cell(row, 5)),
        games_started: lenient_int(cell(row, 6)),
        minutes: real(7),
        fg: real(8),
        fga: real(9),
        fg_pct: real(10),
        three_p: real(11),
        three_pa: real(12),
        three_p_pct: real(13),
        two_p: real(14),
        two_pa: real(15),
        two_p_pct: real(16),
        efg_pct: real(17),
        ft: real(18),
        fta: real(19),
        ft_pct: real(20),
        orb: real(21),
        drb: real(22),
        trb: real(23),
        ast: real(24),
        stl: real(25),
        blk: real(26),
        tov: real(27),
        pf: real(28),
        pts: real(29),
    })
}

/// Replace the season-stat snapshot with `rows` (first row is the header)
pub fn load_season_stats(conn: &mut SqliteConnection, rows: &[RawRow]) -> Result<usize> {
    let stats: Vec<NewSeasonStat<'_>> = rows
        .iter()
        .skip(1)
        .filter_map(|row| season_stat_from_row(row))
        .collect();

    conn.transaction::<_, DbError, _>(|conn| {
        let removed = diesel::delete(player_season_stats::table).execute(conn)?;
        for stat in &stats {
            diesel::insert_into(player_season_stats::table)
                .values(stat)
                .execute(conn)?;
        }
        tracing::debug!(removed, inserted = stats.len(), "season stats replaced");
        Ok(stats.len())
    })
}

/// Normalize one schedule row. `None` when the row is too short.
pub fn scheduled_game_from_row(row: &[String]) -> Option<NewScheduledGame<'_>> {
    if row.len() < MIN_SCHEDULE_CELLS {
        return None;
    }

    let text = |i: usize| row.get(i).map(String::as_str);

    Some(NewScheduledGame {
        game_date: text(0),
        start_time: text(1),
        visitor: text(2),
        visitor_pts: lenient_int(cell(row, 3)),
        home: text(4),
        home_pts: lenient_int(cell(row, 5)),
        box_score: text(6),
        notes: text(7),
        attendance: attendance(cell(row, 8)),
        length_of_game: text(9),
        arena: text(10),
    })
}

/// Append every usable schedule row. No natural key is enforced here; the
/// table itself is rebuilt when the store is opened.
pub fn load_schedule(conn: &mut SqliteConnection, rows: &[RawRow]) -> Result<usize> {
    let games: Vec<NewScheduledGame<'_>> = rows
        .iter()
        .filter_map(|row| scheduled_game_from_row(row))
        .collect();
    let skipped = rows.len() - games.len();

    conn.transaction::<_, DbError, _>(|conn| {
        for game in &games {
            diesel::insert_into(schedule::table)
                .values(game)
                .execute(conn)?;
        }
        tracing::debug!(inserted = games.len(), skipped, "schedule rows appended");
        Ok(games.len())
    })
}
