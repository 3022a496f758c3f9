//! Completion check for per-game data
//!
//! A game counts as synced once it has at least one play-by-play event and at
//! least one basic box-score line. That is a heuristic: a game with only some
//! box-score periods stored still reads as complete.

use crate::db::Result;
use crate::schema::{box_score_basic, play_by_play};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// True iff both per-game relations hold rows for `game_id`
pub fn is_complete(conn: &mut SqliteConnection, game_id: &str) -> Result<bool> {
    let has_events: bool = diesel::select(exists(
        play_by_play::table.filter(play_by_play::game_id.eq(game_id)),
    ))
    .get_result(conn)?;

    if !has_events {
        return Ok(false);
    }

    let has_box_score: bool = diesel::select(exists(
        box_score_basic::table.filter(box_score_basic::game_id.eq(game_id)),
    ))
    .get_result(conn)?;

    Ok(has_box_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;
    use crate::db::{NewBoxScoreAdvanced, NewBoxScoreBasic, NewPlayByPlayEvent};
    use crate::schema::box_score_advanced;

    fn event(game_id: &str) -> NewPlayByPlayEvent<'_> {
        NewPlayByPlayEvent {
            game_id,
            quarter: "Q1",
            clock: "11:30",
            visitor_action: "Jump shot",
            visitor_pts: Some(2),
            score: "2-0",
            home_pts: Some(0),
            home_action: "--",
        }
    }

    fn basic_line(game_id: &str) -> NewBoxScoreBasic<'_> {
        NewBoxScoreBasic {
            game_id,
            team: "BOS",
            opponent: "NYK",
            game_type: "regular",
            period: "GAME",
            player: "Jane Doe",
            status: "Starter",
            minutes: Some("30:00"),
            fg: None,
            fga: None,
            fg_pct: None,
            three_p: None,
            three_pa: None,
            three_p_pct: None,
            ft: None,
            fta: None,
            ft_pct: None,
            orb: None,
            drb: None,
            trb: None,
            ast: None,
            stl: None,
            blk: None,
            tov: None,
            pf: None,
            pts: Some(20),
            game_score: None,
            plus_minus: None,
        }
    }

    fn advanced_line(game_id: &str) -> NewBoxScoreAdvanced<'_> {
        NewBoxScoreAdvanced {
            game_id,
            team: "BOS",
            opponent: "NYK",
            game_type: "regular",
            period: "GAME",
            player: "Jane Doe",
            status: "Starter",
            minutes: Some("30:00"),
            ts_pct: Some(0.61),
            efg_pct: None,
            three_par: None,
            ftr: None,
            orb_pct: None,
            drb_pct: None,
            trb_pct: None,
            ast_pct: None,
            stl_pct: None,
            blk_pct: None,
            tov_pct: None,
            usg_pct: None,
            off_rating: Some(118),
            def_rating: Some(104),
            bpm: None,
        }
    }

    #[test]
    fn test_empty_game_is_incomplete() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();
        assert!(!is_complete(&mut conn, "G1").unwrap());
    }

    #[test]
    fn test_events_only_is_incomplete() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();
        diesel::insert_into(play_by_play::table)
            .values(&event("G1"))
            .execute(&mut conn)
            .unwrap();
        assert!(!is_complete(&mut conn, "G1").unwrap());
    }

    #[test]
    fn test_box_score_only_is_incomplete() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();
        diesel::insert_into(box_score_basic::table)
            .values(&basic_line("G1"))
            .execute(&mut conn)
            .unwrap();
        assert!(!is_complete(&mut conn, "G1").unwrap());
    }

    #[test]
    fn test_advanced_lines_do_not_count() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();
        diesel::insert_into(play_by_play::table)
            .values(&event("G1"))
            .execute(&mut conn)
            .unwrap();
        diesel::insert_into(box_score_advanced::table)
            .values(&advanced_line("G1"))
            .execute(&mut conn)
            .unwrap();
        assert!(!is_complete(&mut conn, "G1").unwrap());
    }

    #[test]
    fn test_both_present_is_complete() {
        let (_dir, db) = temp_db();
        let mut conn = db.conn().unwrap();
        diesel::insert_into(play_by_play::table)
            .values(&event("G1"))
            .execute(&mut conn)
            .unwrap();
        diesel::insert_into(box_score_basic::table)
            .values(&basic_line("G1"))
            .execute(&mut conn)
            .unwrap();

        assert!(is_complete(&mut conn, "G1").unwrap());
        assert!(!is_complete(&mut conn, "G2").unwrap());
    }
}
