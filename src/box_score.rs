//! Box-score normalization
//!
//! A game's box score arrives as a set of tables, one per team, period and
//! variant. Table keys look like `box-BOS-q1` or `box-BOS-game-advanced`. Every
//! player row, whatever its variant, ends with the same five trailing fields:
//! status, team, opponent, game type, game id. Rows are decoded once into a
//! [`PlayerLine`] so the stat mapping below works on named fields.
//!
//! Lines are keyed by (game, team, player, period) per variant table and are
//! never overwritten.

use crate::batch::{BatchReport, RowFailure, RowOutcome};
use crate::coerce::{strict_int, strict_real, CoerceError};
use crate::db::{NewBoxScoreAdvanced, NewBoxScoreBasic};
use crate::schema::{box_score_advanced, box_score_basic};
use crate::source::{BoxScoreTables, RawRow};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use thiserror::Error;

/// Player name plus the five trailing fields
const FRAME_CELLS: usize = 6;
/// MP followed by 18 counting/shooting stats
const BASIC_STAT_CELLS: usize = 19;
/// MP followed by 15 rate stats
const ADVANCED_STAT_CELLS: usize = 16;

#[derive(Debug, Error)]
pub enum BoxScoreError {
    #[error("table key {0:?} does not look like <table>-<team>-<period>")]
    MalformedKey(String),
    #[error("row has {found} cells, need at least {needed}")]
    ShortRow { found: usize, needed: usize },
    #[error("{field}: {source}")]
    Coerce {
        field: &'static str,
        #[source]
        source: CoerceError,
    },
    #[error("insert failed: {0}")]
    Insert(#[from] diesel::result::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Basic,
    Advanced,
}

/// Decoded `<table>-<team>-<period>[-advanced]` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKey<'a> {
    pub team: &'a str,
    /// Upper-cased for storage: `q1` -> `Q1`, `game` -> `GAME`
    pub period: String,
    pub variant: Variant,
}

impl<'a> TableKey<'a> {
    pub fn parse(key: &'a str) -> Result<Self, BoxScoreError> {
        let parts: Vec<&str> = key.split('-').collect();
        if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
            return Err(BoxScoreError::MalformedKey(key.to_string()));
        }
        let variant = if parts[3..].contains(&"advanced") {
            Variant::Advanced
        } else {
            Variant::Basic
        };
        Ok(Self {
            team: parts[1],
            period: parts[2].to_uppercase(),
            variant,
        })
    }
}

/// One player row with its trailing metadata pulled out by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLine<'a> {
    pub player: &'a str,
    /// Everything between the player name and the trailing fields, MP first
    pub stats: &'a [String],
    pub status: &'a str,
    pub team: &'a str,
    pub opponent: &'a str,
    pub game_type: &'a str,
    pub game_id: &'a str,
}

impl<'a> PlayerLine<'a> {
    pub fn from_cells(cells: &'a [String]) -> Result<Self, BoxScoreError> {
        let n = cells.len();
        if n < FRAME_CELLS {
            return Err(BoxScoreError::ShortRow {
                found: n,
                needed: FRAME_CELLS,
            });
        }
        Ok(Self {
            player: &cells[0],
            stats: &cells[1..n - 5],
            status: &cells[n - 5],
            team: &cells[n - 4],
            opponent: &cells[n - 3],
            game_type: &cells[n - 2],
            game_id: &cells[n - 1],
        })
    }

    fn require(&self, needed: usize) -> Result<(), BoxScoreError> {
        if self.stats.len() < needed {
            return Err(BoxScoreError::ShortRow {
                found: self.stats.len() + FRAME_CELLS,
                needed: needed + FRAME_CELLS,
            });
        }
        Ok(())
    }

    fn minutes(&self) -> Option<&'a str> {
        self.stats.first().map(String::as_str).filter(|mp| !mp.is_empty())
    }

    fn int(&self, index: usize, field: &'static str) -> Result<Option<i32>, BoxScoreError> {
        let raw = self.stats.get(index).map(String::as_str).unwrap_or("");
        strict_int(raw).map_err(|source| BoxScoreError::Coerce { field, source })
    }

    fn real(&self, index: usize, field: &'static str) -> Result<Option<f64>, BoxScoreError> {
        let raw = self.stats.get(index).map(String::as_str).unwrap_or("");
        strict_real(raw).map_err(|source| BoxScoreError::Coerce { field, source })
    }

    pub fn to_basic(&self, period: &'a str) -> Result<NewBoxScoreBasic<'a>, BoxScoreError> {
        self.require(BASIC_STAT_CELLS)?;
        Ok(NewBoxScoreBasic {
            game_id: self.game_id,
            team: self.team,
            opponent: self.opponent,
            game_type: self.game_type,
            period,
            player: self.player,
            status: self.status,
            minutes: self.minutes(),
            fg: self.int(1, "FG")?,
            fga: self.int(2, "FGA")?,
            fg_pct: self.real(3, "FG%")?,
            three_p: self.int(4, "3P")?,
            three_pa: self.int(5, "3PA")?,
            three_p_pct: self.real(6, "3P%")?,
            ft: self.int(7, "FT")?,
            fta: self.int(8, "FTA")?,
            ft_pct: self.real(9, "FT%")?,
            orb: self.int(10, "ORB")?,
            drb: self.int(11, "DRB")?,
            trb: self.int(12, "TRB")?,
            ast: self.int(13, "AST")?,
            stl: self.int(14, "STL")?,
            blk: self.int(15, "BLK")?,
            tov: self.int(16, "TOV")?,
            pf: self.int(17, "PF")?,
            pts: self.int(18, "PTS")?,
            // Only whole-game and some period tables report these two
            game_score: self.real(19, "GmSc")?,
            plus_minus: self.int(20, "+/-")?,
        })
    }

    pub fn to_advanced(&self, period: &'a str) -> Result<NewBoxScoreAdvanced<'a>, BoxScoreError> {
        self.require(ADVANCED_STAT_CELLS)?;
        Ok(NewBoxScoreAdvanced {
            game_id: self.game_id,
            team: self.team,
            opponent: self.opponent,
            game_type: self.game_type,
            period,
            player: self.player,
            status: self.status,
            minutes: self.minutes(),
            ts_pct: self.real(1, "TS%")?,
            efg_pct: self.real(2, "eFG%")?,
            three_par: self.real(3, "3PAr")?,
            ftr: self.real(4, "FTr")?,
            orb_pct: self.real(5, "ORB%")?,
            drb_pct: self.real(6, "DRB%")?,
            trb_pct: self.real(7, "TRB%")?,
            ast_pct: self.real(8, "AST%")?,
            stl_pct: self.real(9, "STL%")?,
            blk_pct: self.real(10, "BLK%")?,
            tov_pct: self.real(11, "TOV%")?,
            usg_pct: self.real(12, "USG%")?,
            off_rating: self.int(13, "ORtg")?,
            def_rating: self.int(14, "DRtg")?,
            bpm: self.real(15, "BPM")?,
        })
    }
}

fn store_row(
    conn: &mut SqliteConnection,
    key: &TableKey<'_>,
    line: &PlayerLine<'_>,
) -> Result<usize, BoxScoreError> {
    let written = match key.variant {
        Variant::Basic => diesel::insert_or_ignore_into(box_score_basic::table)
            .values(&line.to_basic(&key.period)?)
            .execute(conn)?,
        Variant::Advanced => diesel::insert_or_ignore_into(box_score_advanced::table)
            .values(&line.to_advanced(&key.period)?)
            .execute(conn)?,
    };
    Ok(written)
}

fn row_failure(table_key: &str, context: String, error: BoxScoreError) -> RowOutcome {
    tracing::warn!(table = %table_key, row = %context, error = %error, "box-score row not stored");
    RowOutcome::Failed(RowFailure {
        context: format!("table {} {}", table_key, context),
        reason: error.to_string(),
    })
}

fn insert_row(
    conn: &mut SqliteConnection,
    table_key: &str,
    key: &TableKey<'_>,
    row: &RawRow,
) -> RowOutcome {
    let line = match PlayerLine::from_cells(row) {
        Ok(line) => line,
        Err(e) => {
            let player = row.first().map(String::as_str).unwrap_or("");
            return row_failure(table_key, format!("player {:?}", player), e);
        }
    };

    // Stored team comes from the row itself
    if line.team != key.team {
        tracing::debug!(
            table = %table_key,
            row_team = line.team,
            "row team differs from table key team"
        );
    }

    match store_row(conn, key, &line) {
        Ok(0) => RowOutcome::Duplicate,
        Ok(_) => RowOutcome::Inserted,
        Err(e) => {
            let context = format!(
                "game {} team {} player {:?}",
                line.game_id, line.team, line.player
            );
            row_failure(table_key, context, e)
        }
    }
}

/// Normalize and store every table of one game's box score.
/// Row and table failures are collected in the report.
pub fn insert_box_score(conn: &mut SqliteConnection, tables: &BoxScoreTables) -> BatchReport {
    let mut report = BatchReport::default();

    for (table_key, rows) in tables {
        let key = match TableKey::parse(table_key) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(table = %table_key, error = %e, "box-score table skipped");
                report.record(RowOutcome::Failed(RowFailure {
                    context: format!("table {}", table_key),
                    reason: e.to_string(),
                }));
                continue;
            }
        };

        for row in rows {
            report.record(insert_row(conn, table_key, &key, row));
        }
    }

    tracing::debug!(%report, "box-score batch");
    report
}
