//! SQLite store with Diesel ORM
//!
//! Holds season stats, the schedule, play-by-play events and box-score lines,
//! plus a small ledger of sync runs. Schema creation is idempotent except for
//! `Schedule`, which is rebuilt on every open.

use crate::schema::*;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Walk up directory tree to find .courtsync folder (like git finds .git)
/// Can be overridden with COURTSYNC_DB_PATH env var
fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("COURTSYNC_DB_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let store_dir = dir.join(".courtsync");
            if store_dir.is_dir() {
                return store_dir.join("courtsync.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    PathBuf::from(".courtsync/courtsync.db")
}

/// Columns every stat table must carry, checked after creation so that an
/// older store file with a different layout fails at startup instead of mid-run
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("Player", &["Rk", "Player", "Age", "Tm", "Pos", "G", "GS", "MP", "PTS"]),
    ("Schedule", &["Date", "Visitor", "Home", "BoxScore", "Attendance", "Last_Updated"]),
    ("PlaybyPlay", &["Game_ID", "Quarter", "Time", "Visitor_Action", "Home_Action"]),
    ("BoxScoreBasic", &["Game_ID", "Team", "Player", "Period", "GmSc", "PlusMinus"]),
    ("BoxScoreAdvanced", &["Game_ID", "Team", "Player", "Period", "ORtg", "DRtg", "BPM"]),
];

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable season stat line (one player/team stint)
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = player_season_stats)]
pub struct NewSeasonStat<'a> {
    pub rank: Option<i32>,
    pub player: Option<&'a str>,
    pub age: Option<i32>,
    pub team: Option<&'a str>,
    pub position: Option<&'a str>,
    pub games: Option<i32>,
    pub games_started: Option<i32>,
    pub minutes: Option<f64>,
    pub fg: Option<f64>,
    pub fga: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_p: Option<f64>,
    pub three_pa: Option<f64>,
    pub three_p_pct: Option<f64>,
    pub two_p: Option<f64>,
    pub two_pa: Option<f64>,
    pub two_p_pct: Option<f64>,
    pub efg_pct: Option<f64>,
    pub ft: Option<f64>,
    pub fta: Option<f64>,
    pub ft_pct: Option<f64>,
    pub orb: Option<f64>,
    pub drb: Option<f64>,
    pub trb: Option<f64>,
    pub ast: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    pub tov: Option<f64>,
    pub pf: Option<f64>,
    pub pts: Option<f64>,
}

/// Queryable season stat line (subset used by reporting)
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = player_season_stats)]
pub struct SeasonStat {
    pub id: i32,
    pub rank: Option<i32>,
    pub player: Option<String>,
    pub age: Option<i32>,
    pub team: Option<String>,
    pub games: Option<i32>,
    pub minutes: Option<f64>,
    pub pts: Option<f64>,
}

/// Insertable schedule row
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = schedule)]
pub struct NewScheduledGame<'a> {
    pub game_date: Option<&'a str>,
    pub start_time: Option<&'a str>,
    pub visitor: Option<&'a str>,
    pub visitor_pts: Option<i32>,
    pub home: Option<&'a str>,
    pub home_pts: Option<i32>,
    pub box_score: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub attendance: Option<i32>,
    pub length_of_game: Option<&'a str>,
    pub arena: Option<&'a str>,
}

/// Queryable schedule row
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = schedule)]
pub struct ScheduledGame {
    pub id: i32,
    pub game_date: Option<String>,
    pub start_time: Option<String>,
    pub visitor: Option<String>,
    pub visitor_pts: Option<i32>,
    pub home: Option<String>,
    pub home_pts: Option<i32>,
    pub box_score: Option<String>,
    pub notes: Option<String>,
    pub attendance: Option<i32>,
    pub length_of_game: Option<String>,
    pub arena: Option<String>,
    pub last_updated: Option<String>,
}

/// Insertable play-by-play event
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = play_by_play)]
pub struct NewPlayByPlayEvent<'a> {
    pub game_id: &'a str,
    pub quarter: &'a str,
    pub clock: &'a str,
    pub visitor_action: &'a str,
    pub visitor_pts: Option<i32>,
    pub score: &'a str,
    pub home_pts: Option<i32>,
    pub home_action: &'a str,
}

/// Queryable play-by-play event
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = play_by_play)]
pub struct PlayByPlayEvent {
    pub id: i32,
    pub game_id: String,
    pub quarter: String,
    pub clock: String,
    pub visitor_action: String,
    pub visitor_pts: Option<i32>,
    pub score: String,
    pub home_pts: Option<i32>,
    pub home_action: String,
}

/// Insertable basic box-score line
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = box_score_basic)]
pub struct NewBoxScoreBasic<'a> {
    pub game_id: &'a str,
    pub team: &'a str,
    pub opponent: &'a str,
    pub game_type: &'a str,
    pub period: &'a str,
    pub player: &'a str,
    pub status: &'a str,
    pub minutes: Option<&'a str>,
    pub fg: Option<i32>,
    pub fga: Option<i32>,
    pub fg_pct: Option<f64>,
    pub three_p: Option<i32>,
    pub three_pa: Option<i32>,
    pub three_p_pct: Option<f64>,
    pub ft: Option<i32>,
    pub fta: Option<i32>,
    pub ft_pct: Option<f64>,
    pub orb: Option<i32>,
    pub drb: Option<i32>,
    pub trb: Option<i32>,
    pub ast: Option<i32>,
    pub stl: Option<i32>,
    pub blk: Option<i32>,
    pub tov: Option<i32>,
    pub pf: Option<i32>,
    pub pts: Option<i32>,
    pub game_score: Option<f64>,
    pub plus_minus: Option<i32>,
}

/// Queryable basic box-score line (key and headline numbers)
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = box_score_basic)]
pub struct BoxScoreBasicLine {
    pub id: i32,
    pub game_id: String,
    pub team: String,
    pub period: String,
    pub player: String,
    pub minutes: Option<String>,
    pub pts: Option<i32>,
    pub game_score: Option<f64>,
    pub plus_minus: Option<i32>,
}

/// Insertable advanced box-score line
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = box_score_advanced)]
pub struct NewBoxScoreAdvanced<'a> {
    pub game_id: &'a str,
    pub team: &'a str,
    pub opponent: &'a str,
    pub game_type: &'a str,
    pub period: &'a str,
    pub player: &'a str,
    pub status: &'a str,
    pub minutes: Option<&'a str>,
    pub ts_pct: Option<f64>,
    pub efg_pct: Option<f64>,
    pub three_par: Option<f64>,
    pub ftr: Option<f64>,
    pub orb_pct: Option<f64>,
    pub drb_pct: Option<f64>,
    pub trb_pct: Option<f64>,
    pub ast_pct: Option<f64>,
    pub stl_pct: Option<f64>,
    pub blk_pct: Option<f64>,
    pub tov_pct: Option<f64>,
    pub usg_pct: Option<f64>,
    pub off_rating: Option<i32>,
    pub def_rating: Option<i32>,
    pub bpm: Option<f64>,
}

// ============================================================================
// Run Ledger Models
// ============================================================================

/// Insertable sync run
#[derive(Insertable)]
#[diesel(table_name = sync_runs)]
pub struct NewSyncRun<'a> {
    pub run_id: &'a str,
    pub started_at: &'a str,
    pub completed_at: Option<&'a str>,
    pub status: &'a str,
    pub games_pending: i32,
    pub games_synced: i32,
    pub games_failed: i32,
    pub error: Option<&'a str>,
}

/// Queryable sync run
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = sync_runs)]
pub struct SyncRun {
    pub id: i32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub games_pending: i32,
    pub games_synced: i32,
    pub games_failed: i32,
    pub error: Option<String>,
}

// ============================================================================
// Helper structs for raw SQL queries
// ============================================================================

/// Helper for PRAGMA table_info queries
#[derive(QueryableByName, Debug)]
struct PragmaTableInfo {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    #[allow(dead_code)]
    cid: i32,
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    #[allow(dead_code)]
    r#type: String,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    #[allow(dead_code)]
    notnull: i32,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    #[allow(dead_code)]
    dflt_value: Option<String>,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    #[allow(dead_code)]
    pk: i32,
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

/// Error type for database operations
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Row counts per relation, for `courtsync status`
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreCounts {
    pub season_stats: i64,
    pub schedule: i64,
    pub play_by_play: i64,
    pub box_score_basic: i64,
    pub box_score_advanced: i64,
}

impl Database {
    /// Default store path (respects COURTSYNC_DB_PATH env var)
    pub fn db_path() -> PathBuf {
        get_db_path()
    }

    /// Like `open_at`, creating missing parent directories first
    pub fn create_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent(path)?;
        Self::open_at(path)
    }

    /// Open database at specified path and bring the schema up.
    /// `Schedule` is dropped and recreated here.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path.as_ref(), true)
    }

    /// Open for inspection: same schema setup as `open_at`, but the schedule
    /// loaded by the last run is left in place
    pub fn inspect_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent(path)?;
        Self::open_with(path, false)
    }

    fn open_with(path: &Path, rebuild_schedule: bool) -> Result<Self> {
        let path_str = path.to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema(rebuild_schedule)?;
        tracing::debug!(path = %path_str, rebuild_schedule, "store opened");
        Ok(db)
    }

    /// Check out a connection. A sync run holds one for its whole duration.
    pub fn conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| DbError::Connection(e.to_string()))
    }

    fn init_schema(&self, rebuild_schedule: bool) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS Player (
                Rk INTEGER,
                Player TEXT,
                Age INTEGER,
                Tm TEXT,
                Pos TEXT,
                G INTEGER,
                GS INTEGER,
                MP REAL,
                FG REAL,
                FGA REAL,
                FG_percent REAL,
                ThreeP REAL,
                ThreePA REAL,
                ThreeP_percent REAL,
                TwoP REAL,
                TwoPA REAL,
                TwoP_percent REAL,
                eFG_percent REAL,
                FT REAL,
                FTA REAL,
                FT_percent REAL,
                ORB REAL,
                DRB REAL,
                TRB REAL,
                AST REAL,
                STL REAL,
                BLK REAL,
                TOV REAL,
                PF REAL,
                PTS REAL
            )
        "#).execute(&mut conn)?;

        // Schedule is rebuilt from the source on every run
        if rebuild_schedule {
            diesel::sql_query("DROP TABLE IF EXISTS Schedule").execute(&mut conn)?;
        }
        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS Schedule (
                Date TEXT,
                Start_Time TEXT,
                Visitor TEXT,
                Visitor_PTS INTEGER,
                Home TEXT,
                Home_PTS INTEGER,
                BoxScore TEXT,
                Notes TEXT,
                Attendance INTEGER,
                LengthOfGame TEXT,
                Arena TEXT,
                Last_Updated TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS PlaybyPlay (
                Game_ID TEXT,
                Quarter TEXT,
                Time TEXT,
                Visitor_Action TEXT,
                Visitor_PTS INTEGER,
                Score TEXT,
                Home_PTS INTEGER,
                Home_Action TEXT,
                UNIQUE(Game_ID, Quarter, Time, Visitor_Action, Home_Action)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS BoxScoreBasic (
                Game_ID TEXT,
                Team TEXT,
                Opponent TEXT,
                Game_Type TEXT,
                Period TEXT,
                Player TEXT,
                Status TEXT,
                MP TEXT,
                FG INTEGER,
                FGA INTEGER,
                FG_percent REAL,
                ThreeP INTEGER,
                ThreePA INTEGER,
                ThreeP_percent REAL,
                FT INTEGER,
                FTA INTEGER,
                FT_percent REAL,
                ORB INTEGER,
                DRB INTEGER,
                TRB INTEGER,
                AST INTEGER,
                STL INTEGER,
                BLK INTEGER,
                TOV INTEGER,
                PF INTEGER,
                PTS INTEGER,
                GmSc REAL,
                PlusMinus INTEGER,
                UNIQUE(Game_ID, Team, Player, Period)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS BoxScoreAdvanced (
                Game_ID TEXT,
                Team TEXT,
                Opponent TEXT,
                Game_Type TEXT,
                Period TEXT,
                Player TEXT,
                Status TEXT,
                MP TEXT,
                TS_percent REAL,
                eFG_percent REAL,
                ThreePAr REAL,
                FTr REAL,
                ORB_percent REAL,
                DRB_percent REAL,
                TRB_percent REAL,
                AST_percent REAL,
                STL_percent REAL,
                BLK_percent REAL,
                TOV_percent REAL,
                USG_percent REAL,
                ORtg INTEGER,
                DRtg INTEGER,
                BPM REAL,
                UNIQUE(Game_ID, Team, Player, Period)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS sync_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                run_id TEXT NOT NULL UNIQUE,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                status TEXT NOT NULL DEFAULT 'running',
                games_pending INTEGER NOT NULL DEFAULT 0,
                games_synced INTEGER NOT NULL DEFAULT 0,
                games_failed INTEGER NOT NULL DEFAULT 0,
                error TEXT
            )
        "#).execute(&mut conn)?;

        // The UNIQUE constraints above lead with Game_ID, so the completion
        // lookups are already indexed. Schedule needs its own for enumeration.
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_schedule_box_score ON Schedule(BoxScore)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_sync_runs_started ON sync_runs(started_at)").execute(&mut conn)?;

        verify_columns(&mut conn)?;
        Ok(())
    }

    /// Row counts for every stat relation
    pub fn counts(&self) -> Result<StoreCounts> {
        let mut conn = self.conn()?;
        store_counts(&mut conn)
    }

    /// Most recent sync runs, newest first
    pub fn recent_runs(&self, limit: i64) -> Result<Vec<SyncRun>> {
        let mut conn = self.conn()?;
        let runs = sync_runs::table
            .order(sync_runs::id.desc())
            .limit(limit)
            .select(SyncRun::as_select())
            .load(&mut conn)?;
        Ok(runs)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbError::Connection(format!("{}: {}", parent.display(), e)))?;
        }
    }
    Ok(())
}

fn verify_columns(conn: &mut SqliteConnection) -> Result<()> {
    for (table, required) in REQUIRED_COLUMNS {
        let columns: Vec<PragmaTableInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table)).load(conn)?;
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !columns.iter().any(|c| c.name == *name))
            .collect();
        if !missing.is_empty() {
            return Err(DbError::Validation(format!(
                "Table {} is missing columns: {}. Move the old store aside and run 'courtsync init'.",
                table,
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

/// Row counts on an already checked-out connection
pub fn store_counts(conn: &mut SqliteConnection) -> Result<StoreCounts> {
    Ok(StoreCounts {
        season_stats: player_season_stats::table.count().get_result(conn)?,
        schedule: schedule::table.count().get_result(conn)?,
        play_by_play: play_by_play::table.count().get_result(conn)?,
        box_score_basic: box_score_basic::table.count().get_result(conn)?,
        box_score_advanced: box_score_advanced::table.count().get_result(conn)?,
    })
}

// ============================================================================
// Run Ledger Operations
// ============================================================================

/// Record the start of a sync run, returning the ledger row id
pub fn begin_run(conn: &mut SqliteConnection, run_id: &str) -> Result<i32> {
    let now = chrono::Local::now().to_rfc3339();
    let new_run = NewSyncRun {
        run_id,
        started_at: &now,
        completed_at: None,
        status: "running",
        games_pending: 0,
        games_synced: 0,
        games_failed: 0,
        error: None,
    };

    diesel::insert_into(sync_runs::table)
        .values(&new_run)
        .execute(conn)?;

    let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("last_insert_rowid()"))
        .first(conn)?;

    Ok(id)
}

/// Close a ledger row with its final status and counts
pub fn finish_run(
    conn: &mut SqliteConnection,
    id: i32,
    status: &str,
    games_pending: i32,
    games_synced: i32,
    games_failed: i32,
    error: Option<&str>,
) -> Result<()> {
    let now = chrono::Local::now().to_rfc3339();

    diesel::update(sync_runs::table.filter(sync_runs::id.eq(id)))
        .set((
            sync_runs::completed_at.eq(Some(&now)),
            sync_runs::status.eq(status),
            sync_runs::games_pending.eq(games_pending),
            sync_runs::games_synced.eq(games_synced),
            sync_runs::games_failed.eq(games_failed),
            sync_runs::error.eq(error),
        ))
        .execute(conn)?;

    Ok(())
}
