//! Courtsync - incremental sync of a basketball season into SQLite
//!
//! Refresh season stats and the schedule, then pull play-by-play and box
//! scores for every game that is not stored yet.
//!
//! # Overview
//!
//! Each run does a full refresh of the season-stat snapshot and the schedule,
//! asks the completion check which scheduled games still lack per-game data,
//! and syncs those one game per transaction. Per-game relations are
//! append-only and keyed, so rerunning a sync never duplicates rows.
//!
//! # Relations
//!
//! | Table | Policy |
//! |-------|--------|
//! | `Player` | replaced every run |
//! | `Schedule` | rebuilt when the store opens, appended per run |
//! | `PlaybyPlay` | append-only, keyed by game/quarter/clock/actions |
//! | `BoxScoreBasic` | append-only, keyed by game/team/player/period |
//! | `BoxScoreAdvanced` | append-only, keyed by game/team/player/period |
//!
//! # Quick Start
//!
//! ```no_run
//! use courtsync::{Database, DumpSource, Pacing, Synchronizer};
//!
//! let db = Database::open_at("nba.db").unwrap();
//! let mut conn = db.conn().unwrap();
//! let source = DumpSource::new("scraped");
//!
//! let report = Synchronizer::new(&mut conn, &source)
//!     .with_pacing(Pacing::none())
//!     .run()
//!     .unwrap();
//! println!("{} synced, {} failed", report.games_synced, report.failures.len());
//! ```

pub mod archive;
pub mod batch;
pub mod box_score;
pub mod coerce;
pub mod config;
pub mod db;
pub mod loaders;
pub mod oracle;
pub mod play_by_play;
pub mod schema;
pub mod source;
pub mod sync;

pub use archive::{ArchiveError, StoreArchive, Unpacked};
pub use batch::{BatchReport, RowFailure, RowOutcome};
pub use box_score::{BoxScoreError, PlayerLine, TableKey, Variant};
pub use config::Config;
pub use db::{Database, DbError, StoreCounts, SyncRun};
pub use oracle::is_complete;
pub use source::{BoxScoreTables, DumpSource, RawRow, SourceError, StatsSource};
pub use sync::{
    pending_games, GameOutcome, GameReport, Pacing, PendingGame, SyncError, SyncReport,
    Synchronizer,
};
