//! Sync orchestration
//!
//! One run:
//!
//! 1. refresh season stats and the schedule (any failure aborts the run)
//! 2. collect the box-score references the schedule knows about
//! 3. drop games whose per-game data is already stored
//! 4. fetch, normalize and insert each remaining game in its own transaction;
//!    a failing game is rolled back and left for the next run
//! 5. close the run ledger entry and hand back a [`SyncReport`]
//!
//! Everything runs on one connection, one game at a time.

use crate::archive::ArchiveError;
use crate::batch::BatchReport;
use crate::box_score::insert_box_score;
use crate::config::PacingConfig;
use crate::db::{self, DbError};
use crate::loaders::{load_schedule, load_season_stats};
use crate::oracle::is_complete;
use crate::play_by_play::insert_play_by_play;
use crate::schema::schedule;
use crate::source::{game_id_from_ref, SourceError, StatsSource};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to fetch {stage}: {source}")]
    Fetch {
        stage: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("Failed to load {stage}: {source}")]
    Load {
        stage: &'static str,
        #[source]
        source: DbError,
    },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Errors that end one game's transaction
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Query error: {0}")]
    Db(#[from] diesel::result::Error),
}

/// Pauses around external fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After every fetch
    pub fetch_delay: Duration,
    /// After a game commits
    pub success_delay: Duration,
    /// After a game fails
    pub failure_backoff: Duration,
}

impl Pacing {
    /// No pauses at all (tests, local dumps)
    pub fn none() -> Self {
        Self {
            fetch_delay: Duration::ZERO,
            success_delay: Duration::ZERO,
            failure_backoff: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from(&PacingConfig::default())
    }
}

impl From<&PacingConfig> for Pacing {
    fn from(config: &PacingConfig) -> Self {
        Self {
            fetch_delay: Duration::from_millis(config.fetch_delay_ms),
            success_delay: Duration::from_millis(config.success_delay_ms),
            failure_backoff: Duration::from_millis(config.failure_backoff_ms),
        }
    }
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

/// A scheduled game whose per-game data is not stored yet
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PendingGame {
    pub game_id: String,
    pub box_score_ref: String,
}

/// What one game's transaction stored
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct GameReport {
    /// `None` when the source had no play-by-play for the game
    pub play_by_play: Option<BatchReport>,
    /// `None` when the source had no box score for the game
    pub box_score: Option<BatchReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameOutcome {
    Synced {
        game_id: String,
        report: GameReport,
    },
    Failed {
        game_id: String,
        box_score_ref: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GameFailure {
    pub game_id: String,
    pub box_score_ref: String,
    pub error: String,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SyncReport {
    pub run_id: String,
    pub season_stats: usize,
    pub schedule_rows: usize,
    /// Distinct box-score references in the schedule
    pub games_scheduled: usize,
    pub games_pending: usize,
    pub games_synced: usize,
    pub failures: Vec<GameFailure>,
    pub play_by_play: BatchReport,
    pub box_score: BatchReport,
}

/// Distinct box-score references in schedule order
pub fn scheduled_box_scores(conn: &mut SqliteConnection) -> Result<Vec<String>, DbError> {
    let refs: Vec<Option<String>> = schedule::table
        .filter(schedule::box_score.is_not_null())
        .order(schedule::id.asc())
        .select(schedule::box_score)
        .load(conn)?;

    let mut seen = HashSet::new();
    Ok(refs
        .into_iter()
        .flatten()
        .filter(|r| seen.insert(r.clone()))
        .collect())
}

/// Games from `refs` that still need per-game data.
///
/// A failed completion lookup counts as "not complete": refetching a stored
/// game is harmless, skipping a missing one is not.
pub fn filter_pending(conn: &mut SqliteConnection, refs: &[String]) -> Vec<PendingGame> {
    let mut pending = Vec::new();
    for box_score_ref in refs {
        let Some(game_id) = game_id_from_ref(box_score_ref) else {
            continue;
        };
        let complete = match is_complete(conn, game_id) {
            Ok(complete) => complete,
            Err(e) => {
                tracing::warn!(game_id, error = %e, "completion check failed, treating game as pending");
                false
            }
        };
        if !complete {
            pending.push(PendingGame {
                game_id: game_id.to_string(),
                box_score_ref: box_score_ref.clone(),
            });
        }
    }
    pending
}

/// Scheduled games without stored per-game data
pub fn pending_games(conn: &mut SqliteConnection) -> Result<Vec<PendingGame>, DbError> {
    let refs = scheduled_box_scores(conn)?;
    Ok(filter_pending(conn, &refs))
}

type ProgressFn<'a> = Box<dyn FnMut(&GameOutcome) + 'a>;

/// Drives one sync run over an explicit connection and source
pub struct Synchronizer<'a, S: StatsSource + ?Sized> {
    conn: &'a mut SqliteConnection,
    source: &'a S,
    pacing: Pacing,
    on_game: Option<ProgressFn<'a>>,
}

impl<'a, S: StatsSource + ?Sized> Synchronizer<'a, S> {
    pub fn new(conn: &'a mut SqliteConnection, source: &'a S) -> Self {
        Self {
            conn,
            source,
            pacing: Pacing::default(),
            on_game: None,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Called after every game, whether it committed or rolled back
    pub fn with_progress<F: FnMut(&GameOutcome) + 'a>(mut self, f: F) -> Self {
        self.on_game = Some(Box::new(f));
        self
    }

    /// Run all steps. Only refresh and ledger failures come back as `Err`.
    pub fn run(mut self) -> Result<SyncReport, SyncError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let ledger_id = db::begin_run(self.conn, &run_id)?;
        let span = tracing::info_span!("sync", run_id = %run_id);
        let _guard = span.enter();

        let mut report = SyncReport {
            run_id,
            ..SyncReport::default()
        };

        if let Err(e) = self.refresh(&mut report) {
            tracing::error!(error = %e, "refresh failed, aborting run");
            // the refresh error is what the caller needs; a ledger failure is only logged
            if let Err(ledger) =
                db::finish_run(self.conn, ledger_id, "failed", 0, 0, 0, Some(&e.to_string()))
            {
                tracing::error!(error = %ledger, "could not close run ledger entry");
            }
            return Err(e);
        }

        let refs = scheduled_box_scores(self.conn)?;
        let pending = filter_pending(self.conn, &refs);
        report.games_scheduled = refs.len();
        report.games_pending = pending.len();
        tracing::info!(
            scheduled = report.games_scheduled,
            pending = report.games_pending,
            "games to process"
        );

        for game in &pending {
            let outcome = match self.sync_game(game) {
                Ok(game_report) => {
                    report.games_synced += 1;
                    if let Some(pbp) = &game_report.play_by_play {
                        report.play_by_play.merge(pbp.clone());
                    }
                    if let Some(box_score) = &game_report.box_score {
                        report.box_score.merge(box_score.clone());
                    }
                    tracing::info!(game_id = %game.game_id, "game synced");
                    pause(self.pacing.success_delay);
                    GameOutcome::Synced {
                        game_id: game.game_id.clone(),
                        report: game_report,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        game_id = %game.game_id,
                        box_score_ref = %game.box_score_ref,
                        error = %e,
                        "game rolled back"
                    );
                    report.failures.push(GameFailure {
                        game_id: game.game_id.clone(),
                        box_score_ref: game.box_score_ref.clone(),
                        error: e.to_string(),
                    });
                    pause(self.pacing.failure_backoff);
                    GameOutcome::Failed {
                        game_id: game.game_id.clone(),
                        box_score_ref: game.box_score_ref.clone(),
                        error: e.to_string(),
                    }
                }
            };
            if let Some(on_game) = self.on_game.as_mut() {
                on_game(&outcome);
            }
        }

        db::finish_run(
            self.conn,
            ledger_id,
            "completed",
            to_i32(report.games_pending),
            to_i32(report.games_synced),
            to_i32(report.failures.len()),
            None,
        )?;
        tracing::info!(
            synced = report.games_synced,
            failed = report.failures.len(),
            "sync run completed"
        );
        Ok(report)
    }

    fn refresh(&mut self, report: &mut SyncReport) -> Result<(), SyncError> {
        let stats = self
            .source
            .fetch_season_stats()
            .map_err(|source| SyncError::Fetch { stage: "season stats", source })?;
        report.season_stats = load_season_stats(self.conn, &stats)
            .map_err(|source| SyncError::Load { stage: "season stats", source })?;
        tracing::info!(rows = report.season_stats, "season stats replaced");

        let games = self
            .source
            .fetch_schedule()
            .map_err(|source| SyncError::Fetch { stage: "schedule", source })?;
        report.schedule_rows = load_schedule(self.conn, &games)
            .map_err(|source| SyncError::Load { stage: "schedule", source })?;
        tracing::info!(rows = report.schedule_rows, "schedule loaded");

        Ok(())
    }

    fn sync_game(&mut self, game: &PendingGame) -> Result<GameReport, GameError> {
        let source = self.source;
        let pacing = self.pacing;

        self.conn.transaction::<_, GameError, _>(|conn| {
            let mut game_report = GameReport::default();

            let events = source.fetch_play_by_play(&game.game_id)?;
            pause(pacing.fetch_delay);
            if let Some(rows) = events {
                game_report.play_by_play = Some(insert_play_by_play(conn, &rows));
            }

            let tables = source.fetch_box_score(&game.box_score_ref)?;
            pause(pacing.fetch_delay);
            if let Some(tables) = tables {
                game_report.box_score = Some(insert_box_score(conn, &tables));
            }

            Ok(game_report)
        })
    }
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
