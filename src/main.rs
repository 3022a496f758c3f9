use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use courtsync::sync::{GameOutcome, Pacing, Synchronizer};
use courtsync::{Config, Database, DumpSource, StoreArchive, SyncError, SyncReport, Unpacked};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "courtsync")]
#[command(author, version, about = "Incrementally sync a basketball season into SQLite")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store and a default .courtsync/config.toml
    Init,

    /// Refresh season stats and the schedule, then sync missing games
    Sync {
        /// Directory of scraped JSON dumps
        #[arg(long)]
        source: Option<PathBuf>,

        /// Gzip archive to unpack before and pack after the run
        #[arg(long)]
        archive: Option<PathBuf>,

        /// Work on the uncompressed store only
        #[arg(long, conflicts_with = "archive")]
        no_archive: bool,

        /// Pause after every per-game fetch
        #[arg(long)]
        fetch_delay_ms: Option<u64>,

        /// Pause after a failed game
        #[arg(long)]
        backoff_ms: Option<u64>,
    },

    /// Row counts per table and games still pending
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Whether one game's per-game data is stored
    Check {
        /// Game identifier, e.g. 202410220BOS
        game_id: String,
    },

    /// Recent sync runs, newest first
    Runs {
        /// How many runs to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("COURTSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let args = Args::parse();

    if let Command::Completion { shell } = args.command {
        clap_complete::generate(shell, &mut Args::command(), "courtsync", &mut std::io::stdout());
        return;
    }

    init_tracing();
    let config = Config::load();

    let result = match args.command {
        Command::Init => cmd_init(&config),
        Command::Sync {
            source,
            archive,
            no_archive,
            fetch_delay_ms,
            backoff_ms,
        } => {
            let mut config = config;
            if let Some(dir) = source {
                config.source.dump_dir = dir;
            }
            if let Some(path) = archive {
                config.store.archive_path = path;
            }
            if let Some(ms) = fetch_delay_ms {
                config.pacing.fetch_delay_ms = ms;
            }
            if let Some(ms) = backoff_ms {
                config.pacing.failure_backoff_ms = ms;
            }
            cmd_sync(&config, !no_archive)
        }
        Command::Status { json } => cmd_status(&config, json),
        Command::Check { game_id } => cmd_check(&config, &game_id),
        Command::Runs { limit, json } => cmd_runs(&config, limit, json),
        Command::Completion { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn open_store(config: &Config) -> Result<Database, courtsync::DbError> {
    Database::create_at(config.working_path())
}

/// Read-only commands keep the schedule from the last sync
fn inspect_store(config: &Config) -> Result<Database, courtsync::DbError> {
    Database::inspect_at(config.working_path())
}

fn cmd_init(config: &Config) -> CmdResult {
    let path = config.working_path();
    println!("\n{}", "Initializing courtsync...".cyan().bold());

    Database::create_at(&path)?;
    println!("   {} {}", "Store".green(), path.display());

    let config_path = Path::new(".courtsync").join("config.toml");
    if config_path.exists() {
        println!("   {} {} (already exists)", "Skipping".yellow(), config_path.display());
    } else {
        std::fs::create_dir_all(".courtsync")?;
        std::fs::write(&config_path, toml::to_string_pretty(&Config::default())?)?;
        println!("   {} {}", "Creating".green(), config_path.display());
    }

    println!("\n{}", "courtsync initialized!".green().bold());
    println!("Run {} to pull the season.", "courtsync sync".cyan());
    Ok(())
}

fn cmd_sync(config: &Config, use_archive: bool) -> CmdResult {
    let archive = StoreArchive::new(config.store.archive_path.clone(), config.working_path());

    if use_archive {
        match archive.unpack().map_err(SyncError::from)? {
            Unpacked::Restored { bytes } => println!(
                "{} {} ({} bytes)",
                "Unpacked".green(),
                archive.archive_path.display(),
                bytes
            ),
            Unpacked::Fresh => println!(
                "{} no archive at {}, starting fresh",
                "Note:".yellow(),
                archive.archive_path.display()
            ),
        }
    }

    let source = DumpSource::new(&config.source.dump_dir);
    let db = open_store(config).map_err(SyncError::from)?;
    let mut conn = db.conn().map_err(SyncError::from)?;
    let report = Synchronizer::new(&mut conn, &source)
        .with_pacing(Pacing::from(&config.pacing))
        .with_progress(print_outcome)
        .run()?;
    // release the store file before packing it
    drop(conn);
    drop(db);

    print_report(&report);

    if use_archive {
        archive.pack().map_err(SyncError::from)?;
        println!("{} {}", "Packed".green(), archive.archive_path.display());
    }
    Ok(())
}

fn print_outcome(outcome: &GameOutcome) {
    match outcome {
        GameOutcome::Synced { game_id, report } => {
            let events = report.play_by_play.as_ref().map_or(0, |r| r.inserted);
            let lines = report.box_score.as_ref().map_or(0, |r| r.inserted);
            println!(
                "{} {} ({} events, {} box-score lines)",
                "SUCCESS:".green().bold(),
                game_id,
                events,
                lines
            );
        }
        GameOutcome::Failed {
            game_id,
            box_score_ref,
            error,
        } => {
            println!(
                "{} {} {} | {}",
                "ERROR:".red().bold(),
                game_id,
                box_score_ref,
                error
            );
        }
    }
}

fn print_report(report: &SyncReport) {
    println!("\n{}", "Sync complete".cyan().bold());
    println!("   Run:           {}", report.run_id);
    println!("   Season stats:  {}", report.season_stats);
    println!("   Schedule rows: {}", report.schedule_rows);
    println!(
        "   Games:         {} scheduled, {} pending, {} synced, {} failed",
        report.games_scheduled,
        report.games_pending,
        report.games_synced,
        report.failures.len()
    );
    println!("   Play-by-play:  {}", report.play_by_play);
    println!("   Box scores:    {}", report.box_score);

    let row_failures = report
        .play_by_play
        .failures
        .iter()
        .chain(report.box_score.failures.iter());
    for failure in row_failures {
        println!("   {} {}", "row:".yellow(), failure);
    }
}

fn cmd_status(config: &Config, json: bool) -> CmdResult {
    let db = inspect_store(config)?;
    let counts = db.counts()?;
    let mut conn = db.conn()?;
    let pending = courtsync::pending_games(&mut conn)?;

    if json {
        let value = serde_json::json!({
            "store": config.working_path(),
            "counts": counts,
            "pending": pending,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", "Store:".cyan().bold(), config.working_path().display());
    println!("   Player:           {}", counts.season_stats);
    println!("   Schedule:         {}", counts.schedule);
    println!("   PlaybyPlay:       {}", counts.play_by_play);
    println!("   BoxScoreBasic:    {}", counts.box_score_basic);
    println!("   BoxScoreAdvanced: {}", counts.box_score_advanced);
    println!("   Pending games:    {}", pending.len());
    Ok(())
}

fn cmd_check(config: &Config, game_id: &str) -> CmdResult {
    let db = inspect_store(config)?;
    let mut conn = db.conn()?;
    if courtsync::is_complete(&mut conn, game_id)? {
        println!("{} {}", game_id, "complete".green());
    } else {
        println!("{} {}", game_id, "incomplete".yellow());
    }
    Ok(())
}

fn cmd_runs(config: &Config, limit: i64, json: bool) -> CmdResult {
    let db = inspect_store(config)?;
    let runs = db.recent_runs(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No sync runs recorded.");
        return Ok(());
    }

    for run in &runs {
        let status = match run.status.as_str() {
            "completed" => run.status.green(),
            "failed" => run.status.red(),
            _ => run.status.yellow(),
        };
        println!(
            "{} {} {}  pending {} synced {} failed {}",
            run.started_at, run.run_id, status, run.games_pending, run.games_synced, run.games_failed
        );
        if let Some(error) = &run.error {
            println!("   {}", error.red());
        }
    }
    Ok(())
}
