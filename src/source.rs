//! Fetch collaborators
//!
//! The sync core never talks to the network. It asks a [`StatsSource`] for raw
//! string tables and normalizes whatever comes back. [`DumpSource`] serves
//! tables that a scraper already wrote to disk as JSON.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One scraped table row, every cell as text
pub type RawRow = Vec<String>;

/// Box-score tables keyed `<table>-<team>-<period>[-advanced]`
pub type BoxScoreTables = BTreeMap<String, Vec<RawRow>>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is not a table (expected an array of rows)")]
    Shape { path: PathBuf },
    /// The source could not serve the request at all
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Where raw tables come from.
///
/// Per-game fetches return `Ok(None)` when the source has nothing usable for
/// that game; the caller skips normalization. `Err` means the fetch itself
/// failed and the game's work is rolled back.
pub trait StatsSource {
    /// Season stat table, header row first
    fn fetch_season_stats(&self) -> Result<Vec<RawRow>, SourceError>;

    fn fetch_schedule(&self) -> Result<Vec<RawRow>, SourceError>;

    fn fetch_play_by_play(&self, game_id: &str) -> Result<Option<Vec<RawRow>>, SourceError>;

    fn fetch_box_score(&self, box_score_ref: &str) -> Result<Option<BoxScoreTables>, SourceError>;
}

/// Game identifier from a box-score reference:
/// `/boxscores/202410220BOS.html` -> `202410220BOS`.
/// `None` when the reference carries no token.
pub fn game_id_from_ref(box_score_ref: &str) -> Option<&str> {
    let last = box_score_ref.rsplit('/').next().unwrap_or("");
    let token = last.split('.').next().unwrap_or("").trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Reads scraper output from a directory:
///
/// ```text
/// <root>/season_stats.json          [[cell, ...], ...]
/// <root>/schedule.json              [[cell, ...], ...]
/// <root>/play_by_play/<game>.json   [[cell, ...], ...]
/// <root>/box_scores/<game>.json     {"<table key>": [[cell, ...], ...], ...}
/// ```
#[derive(Debug, Clone)]
pub struct DumpSource {
    root: PathBuf,
}

impl DumpSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_json(&self, path: &Path) -> Result<Value, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Per-game files are optional: a missing file is "no data", not an error
    fn read_optional_json(&self, path: &Path) -> Result<Option<Value>, SourceError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no dump for game");
            return Ok(None);
        }
        self.read_json(path).map(Some)
    }

    fn read_table(&self, name: &str) -> Result<Vec<RawRow>, SourceError> {
        let path = self.root.join(name);
        let value = self.read_json(&path)?;
        rows_from_value(&value).ok_or(SourceError::Shape { path })
    }
}

impl StatsSource for DumpSource {
    fn fetch_season_stats(&self) -> Result<Vec<RawRow>, SourceError> {
        self.read_table("season_stats.json")
    }

    fn fetch_schedule(&self) -> Result<Vec<RawRow>, SourceError> {
        self.read_table("schedule.json")
    }

    fn fetch_play_by_play(&self, game_id: &str) -> Result<Option<Vec<RawRow>>, SourceError> {
        let path = self.root.join("play_by_play").join(format!("{}.json", game_id));
        Ok(self
            .read_optional_json(&path)?
            .and_then(|value| rows_from_value(&value)))
    }

    fn fetch_box_score(&self, box_score_ref: &str) -> Result<Option<BoxScoreTables>, SourceError> {
        let Some(game_id) = game_id_from_ref(box_score_ref) else {
            return Ok(None);
        };
        let path = self.root.join("box_scores").join(format!("{}.json", game_id));
        Ok(self
            .read_optional_json(&path)?
            .and_then(|value| tables_from_value(&value)))
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Array of arrays -> rows. `None` for any other shape.
fn rows_from_value(value: &Value) -> Option<Vec<RawRow>> {
    value
        .as_array()?
        .iter()
        .map(|row| row.as_array().map(|cells| cells.iter().map(cell_text).collect()))
        .collect()
}

fn tables_from_value(value: &Value) -> Option<BoxScoreTables> {
    value
        .as_object()?
        .iter()
        .map(|(key, rows)| rows_from_value(rows).map(|rows| (key.clone(), rows)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_game_id_from_ref() {
        assert_eq!(game_id_from_ref("/boxscores/202410220BOS.html"), Some("202410220BOS"));
        assert_eq!(game_id_from_ref("202410220BOS.html"), Some("202410220BOS"));
        assert_eq!(game_id_from_ref("/boxscores/"), None);
        assert_eq!(game_id_from_ref(""), None);
    }

    #[test]
    fn test_dump_tables() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "season_stats.json", r#"[["Rk","Player"],["1","Jane Doe",25,null]]"#);
        write(dir.path(), "schedule.json", r#"[]"#);

        let source = DumpSource::new(dir.path());
        let stats = source.fetch_season_stats().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[1], vec!["1", "Jane Doe", "25", ""]);
        assert!(source.fetch_schedule().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_tables_are_required() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "schedule.json", r#"{"not": "a table"}"#);
        let source = DumpSource::new(dir.path());

        assert!(matches!(source.fetch_season_stats(), Err(SourceError::Io { .. })));
        assert!(matches!(source.fetch_schedule(), Err(SourceError::Shape { .. })));
    }

    #[test]
    fn test_per_game_no_data() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "play_by_play/G2.json", r#""404""#);
        write(dir.path(), "box_scores/G2.json", r#"[1, 2]"#);
        let source = DumpSource::new(dir.path());

        assert!(source.fetch_play_by_play("G1").unwrap().is_none());
        assert!(source.fetch_play_by_play("G2").unwrap().is_none());
        assert!(source.fetch_box_score("/boxscores/G2.html").unwrap().is_none());
        assert!(source.fetch_box_score("").unwrap().is_none());
    }

    #[test]
    fn test_per_game_parse_failure_is_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "play_by_play/G3.json", "[[\"Q1\",");
        let source = DumpSource::new(dir.path());
        assert!(matches!(source.fetch_play_by_play("G3"), Err(SourceError::Json { .. })));
    }

    #[test]
    fn test_box_score_tables() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "box_scores/G4.json",
            r#"{"box-BOS-game-basic": [["Jane Doe", "30:00"]], "box-BOS-q1-advanced": []}"#,
        );
        let source = DumpSource::new(dir.path());
        let tables = source.fetch_box_score("/boxscores/G4.html").unwrap().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables["box-BOS-game-basic"][0][0], "Jane Doe");
    }
}
