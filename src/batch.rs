//! Per-row outcomes for normalize+insert batches
//!
//! Normalizers never abort on a bad row. Each row ends up in exactly one
//! bucket of a [`BatchReport`], and failures keep enough context to find the
//! offending game/team/player afterwards.

use std::fmt;

/// A row that could not be stored
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RowFailure {
    /// Which row: table key, game, team, player as far as they are known
    pub context: String,
    pub reason: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Inserted,
    /// Key already stored; left untouched
    Duplicate,
    /// Row shape we ignore on purpose (too short, filler)
    Skipped,
    Failed(RowFailure),
}

/// Tally of one normalize+insert pass
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BatchReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Duplicate => self.duplicates += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }

    /// Rows seen, in any bucket
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates + self.skipped + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} duplicate, {} skipped, {} failed",
            self.inserted,
            self.duplicates,
            self.skipped,
            self.failures.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut a = BatchReport::default();
        a.record(RowOutcome::Inserted);
        a.record(RowOutcome::Duplicate);
        a.record(RowOutcome::Skipped);

        let mut b = BatchReport::default();
        b.record(RowOutcome::Inserted);
        b.record(RowOutcome::Failed(RowFailure {
            context: "game G1".to_string(),
            reason: "bad".to_string(),
        }));

        a.merge(b);
        assert_eq!(a.inserted, 2);
        assert_eq!(a.total(), 5);
        assert!(a.has_failures());
        assert_eq!(a.to_string(), "2 inserted, 1 duplicate, 1 skipped, 1 failed");
        assert_eq!(a.failures[0].to_string(), "game G1: bad");
    }
}
