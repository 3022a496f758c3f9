//! Compressed store archive
//!
//! The published store is a gzip file. A run unpacks it to a working copy,
//! syncs against that, and packs it back. Both directions write to a sibling
//! temp file and rename, so a crash never leaves a truncated target behind.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to unpack {path}: {source}")]
    Unpack {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to pack {path}: {source}")]
    Pack {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What `unpack` found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unpacked {
    /// Working copy restored from the archive
    Restored { bytes: u64 },
    /// No archive yet; the store starts empty
    Fresh,
}

#[derive(Debug, Clone)]
pub struct StoreArchive {
    pub archive_path: PathBuf,
    pub working_path: PathBuf,
}

impl StoreArchive {
    pub fn new<A: Into<PathBuf>, W: Into<PathBuf>>(archive_path: A, working_path: W) -> Self {
        Self {
            archive_path: archive_path.into(),
            working_path: working_path.into(),
        }
    }

    /// Decompress the archive over the working copy
    pub fn unpack(&self) -> Result<Unpacked, ArchiveError> {
        if !self.archive_path.exists() {
            tracing::info!(archive = %self.archive_path.display(), "no archive, starting a fresh store");
            return Ok(Unpacked::Fresh);
        }

        let bytes = transcode(&self.archive_path, &self.working_path, |input, output| {
            let mut decoder = GzDecoder::new(BufReader::new(input));
            io::copy(&mut decoder, output)
        })
        .map_err(|source| ArchiveError::Unpack {
            path: self.archive_path.clone(),
            source,
        })?;

        tracing::info!(
            archive = %self.archive_path.display(),
            working = %self.working_path.display(),
            bytes,
            "store unpacked"
        );
        Ok(Unpacked::Restored { bytes })
    }

    /// Compress the working copy into the archive
    pub fn pack(&self) -> Result<u64, ArchiveError> {
        let bytes = transcode(&self.working_path, &self.archive_path, |input, output| {
            let mut encoder = GzEncoder::new(output, Compression::default());
            let n = io::copy(&mut BufReader::new(input), &mut encoder)?;
            encoder.finish()?;
            Ok(n)
        })
        .map_err(|source| ArchiveError::Pack {
            path: self.archive_path.clone(),
            source,
        })?;

        tracing::info!(
            archive = %self.archive_path.display(),
            bytes,
            "store packed"
        );
        Ok(bytes)
    }
}

/// Stream `from` into a temp file next to `to`, then rename it into place
fn transcode<F>(from: &Path, to: &Path, f: F) -> io::Result<u64>
where
    F: FnOnce(File, &mut BufWriter<File>) -> io::Result<u64>,
{
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = to.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let input = File::open(from)?;
    let mut output = BufWriter::new(File::create(&tmp)?);
    let result = f(input, &mut output).and_then(|n| {
        output.flush()?;
        Ok(n)
    });

    match result {
        Ok(n) => {
            drop(output);
            fs::rename(&tmp, to)?;
            Ok(n)
        }
        Err(e) => {
            drop(output);
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    #[test]
    fn test_missing_archive_is_fresh() {
        let dir = TempDir::new().unwrap();
        let archive = StoreArchive::new(dir.path().join("none.db.gz"), dir.path().join("work.db"));
        assert_eq!(archive.unpack().unwrap(), Unpacked::Fresh);
        assert!(!archive.working_path.exists());
    }

    #[test]
    fn test_pack_then_unpack_restores_store() {
        let dir = TempDir::new().unwrap();
        let archive = StoreArchive::new(
            dir.path().join("assets/store.db.gz"),
            dir.path().join("work.db"),
        );

        {
            let db = Database::open_at(&archive.working_path).unwrap();
            crate::db::begin_run(&mut db.conn().unwrap(), "run-1").unwrap();
        }
        let original = fs::read(&archive.working_path).unwrap();
        archive.pack().unwrap();
        assert!(archive.archive_path.exists());

        fs::remove_file(&archive.working_path).unwrap();
        let unpacked = archive.unpack().unwrap();
        assert_eq!(unpacked, Unpacked::Restored { bytes: original.len() as u64 });
        assert_eq!(fs::read(&archive.working_path).unwrap(), original);

        let db = Database::open_at(&archive.working_path).unwrap();
        assert_eq!(db.recent_runs(5).unwrap()[0].run_id, "run-1");
    }

    #[test]
    fn test_corrupt_archive_keeps_working_copy() {
        let dir = TempDir::new().unwrap();
        let archive = StoreArchive::new(dir.path().join("bad.db.gz"), dir.path().join("work.db"));
        fs::write(&archive.archive_path, b"not gzip at all").unwrap();
        fs::write(&archive.working_path, b"previous").unwrap();

        assert!(matches!(archive.unpack(), Err(ArchiveError::Unpack { .. })));
        assert_eq!(fs::read(&archive.working_path).unwrap(), b"previous");
        assert!(!dir.path().join("work.db.tmp").exists());
    }

    #[test]
    fn test_pack_without_working_copy_fails() {
        let dir = TempDir::new().unwrap();
        let archive = StoreArchive::new(dir.path().join("out.db.gz"), dir.path().join("missing.db"));
        assert!(matches!(archive.pack(), Err(ArchiveError::Pack { .. })));
        assert!(!archive.archive_path.exists());
    }
}
