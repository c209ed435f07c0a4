//! JSONL (JSON Lines) record files.
//!
//! Each line is one JSON record. Results are only ever appended; the other
//! record kinds are rewritten whole when they change.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{StorageConfig, StorageError};

/// Record kinds, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    User,
    Result,
    UnlockedAchievement,
    CustomChallenge,
}

impl EntityType {
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::User => "users.jsonl",
            EntityType::Result => "results.jsonl",
            EntityType::UnlockedAchievement => "unlocked_achievements.jsonl",
            EntityType::CustomChallenge => "custom_challenges.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single record.
    pub fn append(&self, record: &T) -> Result<(), StorageError> {
        self.append_batch(std::slice::from_ref(record)).map(|_| ())
    }

    /// Append records in one open/flush.
    pub fn append_batch(&self, records: &[T]) -> Result<usize, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!("Appended {} records to {:?}", records.len(), self.path);
        Ok(records.len())
    }

    /// Replace the file contents. Written to a sibling temp file first and
    /// renamed into place, so readers never observe a half-written file.
    pub fn write_all(&self, records: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("Wrote {} records to {:?}", records.len(), self.path);
        Ok(records.len())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    /// Read every record. A missing file is empty; unparseable lines are
    /// logged and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.read_where(|_| true)
    }

    /// Read records matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(&line) {
                Ok(record) if predicate(&record) => records.push(record),
                Ok(_) => {}
                Err(e) => warn!("Skipping line {} in {:?}: {}", idx + 1, self.path, e),
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    /// Stream records without loading the whole file. Unlike
    /// [`read_all`](Self::read_all), a malformed line is yielded as an error
    /// carrying its line number.
    pub fn iter(&self) -> Result<JsonlIterator<T>, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::PathNotFound(self.path.clone()));
        }
        Ok(JsonlIterator {
            path: self.path.clone(),
            reader: BufReader::new(File::open(&self.path)?),
            line_no: 0,
            _marker: PhantomData,
        })
    }

    /// Read every record, failing on the first malformed line.
    pub fn read_all_strict(&self) -> Result<Vec<T>, StorageError> {
        self.iter()?.collect()
    }
}

/// Iterator over JSONL file entries.
pub struct JsonlIterator<T> {
    path: PathBuf,
    reader: BufReader<File>,
    line_no: usize,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for JsonlIterator<T> {
    type Item = Result<T, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => {
                    return Some(serde_json::from_str(&line).map_err(|source| {
                        StorageError::MalformedLine {
                            path: self.path.clone(),
                            line: self.line_no,
                            source,
                        }
                    }))
                }
                Err(e) => return Some(Err(StorageError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ResultMetrics, TypingResult, User};
    use tempfile::TempDir;

    fn result(user: &User, wpm: u32) -> TypingResult {
        TypingResult::new(
            user.id.clone(),
            Category::Standard,
            ResultMetrics {
                wpm,
                accuracy: 97,
                time_taken: 20,
                missed_chars: None,
                missed_words: None,
                cadence: None,
            },
        )
    }

    #[test]
    fn test_append_and_read_results() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let user = User::new("typist").unwrap();

        let writer = JsonlWriter::<TypingResult>::for_entity(&config, EntityType::Result);
        writer.append(&result(&user, 60)).unwrap();
        writer
            .append_batch(&[result(&user, 70), result(&user, 80)])
            .unwrap();

        let reader = JsonlReader::<TypingResult>::for_entity(&config, EntityType::Result);
        let all = reader.read_all().unwrap();
        assert_eq!(all.iter().map(|r| r.wpm()).collect::<Vec<_>>(), vec![60, 70, 80]);
        assert_eq!(reader.read_where(|r| r.wpm() > 65).unwrap().len(), 2);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<User> = JsonlReader::new(temp_dir.path().join("none.jsonl"));
        assert!(reader.read_all().unwrap().is_empty());
        assert!(matches!(reader.iter(), Err(StorageError::PathNotFound(_))));
    }

    #[test]
    fn test_write_all_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let writer: JsonlWriter<User> = JsonlWriter::new(path.clone());
        let reader: JsonlReader<User> = JsonlReader::new(path.clone());

        writer.write_all(&[User::new("first").unwrap()]).unwrap();
        writer
            .write_all(&[User::new("second").unwrap(), User::new("third").unwrap()])
            .unwrap();

        let users = reader.read_all().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "second");
        assert!(!path.with_extension("jsonl.tmp").exists());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let good = serde_json::to_string(&User::new("valid").unwrap()).unwrap();
        fs::write(&path, format!("{good}\nnot json\n\n{good}\n")).unwrap();

        let reader: JsonlReader<User> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap().len(), 2);

        let streamed: Vec<_> = reader.iter().unwrap().collect();
        assert_eq!(streamed.len(), 3);
        assert!(matches!(
            streamed[1],
            Err(StorageError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_strict_read_rejects_truncated_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        let good = serde_json::to_string(&User::new("valid").unwrap()).unwrap();
        fs::write(&path, format!("{good}\n\n{{\"id\":\"x\",\"na\n{good}\n")).unwrap();

        let reader: JsonlReader<User> = JsonlReader::new(path);
        match reader.read_all_strict() {
            Err(StorageError::MalformedLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed line, got {:?}", other.map(|v| v.len())),
        }

        let missing: JsonlReader<User> = JsonlReader::new(temp_dir.path().join("none.jsonl"));
        assert!(matches!(
            missing.read_all_strict(),
            Err(StorageError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_entity_filenames() {
        assert_eq!(EntityType::Result.filename(), "results.jsonl");
        assert_eq!(
            EntityType::UnlockedAchievement.filename(),
            "unlocked_achievements.jsonl"
        );
    }
}
