//! Whole-file CSV tables.
//!
//! Every write goes to a sibling temp file that is renamed over the target
//! once complete, so a failed write leaves the previous table intact.

use std::{
    fs::{self, File},
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::StoreError;

/// Reads every row of the table at `path`. A missing file is an empty table.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No persisted table yet");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Open {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), rows = rows.len(), "Read table");
    Ok(rows)
}

/// Replaces the table at `path` with `rows`. The header is always written,
/// so an empty table still carries its columns.
pub fn write_table<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<(), StoreError> {
    replace_atomically(path, |file| {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        let serialize_err = |source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        };
        writer.write_record(columns).map_err(serialize_err)?;
        for row in rows {
            writer.serialize(row).map_err(serialize_err)?;
        }
        writer.flush().map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    })?;
    debug!(path = %path.display(), rows = rows.len(), "Wrote table");
    Ok(())
}

/// Runs `write` against a fresh temp file next to `path`, syncs it, then
/// renames it over `path`. The temp file is removed on any failure.
pub(crate) fn replace_atomically<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut File) -> Result<(), StoreError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let tmp = dir.join(format!(".{name}.{}.tmp", Uuid::new_v4()));

    let result = write_and_rename(&tmp, path, write);
    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "Could not remove temp file");
            }
        }
    }
    result
}

fn write_and_rename<F>(tmp: &Path, target: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut File) -> Result<(), StoreError>,
{
    let write_err = |source: io::Error| StoreError::Write {
        path: target.to_path_buf(),
        source,
    };
    let mut file = File::create(tmp).map_err(write_err)?;
    write(&mut file)?;
    file.sync_all().map_err(write_err)?;
    drop(file);
    fs::rename(tmp, target).map_err(|source| StoreError::Rename {
        path: target.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serializer};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        value: Option<f64>,
    }

    const COLUMNS: &[&str] = &["id", "value"];

    struct Exploding;

    impl Serialize for Exploding {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("boom"))
        }
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<Row> = read_table(&dir.path().join("absent.csv")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn empty_table_keeps_its_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_table::<Row>(&path, COLUMNS, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,value\n");
        assert!(read_table::<Row>(&path).unwrap().is_empty());
    }

    #[test]
    fn rows_survive_a_write_read_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![
            Row { id: "a".into(), value: Some(1.5) },
            Row { id: "b".into(), value: None },
        ];
        write_table(&path, COLUMNS, &rows).unwrap();
        assert_eq!(read_table::<Row>(&path).unwrap(), rows);
    }

    #[test]
    fn failed_write_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&path, COLUMNS, &[Row { id: "keep".into(), value: Some(2.0) }]).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = write_table(&path, COLUMNS, &[Exploding]).unwrap_err();

        assert!(matches!(err, StoreError::Serialize { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn garbage_table_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,value\na,not-a-number\n").unwrap();
        let err = read_table::<Row>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
