//! Archive of the raw payload of each pull.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    errors::StoreError, io::table::replace_atomically, models::date_range::DateRange,
    providers::EventsResponse,
};

/// `<dir>/events_<start>_to_<end>.json`
pub fn archive_path(dir: &Path, range: &DateRange) -> PathBuf {
    dir.join(format!(
        "events_{}_to_{}.json",
        range.start_param(),
        range.end_param()
    ))
}

/// Writes the payload as pretty JSON, replacing any archive for the same range.
pub fn write_raw_archive(
    dir: &Path,
    range: &DateRange,
    payload: &EventsResponse,
) -> Result<PathBuf, StoreError> {
    let path = archive_path(dir, range);
    let bytes = serde_json::to_vec_pretty(payload).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    replace_atomically(&path, |file| {
        file.write_all(&bytes).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "Archived raw payload");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[test]
    fn archive_is_named_after_the_range() {
        let dir = tempfile::tempdir().unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        )
        .unwrap();
        let payload = EventsResponse {
            events: vec![json!({"id": "EONET_1"})],
            ..Default::default()
        };

        let path = write_raw_archive(&dir.path().join("raw"), &range, &payload).unwrap();

        assert!(path.ends_with("raw/events_2024-03-01_to_2024-03-05.json"));
        let back: EventsResponse = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, payload);
    }
}
