use crate::domain::{PageData, PageDataError, parse_page_data};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadPageFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] PageDataError),
}

/// Loads a page snapshot from disk. The current profile id rides in the
/// file name as a trailing `_<id>` suffix, the same way the generated
/// pages carry it in their address.
pub fn load_page_file(path: &Path) -> Result<PageData, LoadPageFileError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadPageFileError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let current_profile_id = profile_id_from_page_name(path);
    Ok(parse_page_data(&raw, current_profile_id)?)
}

pub fn profile_id_from_page_name(path: &Path) -> Option<i64> {
    let stem = path.file_stem()?.to_str()?;
    let (_, suffix) = stem.rsplit_once('_')?;
    if suffix.is_empty() || !suffix.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn profile_id_comes_from_trailing_suffix() {
        assert_eq!(
            profile_id_from_page_name(&PathBuf::from("/tmp/sessions_2.json")),
            Some(2)
        );
        assert_eq!(
            profile_id_from_page_name(&PathBuf::from("session_history_14.json")),
            Some(14)
        );
        assert_eq!(
            profile_id_from_page_name(&PathBuf::from("sessions.json")),
            None
        );
        assert_eq!(
            profile_id_from_page_name(&PathBuf::from("sessions_guest.json")),
            None
        );
    }

    #[test]
    fn loads_snapshot_and_infers_profile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions_2.json");
        fs::write(
            &path,
            r#"{
                "sessions": [{
                    "id": "s1",
                    "gameName": "Hades",
                    "durationMinutes": 40,
                    "startDate": "2026-08-22",
                    "startTime": "20:00",
                    "endTime": "20:40",
                    "type": "active"
                }],
                "profiles": [{ "id": 1, "name": "Family" }, { "id": 2, "name": "Guest" }]
            }"#,
        )
        .expect("write snapshot");

        let page = load_page_file(&path).expect("page data");
        assert_eq!(page.current_profile_id, Some(2));
        assert_eq!(page.sessions.len(), 1);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_page_file(&PathBuf::from("/nonexistent/sessions_1.json")).unwrap_err();
        assert!(matches!(err, LoadPageFileError::Read { .. }));
    }

    #[test]
    fn malformed_snapshot_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions_1.json");
        fs::write(&path, r#"{"profiles": []}"#).expect("write snapshot");
        let err = load_page_file(&path).unwrap_err();
        assert!(matches!(err, LoadPageFileError::Parse(_)));
    }
}
