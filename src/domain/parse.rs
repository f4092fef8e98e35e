use crate::domain::{PageData, Profile, Session};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageDataError {
    #[error("page data is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("session data is missing or not an array")]
    MissingSessions,

    #[error("malformed session record: {0}")]
    InvalidSession(String),

    #[error("malformed profile record: {0}")]
    InvalidProfile(String),
}

/// Parses the page payload: `{"sessions": [...], "profiles": [...]}`.
///
/// A missing or non-array session collection is a hard error; the caller
/// renders the error page instead of a table. A missing or non-array
/// profile collection degrades to an empty set, which just means no row
/// offers the switch-profile action.
pub fn parse_page_data(
    text: &str,
    current_profile_id: Option<i64>,
) -> Result<PageData, PageDataError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|error| PageDataError::InvalidJson(error.to_string()))?;
    page_data_from_value(value, current_profile_id)
}

pub fn page_data_from_value(
    value: serde_json::Value,
    current_profile_id: Option<i64>,
) -> Result<PageData, PageDataError> {
    let sessions_value = value
        .get("sessions")
        .cloned()
        .ok_or(PageDataError::MissingSessions)?;
    if !sessions_value.is_array() {
        return Err(PageDataError::MissingSessions);
    }
    let sessions: Vec<Session> = serde_json::from_value(sessions_value)
        .map_err(|error| PageDataError::InvalidSession(error.to_string()))?;

    let profiles: Vec<Profile> = match value.get("profiles") {
        Some(profiles_value) if profiles_value.is_array() => {
            serde_json::from_value(profiles_value.clone())
                .map_err(|error| PageDataError::InvalidProfile(error.to_string()))?
        }
        _ => Vec::new(),
    };

    Ok(PageData {
        sessions,
        profiles,
        current_profile_id,
    })
}
