use crate::domain::{PageData, PageDataError, page_data_from_value};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8088";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("backend rejected {url} with status {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    PageData(#[from] PageDataError),
}

/// Narrow client for the tracker backend. One method per endpoint, one
/// request/response exchange each, no retries: a failure surfaces once and
/// leaves the durable state untouched.
#[derive(Clone, Debug)]
pub struct MutationGateway {
    agent: ureq::Agent,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSessionRequest<'a> {
    session_id: &'a str,
    new_game_name: &'a str,
    new_duration: u32,
}

impl MutationGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        Self {
            agent: config.into(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the materialized session and profile collections the page is
    /// rendered from.
    pub fn fetch_page_data(&self, profile_id: Option<i64>) -> Result<PageData, GatewayError> {
        let url = match profile_id {
            Some(id) => format!("{}/session-data/{id}", self.base_url),
            None => format!("{}/session-data", self.base_url),
        };
        let mut response = self
            .agent
            .get(&url)
            .call()
            .map_err(|error| map_call_error(&url, error))?;
        let value = response
            .body_mut()
            .read_json::<serde_json::Value>()
            .map_err(|error| GatewayError::Request {
                url,
                message: error.to_string(),
            })?;
        Ok(page_data_from_value(value, profile_id)?)
    }

    /// The only operation reconciled in place: on success the caller patches
    /// the affected row instead of reloading.
    pub fn update_session(
        &self,
        session_id: &str,
        new_game_name: &str,
        new_duration_minutes: u32,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/update-session", self.base_url);
        let body = UpdateSessionRequest {
            session_id,
            new_game_name,
            new_duration: new_duration_minutes,
        };
        self.agent
            .post(&url)
            .send_json(&body)
            .map_err(|error| map_call_error(&url, error))?;
        Ok(())
    }

    pub fn remove_session(&self, session_id: &str) -> Result<(), GatewayError> {
        self.get(&format!("remove-session/{session_id}"))
    }

    pub fn switch_session_profile(
        &self,
        session_id: &str,
        new_profile_id: i64,
    ) -> Result<(), GatewayError> {
        self.get(&format!(
            "switch-session-profile/{session_id}/{new_profile_id}"
        ))
    }

    pub fn convert_idle_session(&self, session_id: &str) -> Result<(), GatewayError> {
        self.get(&format!("convert-idle-session/{session_id}"))
    }

    pub fn delete_idle_session(&self, session_id: &str) -> Result<(), GatewayError> {
        self.get(&format!("delete-idle-session/{session_id}"))
    }

    fn get(&self, path: &str) -> Result<(), GatewayError> {
        let url = format!("{}/{path}", self.base_url);
        self.agent
            .get(&url)
            .call()
            .map(|_| ())
            .map_err(|error| map_call_error(&url, error))
    }
}

fn map_call_error(url: &str, error: ureq::Error) -> GatewayError {
    match error {
        ureq::Error::StatusCode(status) => GatewayError::Status {
            url: url.to_string(),
            status,
        },
        other => GatewayError::Request {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
