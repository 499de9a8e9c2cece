use std::io::{BufRead, BufReader};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Response;
use reqwest::StatusCode;

use crate::error::{Result, StageplanError};
use stageplan_common::api::{ErrorResponse, HealthResponse, ItemsResponse, DATA_CHANGED_EVENT};
use stageplan_common::{ItemId, ItemPatch, NewItem, ScheduledItem};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for communicating with the stageplan server.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StageplanError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into the matching error.
    fn error_for(resp: Response, id: Option<ItemId>, fallback: &str) -> StageplanError {
        let status = resp.status();
        let message = resp
            .json::<ErrorResponse>()
            .map(|e| e.error)
            .unwrap_or_else(|_| fallback.to_string());
        match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => StageplanError::NotFound(id),
            (StatusCode::BAD_REQUEST, _) | (StatusCode::UNPROCESSABLE_ENTITY, _) => {
                StageplanError::Rejected(message)
            }
            _ => StageplanError::Network(format!("{message} ({status})")),
        }
    }

    pub fn health(&self) -> Result<HealthResponse> {
        let resp = self
            .client
            .get(self.url("/api/v1/health"))
            .send()
            .map_err(|e| StageplanError::Network(e.to_string()))?;

        if resp.status().is_success() {
            resp.json()
                .map_err(|e| StageplanError::Network(e.to_string()))
        } else {
            Err(Self::error_for(resp, None, "health check failed"))
        }
    }

    pub fn get_items(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduledItem>> {
        let resp = self
            .client
            .get(self.url("/api/v1/items"))
            .query(&[
                ("start", start.to_rfc3339_opts(SecondsFormat::Millis, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ])
            .send()
            .map_err(|e| StageplanError::Network(e.to_string()))?;

        if resp.status().is_success() {
            let body: ItemsResponse = resp
                .json()
                .map_err(|e| StageplanError::Network(e.to_string()))?;
            Ok(body.items)
        } else {
            Err(Self::error_for(resp, None, "failed to fetch items"))
        }
    }

    pub fn create_item(&self, item: &NewItem) -> Result<ScheduledItem> {
        let resp = self
            .client
            .post(self.url("/api/v1/items"))
            .json(item)
            .send()
            .map_err(|e| StageplanError::Network(e.to_string()))?;

        if resp.status().is_success() {
            resp.json()
                .map_err(|e| StageplanError::Network(e.to_string()))
        } else {
            Err(Self::error_for(resp, None, "failed to create item"))
        }
    }

    pub fn patch_item(&self, id: ItemId, patch: &ItemPatch) -> Result<ScheduledItem> {
        let resp = self
            .client
            .patch(self.url(&format!("/api/v1/items/{id}")))
            .json(patch)
            .send()
            .map_err(|e| StageplanError::Network(e.to_string()))?;

        if resp.status().is_success() {
            resp.json()
                .map_err(|e| StageplanError::Network(e.to_string()))
        } else {
            Err(Self::error_for(resp, Some(id), "failed to update item"))
        }
    }

    /// Block reading the server-sent event stream, calling `on_change` for
    /// every data-changed notification. Returns when the stream ends or
    /// `on_change` returns `false`.
    pub fn listen_events(&self, mut on_change: impl FnMut() -> bool) -> Result<()> {
        // The stream is long-lived; only the connect is bounded.
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(None)
            .build()
            .map_err(|e| StageplanError::Network(e.to_string()))?;
        let resp = client
            .get(self.url("/api/v1/events"))
            .header("Accept", "text/event-stream")
            .send()
            .map_err(|e| StageplanError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, None, "failed to subscribe to events"));
        }

        for line in BufReader::new(resp).lines() {
            let line = line?;
            if is_data_changed(&line) && !on_change() {
                break;
            }
        }
        Ok(())
    }
}

fn is_data_changed(line: &str) -> bool {
    line.strip_prefix("event:")
        .map(|name| name.trim() == DATA_CHANGED_EVENT)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_lines() {
        assert!(is_data_changed("event: data_changed"));
        assert!(is_data_changed("event:data_changed"));
        assert!(!is_data_changed("data: data_changed"));
        assert!(!is_data_changed(": keep-alive"));
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/api/v1/items"), "http://localhost:8080/api/v1/items");
    }
}
