//! PagerDuty generic events API client

use serde::Deserialize;
use std::time::Duration;
use ureq::Agent;

use super::{SubmitOutcome, Submitter};

pub const EVENTS_API_BASE: &str = "https://events.pagerduty.com/generic/2010-04-15/create_event.json";

/// Response body of the events API
#[derive(Debug, Deserialize)]
struct EventsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    incident_key: Option<String>,
}

pub struct PagerDutyClient {
    endpoint: String,
    agent: Agent,
}

impl PagerDutyClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        // Non-2xx responses come back as responses so 4xx bodies can be logged
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            endpoint: endpoint.into(),
            agent: Agent::new_with_config(config),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Submitter for PagerDutyClient {
    fn submit(&self, payload: &str) -> SubmitOutcome {
        log::debug!("POST {} ({} bytes)", self.endpoint, payload.len());

        let mut response = match self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .send(payload.as_bytes())
        {
            Ok(response) => response,
            // DNS, connect, TLS and timeout failures are all worth retrying
            Err(e) => return SubmitOutcome::deferred(format!("request failed: {}", e)),
        };

        let status = response.status().as_u16();
        match response.body_mut().read_to_string() {
            Ok(body) => classify(status, &body),
            Err(e) if (200..300).contains(&status) => {
                SubmitOutcome::deferred(format!("[{}] failed to read response: {}", status, e))
            }
            Err(_) => classify(status, ""),
        }
    }
}

/// Map an HTTP status and body onto a delivery outcome
///
/// 4xx means the server understood and refused the event. Everything that
/// is not a 2xx or 4xx is deferred, as is a 2xx whose body cannot be
/// understood.
pub fn classify(status: u16, body: &str) -> SubmitOutcome {
    let body = body.trim();
    match status {
        200..=299 => match serde_json::from_str::<EventsApiResponse>(body) {
            Ok(resp) if resp.status == "success" => SubmitOutcome::accepted(resp.incident_key.unwrap_or_default()),
            Ok(_) => SubmitOutcome::rejected(body),
            Err(e) => SubmitOutcome::deferred(format!("[{}] unparseable response: {}", status, e)),
        },
        400..=499 => SubmitOutcome::rejected(format!("[{}] {}", status, body)),
        _ => SubmitOutcome::deferred(format!("[{}] {}", status, body)),
    }
}
