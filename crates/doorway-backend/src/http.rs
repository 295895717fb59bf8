//! [`CounterBackend`] over HTTP using `reqwest`.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{
    BackendError, ConnectionConfig, CounterBackend, CounterReport, Endpoint, RequestTimeouts,
    ResetRequest, SessionId, TotalRepsReport,
};

/// The production backend: plain JSON over HTTP.
///
/// Cheap to share: `reqwest::Client` pools connections internally, so
/// one `HttpBackend` (in an `Arc`) serves every request of a game.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    timeouts: RequestTimeouts,
}

impl HttpBackend {
    /// Creates a backend with a fresh `reqwest` client.
    pub fn new(timeouts: RequestTimeouts) -> Self {
        Self::with_client(reqwest::Client::new(), timeouts)
    }

    /// Creates a backend on top of an existing client.
    pub fn with_client(client: reqwest::Client, timeouts: RequestTimeouts) -> Self {
        Self {
            client,
            timeouts: timeouts.validated(),
        }
    }

    /// The timeouts applied to each endpoint.
    pub fn timeouts(&self) -> &RequestTimeouts {
        &self.timeouts
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        connection: &ConnectionConfig,
        endpoint: Endpoint,
        timeout: Duration,
    ) -> Result<T, BackendError> {
        let url = connection.endpoint_url(endpoint)?;
        tracing::trace!(%endpoint, %url, "GET");
        let response = send(self.client.get(&url), endpoint, timeout).await?;
        decode(response, endpoint, timeout).await
    }
}

impl CounterBackend for HttpBackend {
    async fn reset_counter(
        &self,
        connection: &ConnectionConfig,
        session_id: &SessionId,
    ) -> Result<(), BackendError> {
        let endpoint = Endpoint::ResetCounter;
        let timeout = self.timeouts.reset;
        let url = connection.endpoint_url(endpoint)?;
        tracing::debug!(%url, %session_id, "resetting counter");

        let request = self.client.post(&url).json(&ResetRequest { session_id });
        let response = send(request, endpoint, timeout).await?;
        ensure_success(&response, endpoint)
    }

    async fn get_counter(
        &self,
        connection: &ConnectionConfig,
    ) -> Result<CounterReport, BackendError> {
        self.get_json(connection, Endpoint::GetCounter, self.timeouts.poll)
            .await
    }

    async fn get_total_reps(
        &self,
        connection: &ConnectionConfig,
    ) -> Result<TotalRepsReport, BackendError> {
        self.get_json(connection, Endpoint::GetTotalReps, self.timeouts.totals)
            .await
    }

    async fn probe_counter(
        &self,
        connection: &ConnectionConfig,
    ) -> Result<CounterReport, BackendError> {
        self.get_json(connection, Endpoint::GetCounter, self.timeouts.probe)
            .await
    }

    async fn check_status(&self, connection: &ConnectionConfig) -> Result<u16, BackendError> {
        let endpoint = Endpoint::Root;
        let url = connection.endpoint_url(endpoint)?;
        let response = send(self.client.get(&url), endpoint, self.timeouts.status).await?;
        Ok(response.status().as_u16())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn send(
    request: reqwest::RequestBuilder,
    endpoint: Endpoint,
    timeout: Duration,
) -> Result<reqwest::Response, BackendError> {
    request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify(e, endpoint, timeout))
}

fn ensure_success(response: &reqwest::Response, endpoint: Endpoint) -> Result<(), BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(BackendError::Status {
            endpoint,
            status: status.as_u16(),
        })
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: Endpoint,
    timeout: Duration,
) -> Result<T, BackendError> {
    ensure_success(&response, endpoint)?;
    let body = response
        .bytes()
        .await
        .map_err(|e| classify(e, endpoint, timeout))?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode {
        endpoint,
        reason: e.to_string(),
    })
}

/// Maps a `reqwest` failure onto our error taxonomy.
fn classify(err: reqwest::Error, endpoint: Endpoint, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            endpoint,
            after: timeout,
        }
    } else {
        BackendError::Request {
            endpoint,
            reason: err.to_string(),
        }
    }
}
