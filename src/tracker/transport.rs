use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::logger::{LogArgument, LogLevel, Logger};
use crate::platform::environment::ExecutionMode;
use crate::tracker::config::ResolvedOptions;
use crate::tracker::error::{internal_error, transport_error, TrackerResult};
use crate::tracker::payload::{EventPayload, EventProps, EventRequest};

/// A completed HTTP exchange. The status is recorded but never inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal async POST primitive the dispatcher sends events through.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait HttpTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: String,
    ) -> TrackerResult<TransportResponse>;
}

/// Default transport backed by an async `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> TrackerResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| internal_error(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: String,
    ) -> TrackerResult<TransportResponse> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|err| transport_error(format!("failed to send event: {err}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(format!("failed to read event response: {err}")))?;

        Ok(TransportResponse { status, body })
    }
}

/// Result of a dispatch that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Development mode without `trackDuringDevelopment`; nothing was sent.
    Suppressed,
    /// The collector answered, whatever the status code.
    Sent(TransportResponse),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent(_))
    }
}

/// Gates, serializes and transmits single events.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    logger: Logger,
    mode: ExecutionMode,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, logger: Logger, mode: ExecutionMode) -> Self {
        Self {
            transport,
            logger,
            mode,
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Sends one event to `<apiHost>/api/event`.
    ///
    /// Diagnostics are only logged when `options.debug` is set. Transport failures are logged
    /// and returned; any response that arrives counts as sent.
    pub async fn send_event(
        &self,
        event_name: &str,
        props: Option<&EventProps>,
        options: &ResolvedOptions,
    ) -> TrackerResult<DispatchOutcome> {
        if self.mode.is_development() && !options.track_during_development {
            if options.debug {
                self.logger
                    .warn("[Plausible] Ignoring event because app is running in development");
            }
            return Ok(DispatchOutcome::Suppressed);
        }

        let payload = EventPayload::from_options(event_name, props, options)?;
        let body = payload.to_json()?;
        let request = EventRequest::new(options, payload);

        if options.debug {
            self.logger
                .info(format!("Plausible request: {}", request.describe()));
        }

        match self
            .transport
            .post(&request.api_url, &request.headers, body)
            .await
        {
            Ok(response) => {
                if options.debug {
                    self.logger.log_with(
                        LogLevel::Info,
                        [
                            LogArgument::Text("Plausible API response:".into()),
                            LogArgument::Value(json!({ "text": &response.body })),
                        ],
                    );
                }
                Ok(DispatchOutcome::Sent(response))
            }
            Err(err) => {
                if options.debug {
                    self.logger.log_with(
                        LogLevel::Error,
                        [
                            LogArgument::Text("Plausible API error:".into()),
                            LogArgument::Value(json!({ "error": err.message() })),
                        ],
                    );
                }
                Err(err)
            }
        }
    }
}
