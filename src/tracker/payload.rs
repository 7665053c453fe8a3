use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tracker::config::ResolvedOptions;
use crate::tracker::constants::FORWARDED_FOR;
use crate::tracker::error::{internal_error, TrackerResult};

/// Free-form event properties, sent JSON-encoded in the `p` field.
pub type EventProps = Map<String, Value>;

/// Body of a `POST /api/event` request.
///
/// The single-letter field names are part of the collector's wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Event name.
    pub n: String,
    /// URL the event is bound to.
    pub u: String,
    /// Domain.
    pub d: String,
    /// Referrer.
    pub r: Option<String>,
    /// Device width.
    pub w: u32,
    /// JSON text of the event properties; absent when none were given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
}

impl EventPayload {
    pub fn from_options(
        event_name: &str,
        props: Option<&EventProps>,
        options: &ResolvedOptions,
    ) -> TrackerResult<Self> {
        let p = props
            .map(|props| {
                serde_json::to_string(props)
                    .map_err(|err| internal_error(format!("failed to encode event props: {err}")))
            })
            .transpose()?;

        Ok(Self {
            n: event_name.to_string(),
            u: options.url.clone(),
            d: options.domain.clone(),
            r: options.referrer.clone(),
            w: options.device_width,
            p,
        })
    }

    pub fn to_json(&self) -> TrackerResult<String> {
        serde_json::to_string(self)
            .map_err(|err| internal_error(format!("failed to encode event payload: {err}")))
    }
}

/// Everything needed to send one event: target, headers and payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub api_url: String,
    pub headers: BTreeMap<String, String>,
    pub payload: EventPayload,
}

impl EventRequest {
    pub fn new(options: &ResolvedOptions, payload: EventPayload) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), options.user_agent.clone()),
            ("X-Forwarded-For".to_string(), FORWARDED_FOR.to_string()),
        ]);
        Self {
            api_url: options.endpoint(),
            headers,
            payload,
        }
    }

    /// Pretty JSON rendering used for debug traces.
    pub fn describe(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}
