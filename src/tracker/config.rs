use serde::Deserialize;
use url::Url;

use crate::tracker::constants::{DEFAULT_API_HOST, EVENT_PATH};
use crate::tracker::device::{DeviceInfo, Viewport};
use crate::tracker::error::{invalid_argument, TrackerResult};

/// Options captured once when the tracker is created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOptions {
    /// The site or app the events are bound to.
    pub domain: String,
    /// Send events even when running in development mode.
    #[serde(default)]
    pub track_during_development: Option<bool>,
    /// Log requests, responses and suppressed sends.
    #[serde(default)]
    pub debug: Option<bool>,
    /// Replaces the user agent reported by the device provider.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Collector base URL, `https://plausible.io` when unset.
    #[serde(default)]
    pub api_host: Option<String>,
}

impl InitOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn with_track_during_development(mut self, enabled: bool) -> Self {
        self.track_during_development = Some(enabled);
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = Some(api_host.into());
        self
    }

    pub fn validate(&self) -> TrackerResult<()> {
        if self.domain.trim().is_empty() {
            return Err(invalid_argument("domain must not be empty"));
        }
        if let Some(api_host) = &self.api_host {
            let parsed = Url::parse(api_host)
                .map_err(|err| invalid_argument(format!("invalid apiHost '{api_host}': {err}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid_argument(format!(
                    "apiHost '{api_host}' must use http or https"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn debug_enabled(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

/// Per-call overrides applied on top of the init options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventData {
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub device_width: Option<u32>,
}

impl EventData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_device_width(mut self, width: u32) -> Self {
        self.device_width = Some(width);
        self
    }
}

/// Fully merged options for a single dispatch. Every field is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub domain: String,
    pub track_during_development: bool,
    pub debug: bool,
    pub user_agent: String,
    pub api_host: String,
    pub url: String,
    pub referrer: Option<String>,
    pub device_width: u32,
}

impl ResolvedOptions {
    fn defaults(user_agent: String, device_width: u32) -> Self {
        Self {
            domain: String::new(),
            track_during_development: false,
            debug: false,
            user_agent,
            api_host: DEFAULT_API_HOST.to_string(),
            url: String::new(),
            referrer: None,
            device_width,
        }
    }

    fn overlay_init(mut self, init: &InitOptions) -> Self {
        self.domain = init.domain.clone();
        if let Some(enabled) = init.track_during_development {
            self.track_during_development = enabled;
        }
        if let Some(enabled) = init.debug {
            self.debug = enabled;
        }
        if let Some(user_agent) = &init.user_agent {
            self.user_agent = user_agent.clone();
        }
        if let Some(api_host) = &init.api_host {
            self.api_host = api_host.clone();
        }
        self
    }

    fn overlay_event_data(mut self, data: &EventData) -> Self {
        if let Some(url) = &data.url {
            self.url = url.clone();
        }
        if let Some(referrer) = &data.referrer {
            self.referrer = Some(referrer.clone());
        }
        if let Some(width) = data.device_width {
            self.device_width = width;
        }
        self
    }

    /// Collector endpoint, `<apiHost>/api/event`.
    pub fn endpoint(&self) -> String {
        let host = self.api_host.strip_suffix('/').unwrap_or(&self.api_host);
        format!("{host}{EVENT_PATH}")
    }
}

/// Resolves the options for one call: defaults, then `init`, then `overrides`.
///
/// The user agent and viewport width are read on every call since either may change while the
/// app runs. A failing device provider aborts resolution.
pub async fn resolve_options(
    init: &InitOptions,
    device: &dyn DeviceInfo,
    viewport: &dyn Viewport,
    overrides: Option<&EventData>,
) -> TrackerResult<ResolvedOptions> {
    let user_agent = device.user_agent().await?;
    let device_width = viewport.width();

    let resolved = ResolvedOptions::defaults(user_agent, device_width).overlay_init(init);
    Ok(match overrides {
        Some(data) => resolved.overlay_event_data(data),
        None => resolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::device::{FixedViewport, StaticDeviceInfo};
    use crate::tracker::error::{config_resolution_failed, TrackerErrorCode};
    use async_trait::async_trait;

    struct BrokenDevice;

    #[cfg_attr(not(target_arch = "wasm32"), async_trait)]
    #[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
    impl DeviceInfo for BrokenDevice {
        async fn bundle_id(&self) -> TrackerResult<String> {
            Err(config_resolution_failed("no bundle"))
        }

        async fn user_agent(&self) -> TrackerResult<String> {
            Err(config_resolution_failed("no user agent"))
        }
    }

    fn device() -> StaticDeviceInfo {
        StaticDeviceInfo::new("com.example.app", "mockUserAgent")
    }

    #[tokio::test(flavor = "current_thread")]
    async fn defaults_fill_every_field() {
        let init = InitOptions::new("example.com");
        let resolved = resolve_options(&init, &device(), &FixedViewport(1337), None)
            .await
            .unwrap();

        assert_eq!(
            resolved,
            ResolvedOptions {
                domain: "example.com".into(),
                track_during_development: false,
                debug: false,
                user_agent: "mockUserAgent".into(),
                api_host: "https://plausible.io".into(),
                url: String::new(),
                referrer: None,
                device_width: 1337,
            }
        );
        assert_eq!(resolved.endpoint(), "https://plausible.io/api/event");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn later_layers_win() {
        let init = InitOptions::new("example.com")
            .with_debug(true)
            .with_track_during_development(true)
            .with_user_agent("custom-agent")
            .with_api_host("https://stats.example.com/");
        let overrides = EventData::new()
            .with_url("custom_url")
            .with_referrer("my-referrer")
            .with_device_width(123);

        let resolved = resolve_options(&init, &device(), &FixedViewport(1337), Some(&overrides))
            .await
            .unwrap();

        assert_eq!(resolved.domain, "example.com");
        assert!(resolved.debug);
        assert!(resolved.track_during_development);
        assert_eq!(resolved.user_agent, "custom-agent");
        assert_eq!(resolved.url, "custom_url");
        assert_eq!(resolved.referrer.as_deref(), Some("my-referrer"));
        assert_eq!(resolved.device_width, 123);
        assert_eq!(resolved.endpoint(), "https://stats.example.com/api/event");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn viewport_is_read_on_every_call() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let width = AtomicU32::new(320);
        let viewport = || width.load(Ordering::SeqCst);
        let init = InitOptions::new("example.com");

        let first = resolve_options(&init, &device(), &viewport, None).await.unwrap();
        width.store(640, Ordering::SeqCst);
        let second = resolve_options(&init, &device(), &viewport, None).await.unwrap();

        assert_eq!(first.device_width, 320);
        assert_eq!(second.device_width, 640);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn provider_failure_aborts_resolution() {
        let init = InitOptions::new("example.com").with_user_agent("ignored");
        let err = resolve_options(&init, &BrokenDevice, &FixedViewport(1), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, TrackerErrorCode::ConfigResolution);
    }

    #[test]
    fn validate_rejects_blank_domain_and_bad_host() {
        assert_eq!(
            InitOptions::new("  ").validate().unwrap_err().code,
            TrackerErrorCode::InvalidArgument
        );
        assert!(InitOptions::new("example.com")
            .with_api_host("not a url")
            .validate()
            .is_err());
        assert!(InitOptions::new("example.com")
            .with_api_host("ftp://plausible.io")
            .validate()
            .is_err());
        assert!(InitOptions::new("example.com")
            .with_api_host("http://127.0.0.1:8000")
            .validate()
            .is_ok());
    }

    #[test]
    fn init_options_deserialize_from_camel_case() {
        let init: InitOptions = serde_json::from_str(
            r#"{"domain":"example.com","trackDuringDevelopment":true,"apiHost":"https://a.io"}"#,
        )
        .unwrap();
        assert_eq!(init.domain, "example.com");
        assert_eq!(init.track_during_development, Some(true));
        assert_eq!(init.api_host.as_deref(), Some("https://a.io"));
        assert_eq!(init.debug, None);
    }
}
