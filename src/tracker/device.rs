use std::env;

use async_trait::async_trait;

use crate::tracker::error::{config_resolution_failed, TrackerResult};

const BUNDLE_ID_ENV: &str = "PLAUSIBLE_BUNDLE_ID";
const USER_AGENT_ENV: &str = "PLAUSIBLE_USER_AGENT";
const DEVICE_WIDTH_ENV: &str = "PLAUSIBLE_DEVICE_WIDTH";

/// Source of the application identity reported with every event.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait DeviceInfo: Send + Sync {
    /// Identifier of the running application, used as the host of synthesized screen URLs.
    async fn bundle_id(&self) -> TrackerResult<String>;

    /// User agent sent in the `User-Agent` header of each event request.
    async fn user_agent(&self) -> TrackerResult<String>;
}

/// Reports the current viewport width in logical pixels.
pub trait Viewport: Send + Sync {
    fn width(&self) -> u32;
}

impl<F> Viewport for F
where
    F: Fn() -> u32 + Send + Sync,
{
    fn width(&self) -> u32 {
        self()
    }
}

/// Device identity with fixed values, handy for embedding and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticDeviceInfo {
    bundle_id: String,
    user_agent: String,
}

impl StaticDeviceInfo {
    pub fn new(bundle_id: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            user_agent: user_agent.into(),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl DeviceInfo for StaticDeviceInfo {
    async fn bundle_id(&self) -> TrackerResult<String> {
        Ok(self.bundle_id.clone())
    }

    async fn user_agent(&self) -> TrackerResult<String> {
        Ok(self.user_agent.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedViewport(pub u32);

impl Viewport for FixedViewport {
    fn width(&self) -> u32 {
        self.0
    }
}

/// Device identity read from the process environment.
///
/// The bundle id comes from `PLAUSIBLE_BUNDLE_ID`. The user agent comes from
/// `PLAUSIBLE_USER_AGENT` and otherwise describes this library and the host platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostDeviceInfo;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl DeviceInfo for HostDeviceInfo {
    async fn bundle_id(&self) -> TrackerResult<String> {
        bundle_id_from_lookup(|key| env::var(key).ok())
    }

    async fn user_agent(&self) -> TrackerResult<String> {
        Ok(user_agent_from_lookup(|key| env::var(key).ok()))
    }
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bundle_id_from_lookup<F>(lookup: F) -> TrackerResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(&lookup, BUNDLE_ID_ENV).ok_or_else(|| {
        config_resolution_failed(format!(
            "unable to resolve bundle id: {BUNDLE_ID_ENV} is not set"
        ))
    })
}

fn user_agent_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(&lookup, USER_AGENT_ENV).unwrap_or_else(host_user_agent)
}

fn host_user_agent() -> String {
    format!(
        "{}/{} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env::consts::OS,
        env::consts::ARCH
    )
}

/// Viewport width read from `PLAUSIBLE_DEVICE_WIDTH`; headless hosts report 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostViewport;

impl Viewport for HostViewport {
    fn width(&self) -> u32 {
        width_from_lookup(|key| env::var(key).ok())
    }
}

fn width_from_lookup<F>(lookup: F) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    lookup(DEVICE_WIDTH_ENV)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}
