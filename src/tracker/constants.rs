pub(crate) const DEFAULT_API_HOST: &str = "https://plausible.io";
pub(crate) const EVENT_PATH: &str = "/api/event";
pub(crate) const PAGEVIEW_EVENT_NAME: &str = "pageview";
pub(crate) const SCREEN_URL_SCHEME: &str = "app";
/// Sent in place of the real client address.
pub(crate) const FORWARDED_FOR: &str = "127.0.0.1";
