//! Client-side [Plausible Analytics](https://plausible.io) tracker.
//!
//! A [`Plausible`] tracker is created once with [`InitOptions`] and then reports custom events
//! and screen views to the collector's `/api/event` endpoint. Every call resolves its options
//! fresh (library defaults, then init options, then per-call [`EventData`]) and is sent on a
//! detached task, so analytics never blocks or fails the calling code.
//!
//! ```no_run
//! use plausible_tracker::{EventData, InitOptions, Plausible};
//! use serde_json::json;
//!
//! # async fn demo() -> plausible_tracker::TrackerResult<()> {
//! let plausible = Plausible::new(
//!     InitOptions::new("example.com").with_debug(true),
//! )?;
//!
//! plausible.track_event("signup", None, None);
//! plausible.track_event("Download", json!({"method": "HTTP"}).as_object().cloned(), None);
//!
//! // Await the handle only when the outcome matters.
//! let outcome = plausible
//!     .track_screen("Home", None, Some(EventData::new().with_referrer("push")))
//!     .outcome()
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! Sends are suppressed while the app runs in [`ExecutionMode::Development`] unless
//! `trackDuringDevelopment` is set.

pub mod logger;
pub mod platform;
pub mod tracker;

pub use platform::environment::ExecutionMode;
pub use tracker::{
    DeviceInfo, DispatchOutcome, EventData, EventPayload, EventProps, InitOptions, Plausible,
    PlausibleBuilder, ResolvedOptions, TrackHandle, TrackerError, TrackerErrorCode,
    TrackerResult, Viewport,
};

#[cfg(all(test, not(target_arch = "wasm32")))]
pub mod test_support;
