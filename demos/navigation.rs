//! Tracks app start-up and screen changes the way a navigation shell would.
//!
//! Run with `PLAUSIBLE_BUNDLE_ID=com.example.app cargo run --example navigation`.

use std::error::Error;

use plausible_tracker::{InitOptions, Plausible};
use serde_json::json;

/// Reports a screen view only when the active route actually changes.
struct RouteTracker {
    plausible: Plausible,
    current: Option<String>,
}

impl RouteTracker {
    fn new(plausible: Plausible) -> Self {
        Self {
            plausible,
            current: None,
        }
    }

    async fn on_state_change(&mut self, route: &str) {
        if self.current.as_deref() != Some(route) {
            let outcome = self.plausible.track_screen(route, None, None).outcome().await;
            println!("screen {route}: {outcome:?}");
        }
        self.current = Some(route.to_string());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let plausible = Plausible::new(
        InitOptions::new("example.com")
            .with_track_during_development(true)
            .with_debug(true),
    )?;

    plausible.track_event("app_loaded", None, None).detach();

    let mut routes = RouteTracker::new(plausible.clone());
    for route in ["Home", "Home", "Nested"] {
        routes.on_state_change(route).await;
    }

    let outcome = plausible
        .track_event("hello_world", json!({"foo": "bar"}).as_object().cloned(), None)
        .outcome()
        .await;
    println!("hello_world: {outcome:?}");

    Ok(())
}
