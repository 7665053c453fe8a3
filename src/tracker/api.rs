use std::fmt;
use std::sync::Arc;

use futures::channel::oneshot;

use crate::logger::{Logger, LOGGER};
use crate::platform::environment::{self, ExecutionMode};
use crate::platform::runtime::spawn_detached;
use crate::tracker::config::{resolve_options, EventData, InitOptions, ResolvedOptions};
use crate::tracker::constants::{PAGEVIEW_EVENT_NAME, SCREEN_URL_SCHEME};
use crate::tracker::device::{DeviceInfo, HostDeviceInfo, HostViewport, Viewport};
use crate::tracker::error::{internal_error, invalid_argument, TrackerResult};
use crate::tracker::payload::EventProps;
use crate::tracker::transport::{DispatchOutcome, Dispatcher, HttpTransport, ReqwestTransport};

/// Event and screen-view tracker bound to one domain.
///
/// Cloning is cheap; clones share the same options and collaborators.
///
/// # Examples
/// ```no_run
/// use plausible_tracker::{InitOptions, Plausible};
///
/// # fn demo() -> plausible_tracker::TrackerResult<()> {
/// let plausible = Plausible::new(InitOptions::new("example.com"))?;
///
/// // Tracks the 'signup' goal.
/// plausible.track_event("signup", None, None);
///
/// // Tracks a screen view of "HomeScreen".
/// plausible.track_screen("HomeScreen", None, None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Plausible {
    inner: Arc<PlausibleInner>,
}

impl fmt::Debug for Plausible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plausible")
            .field("domain", &self.inner.init.domain)
            .field("mode", &self.inner.dispatcher.execution_mode())
            .finish()
    }
}

struct PlausibleInner {
    init: InitOptions,
    device: Arc<dyn DeviceInfo>,
    viewport: Arc<dyn Viewport>,
    dispatcher: Dispatcher,
    logger: Logger,
}

impl PlausibleInner {
    async fn resolve(&self, overrides: Option<&EventData>) -> TrackerResult<ResolvedOptions> {
        resolve_options(
            &self.init,
            self.device.as_ref(),
            self.viewport.as_ref(),
            overrides,
        )
        .await
    }

    async fn screen_url(&self, screen_name: &str) -> TrackerResult<String> {
        let bundle_id = self.device.bundle_id().await?;
        Ok(format!("{SCREEN_URL_SCHEME}://{bundle_id}/{screen_name}"))
    }

    async fn track(
        &self,
        event_name: &str,
        props: Option<&EventProps>,
        overrides: Option<&EventData>,
    ) -> TrackerResult<DispatchOutcome> {
        if event_name.trim().is_empty() {
            return Err(invalid_argument("event name must not be empty"));
        }
        let options = self.resolve(overrides).await?;
        self.dispatcher.send_event(event_name, props, &options).await
    }

    async fn track_screen(
        &self,
        screen_name: &str,
        props: Option<&EventProps>,
        overrides: Option<EventData>,
    ) -> TrackerResult<DispatchOutcome> {
        let mut data = overrides.unwrap_or_default();
        if data.url.is_none() {
            data.url = Some(self.screen_url(screen_name).await?);
        }
        self.track(PAGEVIEW_EVENT_NAME, props, Some(&data)).await
    }

    /// Dispatch failures are already logged by the dispatcher; this covers everything before it.
    fn report(&self, result: &TrackerResult<DispatchOutcome>) {
        if let Err(err) = result {
            if self.init.debug_enabled() && !err.is_transport() {
                self.logger.error(format!("Plausible tracking failed: {err}"));
            }
        }
    }
}

impl Plausible {
    /// Creates a tracker using the host device providers, a `reqwest` transport and the
    /// execution mode detected from the environment.
    pub fn new(init: InitOptions) -> TrackerResult<Self> {
        Self::builder(init).build()
    }

    /// Creates a tracker from [`environment::init_options_from_env`].
    pub fn from_env() -> TrackerResult<Self> {
        let init = environment::init_options_from_env()?
            .ok_or_else(|| invalid_argument("PLAUSIBLE_DOMAIN or PLAUSIBLE_DEFAULTS must be set"))?;
        Self::new(init)
    }

    pub fn builder(init: InitOptions) -> PlausibleBuilder {
        PlausibleBuilder::new(init)
    }

    pub fn init_options(&self) -> &InitOptions {
        &self.inner.init
    }

    /// Tracks a custom event, such as a goal.
    ///
    /// The event is resolved and sent on a detached task. The returned handle may be awaited to
    /// observe the outcome or simply dropped; failures never reach the caller otherwise.
    pub fn track_event(
        &self,
        event_name: impl Into<String>,
        props: Option<EventProps>,
        overrides: Option<EventData>,
    ) -> TrackHandle {
        let inner = Arc::clone(&self.inner);
        let event_name = event_name.into();
        TrackHandle::spawn(async move {
            let result = inner
                .track(&event_name, props.as_ref(), overrides.as_ref())
                .await;
            inner.report(&result);
            result
        })
    }

    /// Tracks a `pageview` for `screen_name`.
    ///
    /// The URL defaults to `app://<bundle id>/<screen name>`; an explicit `overrides.url` wins.
    pub fn track_screen(
        &self,
        screen_name: impl Into<String>,
        props: Option<EventProps>,
        overrides: Option<EventData>,
    ) -> TrackHandle {
        let inner = Arc::clone(&self.inner);
        let screen_name = screen_name.into();
        TrackHandle::spawn(async move {
            let result = inner
                .track_screen(&screen_name, props.as_ref(), overrides)
                .await;
            inner.report(&result);
            result
        })
    }

    /// Resolves the options the next event would be sent with.
    pub async fn resolve_options(
        &self,
        overrides: Option<&EventData>,
    ) -> TrackerResult<ResolvedOptions> {
        self.inner.resolve(overrides).await
    }

    /// Returns the URL a screen view of `screen_name` is reported under.
    pub async fn screen_url(&self, screen_name: &str) -> TrackerResult<String> {
        self.inner.screen_url(screen_name).await
    }
}

/// Handle to a detached tracking task.
///
/// Dropping the handle (or calling [`TrackHandle::detach`]) leaves the task running with its
/// outcome discarded.
#[derive(Debug)]
pub struct TrackHandle {
    receiver: oneshot::Receiver<TrackerResult<DispatchOutcome>>,
}

impl TrackHandle {
    #[cfg(not(target_arch = "wasm32"))]
    fn spawn<F>(task: F) -> Self
    where
        F: std::future::Future<Output = TrackerResult<DispatchOutcome>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        spawn_detached(async move {
            let _ = sender.send(task.await);
        });
        Self { receiver }
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn<F>(task: F) -> Self
    where
        F: std::future::Future<Output = TrackerResult<DispatchOutcome>> + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        spawn_detached(async move {
            let _ = sender.send(task.await);
        });
        Self { receiver }
    }

    /// Waits for the task and returns its outcome.
    pub async fn outcome(self) -> TrackerResult<DispatchOutcome> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(internal_error("tracking task ended without a result")))
    }

    pub fn detach(self) {}
}

/// Configures the collaborators of a [`Plausible`] tracker.
pub struct PlausibleBuilder {
    init: InitOptions,
    device: Option<Arc<dyn DeviceInfo>>,
    viewport: Option<Arc<dyn Viewport>>,
    transport: Option<Arc<dyn HttpTransport>>,
    logger: Option<Logger>,
    mode: Option<ExecutionMode>,
}

impl PlausibleBuilder {
    fn new(init: InitOptions) -> Self {
        Self {
            init,
            device: None,
            viewport: None,
            transport: None,
            logger: None,
            mode: None,
        }
    }

    pub fn device_info(mut self, device: impl DeviceInfo + 'static) -> Self {
        self.device = Some(Arc::new(device));
        self
    }

    pub fn viewport(mut self, viewport: impl Viewport + 'static) -> Self {
        self.viewport = Some(Arc::new(viewport));
        self
    }

    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn build(self) -> TrackerResult<Plausible> {
        self.init.validate()?;

        let logger = self.logger.unwrap_or_else(|| LOGGER.clone());
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let mode = self.mode.unwrap_or_else(environment::execution_mode);

        Ok(Plausible {
            inner: Arc::new(PlausibleInner {
                init: self.init,
                device: self.device.unwrap_or_else(|| Arc::new(HostDeviceInfo)),
                viewport: self.viewport.unwrap_or_else(|| Arc::new(HostViewport)),
                dispatcher: Dispatcher::new(transport, logger.clone(), mode),
                logger,
            }),
        })
    }
}
