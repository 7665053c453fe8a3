mod api;
pub mod config;
mod constants;
pub mod device;
pub mod error;
pub mod payload;
pub mod transport;

pub use api::{Plausible, PlausibleBuilder, TrackHandle};
pub use config::{EventData, InitOptions, ResolvedOptions};
pub use device::{DeviceInfo, FixedViewport, HostDeviceInfo, HostViewport, StaticDeviceInfo, Viewport};
pub use error::{TrackerError, TrackerErrorCode, TrackerResult};
pub use payload::{EventPayload, EventProps, EventRequest};
pub use transport::{
    DispatchOutcome, Dispatcher, HttpTransport, ReqwestTransport, TransportResponse,
};
