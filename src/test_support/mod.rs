//! Test utilities shared across crate-level unit tests.

pub mod http;

pub use http::try_start_mock_server;
