use std::panic::{self, AssertUnwindSafe};

use httpmock::MockServer;

/// Starts a fresh `httpmock::MockServer`, or returns `None` when the sandbox forbids binding.
pub fn try_start_mock_server() -> Option<MockServer> {
    panic::catch_unwind(AssertUnwindSafe(MockServer::start)).ok()
}
