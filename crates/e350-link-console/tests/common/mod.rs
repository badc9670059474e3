/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities for console tests
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

use e350_link_adapter::{ClientConfig, DeviceClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> DeviceClient {
    DeviceClient::with_config(ClientConfig::default(), &server.uri()).expect("client init")
}
