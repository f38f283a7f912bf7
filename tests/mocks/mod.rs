//! Instrumented gateway doubles shared by the integration tests.

pub mod flaky_index_gateway;
pub mod recording_row_store;

#[allow(unused_imports)]
pub use flaky_index_gateway::FlakyIndexGateway;
#[allow(unused_imports)]
pub use recording_row_store::RecordingRowStore;
