//! Application service layer.
//!
//! Services orchestrate the pipeline, query layer and harness over injected
//! gateways. They provide a clean boundary between callers such as the CLI
//! and the data access layer.

mod person_search_service;

pub use person_search_service::{PersonSearchService, PersonSearchServiceImpl};
