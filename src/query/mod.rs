//! Query construction and execution.
//!
//! [`QueryBuilder`] turns a [`SearchIntent`] into a [`QueryBody`] without I/O;
//! [`SearchExecutor`] runs it against the index and normalizes the hits.

pub mod builder;
pub mod dsl;
pub mod executor;

pub use builder::{
    QueryBody, QueryBuilder, SearchIntent, DEFAULT_FUZZY_DISTANCE, MAX_FUZZY_DISTANCE,
};
pub use executor::{parse_response, SearchExecutor};
