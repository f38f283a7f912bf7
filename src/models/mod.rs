//! Data models for person records, index documents, and search outcomes.
//!
//! This module contains the row-store tuple, the index document built from it,
//! the index field typing, and the result values returned by the gateways.

pub mod bulk;
pub mod fields;
pub mod lookup;
pub mod person;
pub mod search;

pub use bulk::{BulkFailure, BulkResult};
pub use fields::{FieldKind, FieldTypeMap, PersonField};
pub use lookup::PersonLookup;
pub use person::{PersonDocument, PersonRecord, DATE_FORMAT};
pub use search::{ResultSet, DEFAULT_MAX_RESULTS};
