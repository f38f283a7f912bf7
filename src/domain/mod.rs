//! Domain value objects and types.
//!
//! Type-safe wrappers for the names that reach the backends: the source table
//! and the target index. Both validate at construction time so that only
//! well-formed identifiers are ever interpolated into SQL or URL paths.

pub mod errors;
pub mod index_name;
pub mod table;

pub use errors::ValidationError;
pub use index_name::IndexName;
pub use table::TableDescriptor;
