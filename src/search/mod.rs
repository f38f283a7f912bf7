//! In-process search index and its text analysis.
//!
//! [`InMemorySearchIndex`] evaluates the engine's JSON query language over
//! documents held in memory, honouring the index field typing.

pub mod analysis;
pub mod memory_index;

pub use memory_index::{InMemorySearchIndex, MAX_FUZZINESS};
