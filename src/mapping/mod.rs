//! Transformation from row-store records to index documents.

pub mod document_mapper;

pub use document_mapper::DocumentMapper;
