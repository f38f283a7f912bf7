//! Row to document transformation.

use crate::models::{PersonDocument, PersonRecord, DATE_FORMAT};

/// Converts person rows into index documents.
///
/// The mapping is total and side-effect free: every record yields exactly one
/// document, and mapping the same record twice yields equal documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMapper;

impl DocumentMapper {
    pub fn new() -> Self {
        Self
    }

    /// Build the index document for a record.
    ///
    /// A null date of birth becomes an absent `DOB` field. The fixed-width zip
    /// code loses its right padding.
    pub fn to_document(self, record: &PersonRecord) -> PersonDocument {
        PersonDocument {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            preferred_name: record.preferred_name.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            zip_code: record
                .zip_code
                .as_deref()
                .map(|zip| zip.trim_end().to_string()),
            date_of_birth: record
                .date_of_birth
                .map(|date| date.format(DATE_FORMAT).to_string()),
            email: record.email.clone(),
        }
    }

    /// Map a page of records, preserving order.
    pub fn to_documents(self, records: &[PersonRecord]) -> Vec<PersonDocument> {
        records.iter().map(|r| self.to_document(r)).collect()
    }
}

impl From<&PersonRecord> for PersonDocument {
    fn from(record: &PersonRecord) -> Self {
        DocumentMapper.to_document(record)
    }
}
