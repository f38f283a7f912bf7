//! Person model: the row-store tuple and the index document built from it.

use super::fields::PersonField;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for `DOB` in index documents.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A person row as read from the row store.
///
/// Every column is nullable in the source table. Rows carry no primary key;
/// their identity is their position under the pipeline's order key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Fixed-width column; may arrive right-padded with spaces
    pub zip_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
}

impl PersonRecord {
    /// Create a record with the name fields set and everything else null.
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let first_name = first_name.into();
        Self {
            preferred_name: Some(first_name.clone()),
            first_name: Some(first_name),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    /// Set the date of birth.
    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    /// Set city and state.
    pub fn with_location(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self
    }

    /// Set the zip code.
    pub fn with_zip_code(mut self, zip_code: impl Into<String>) -> Self {
        self.zip_code = Some(zip_code.into());
        self
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Textual value of a column, used for ordering and filtering in memory.
    pub fn column_text(&self, field: PersonField) -> Option<String> {
        match field {
            PersonField::FirstName => self.first_name.clone(),
            PersonField::LastName => self.last_name.clone(),
            PersonField::PreferredName => self.preferred_name.clone(),
            PersonField::City => self.city.clone(),
            PersonField::State => self.state.clone(),
            PersonField::ZipCode => self.zip_code.clone(),
            PersonField::DateOfBirth => self
                .date_of_birth
                .map(|d| d.format(DATE_FORMAT).to_string()),
            PersonField::Email => self.email.clone(),
        }
    }
}

/// A person document as stored in the search index.
///
/// Absent values are omitted from the serialized document rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,

    /// ISO-8601 calendar date (`YYYY-MM-DD`)
    #[serde(rename = "DOB", default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PersonDocument {
    /// Value of a field by its typed name.
    pub fn field(&self, field: PersonField) -> Option<&str> {
        let value = match field {
            PersonField::FirstName => &self.first_name,
            PersonField::LastName => &self.last_name,
            PersonField::PreferredName => &self.preferred_name,
            PersonField::City => &self.city,
            PersonField::State => &self.state,
            PersonField::ZipCode => &self.zip_code,
            PersonField::DateOfBirth => &self.date_of_birth,
            PersonField::Email => &self.email,
        };
        value.as_deref()
    }

    /// Parse the stored date of birth back into a calendar date.
    pub fn parsed_date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_index_field_names() {
        let doc = PersonDocument {
            first_name: Some("Rahul".to_string()),
            zip_code: Some("400001".to_string()),
            date_of_birth: Some("1990-05-10".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["FirstName"], "Rahul");
        assert_eq!(json["ZipCode"], "400001");
        assert_eq!(json["DOB"], "1990-05-10");
        assert!(json.get("LastName").is_none());
    }

    #[test]
    fn test_document_deserializes_partial_source() {
        let doc: PersonDocument =
            serde_json::from_str(r#"{"FirstName":"Anjali","State":"MH"}"#).unwrap();
        assert_eq!(doc.first_name.as_deref(), Some("Anjali"));
        assert_eq!(doc.state.as_deref(), Some("MH"));
        assert!(doc.date_of_birth.is_none());
    }

    #[test]
    fn test_field_accessor() {
        let doc = PersonDocument {
            email: Some("amit.gupta@randommail.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            doc.field(PersonField::Email),
            Some("amit.gupta@randommail.com")
        );
        assert_eq!(doc.field(PersonField::City), None);
    }

    #[test]
    fn test_record_builder() {
        let record = PersonRecord::named("Pooja", "Mehta")
            .with_location("Pune", "MH")
            .with_date_of_birth(NaiveDate::from_ymd_opt(1985, 1, 31).unwrap());

        assert_eq!(record.preferred_name.as_deref(), Some("Pooja"));
        assert_eq!(
            record.column_text(PersonField::DateOfBirth).as_deref(),
            Some("1985-01-31")
        );
    }
}
