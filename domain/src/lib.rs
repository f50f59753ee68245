use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize}; // For record definitions & stored documents
use serde_json::{Map, Value}; // To represent flattened record fields
use std::fmt;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Record serialization failed: {0}")]
    Serialization(String),
}

// --- Entity Kinds ---

/// The three kinds of record the backend accepts. Each maps to exactly one
/// store collection through a fixed table, so a typo can never create a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Volunteer,
    DonationPledge,
    ContactMessage,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Volunteer,
        EntityKind::DonationPledge,
        EntityKind::ContactMessage,
    ];

    /// Name of the store collection holding documents of this kind.
    pub fn collection_name(self) -> &'static str {
        match self {
            EntityKind::Volunteer => "volunteer",
            EntityKind::DonationPledge => "donationpledge",
            EntityKind::ContactMessage => "contactmessage",
        }
    }

    /// Declarative field list for this kind.
    pub fn schema(self) -> CollectionSchema {
        let fields = match self {
            EntityKind::Volunteer => vec![
                FieldDefinition::required("name", FieldType::Text),
                FieldDefinition::required("email", FieldType::Text),
                FieldDefinition::optional("phone", FieldType::Text),
                FieldDefinition::optional("interests", FieldType::Text),
                FieldDefinition::optional("availability", FieldType::Text),
                FieldDefinition::optional("message", FieldType::Text),
            ],
            EntityKind::DonationPledge => vec![
                FieldDefinition::required("name", FieldType::Text),
                FieldDefinition::required("email", FieldType::Text),
                FieldDefinition::required("amount", FieldType::Number),
                FieldDefinition::optional("frequency", FieldType::Text),
                FieldDefinition::optional("message", FieldType::Text),
            ],
            EntityKind::ContactMessage => vec![
                FieldDefinition::required("name", FieldType::Text),
                FieldDefinition::required("email", FieldType::Text),
                FieldDefinition::optional("subject", FieldType::Text),
                FieldDefinition::required("message", FieldType::Text),
            ],
        };
        CollectionSchema {
            name: self.collection_name(),
            fields,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

// --- Schema Definition ---

/// Defines the type of a field in a record schema.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")] // "text", "number" in JSON
pub enum FieldType {
    Text,
    Number,
}

/// Defines a single field within a record schema.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub optional: bool,
}

impl FieldDefinition {
    pub fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            optional: false,
        }
    }

    pub fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            optional: true,
        }
    }
}

/// The declared shape of one record kind.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub fields: Vec<FieldDefinition>,
}

impl CollectionSchema {
    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }
}

// --- Records ---

/// A schema-validated record that can be persisted into its kind's collection.
///
/// Validation happens when the record is deserialized: required fields must be
/// present and every field must have its declared primitive type.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    /// Flattens the record into the key-value form the store persists.
    /// Absent optional fields are omitted.
    fn to_fields(&self) -> Result<Map<String, Value>, DomainError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(other) => Err(DomainError::Serialization(format!(
                "expected an object for collection '{}', got {}",
                Self::KIND.collection_name(),
                other
            ))),
            Err(e) => Err(DomainError::Serialization(e.to_string())),
        }
    }
}

/// A volunteer sign-up.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Volunteer {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Areas the volunteer wants to help with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Record for Volunteer {
    const KIND: EntityKind = EntityKind::Volunteer;
}

/// A pledge to donate. The amount is not range-checked; zero pledges are accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DonationPledge {
    pub name: String,
    pub email: String,
    pub amount: f64,
    /// e.g. "one-time" or "monthly"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Record for DonationPledge {
    const KIND: EntityKind = EntityKind::DonationPledge;
}

/// A message sent through the website's contact form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl Record for ContactMessage {
    const KIND: EntityKind = EntityKind::ContactMessage;
}

// --- Document ID ---

/// Store-assigned identifier of a persisted document. Internal to the
/// persistence side; the API layer exposes it as a plain `id` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: String) -> Self {
        Self(id)
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}
impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Stored Document ---

/// A persisted document as the store returns it: the record's fields plus the
/// store's identifier under `_id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    #[serde(rename = "_id")]
    id: DocumentId,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: DocumentId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Gets a specific field's value.
    pub fn get_field_value(&self, field_name: &str) -> Option<&Value> {
        self.fields.get(field_name)
    }

    pub fn into_parts(self) -> (DocumentId, Map<String, Value>) {
        (self.id, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_volunteer() -> Volunteer {
        Volunteer {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            phone: Some("555-0100".to_string()),
            interests: Some("tree planting".to_string()),
            availability: Some("weekends".to_string()),
            message: Some("happy to help".to_string()),
        }
    }

    #[test]
    fn collection_names_are_fixed() {
        assert_eq!(EntityKind::Volunteer.collection_name(), "volunteer");
        assert_eq!(EntityKind::DonationPledge.collection_name(), "donationpledge");
        assert_eq!(EntityKind::ContactMessage.collection_name(), "contactmessage");
        for kind in EntityKind::ALL {
            assert_eq!(kind.to_string(), kind.collection_name());
            assert_eq!(kind.schema().name, kind.collection_name());
        }
    }

    #[test]
    fn schema_lists_every_serialized_field() {
        let fields = full_volunteer().to_fields().unwrap();
        let schema = EntityKind::Volunteer.schema();
        let mut declared: Vec<_> = schema.field_names();
        let mut serialized: Vec<_> = fields.keys().map(String::as_str).collect();
        declared.sort_unstable();
        serialized.sort_unstable();
        assert_eq!(declared, serialized);

        let pledge = DonationPledge {
            name: "B".to_string(),
            email: "b@x.org".to_string(),
            amount: 10.0,
            frequency: Some("monthly".to_string()),
            message: Some("keep going".to_string()),
        };
        let mut serialized: Vec<_> = pledge.to_fields().unwrap().keys().cloned().collect();
        let mut declared: Vec<_> = EntityKind::DonationPledge
            .schema()
            .field_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        serialized.sort_unstable();
        declared.sort_unstable();
        assert_eq!(declared, serialized);
    }

    #[test]
    fn schema_required_flags() {
        let schema = EntityKind::ContactMessage.schema();
        let required: Vec<_> = schema
            .fields
            .iter()
            .filter(|f| !f.optional)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, vec!["name", "email", "message"]);
        let amount = &EntityKind::DonationPledge.schema().fields[2];
        assert_eq!(amount.name, "amount");
        assert_eq!(amount.field_type, FieldType::Number);
    }

    #[test]
    fn absent_optional_fields_are_not_stored() {
        let contact: ContactMessage =
            serde_json::from_value(json!({"name": "A", "email": "a@x.com", "message": "hi"}))
                .unwrap();
        let fields = contact.to_fields().unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({"name": "A", "email": "a@x.com", "message": "hi"})
        );
    }

    #[test]
    fn missing_required_field_fails_deserialization() {
        let result: Result<ContactMessage, _> =
            serde_json::from_value(json!({"name": "A", "email": "a@x.com"}));
        assert!(result.unwrap_err().to_string().contains("message"));
    }

    #[test]
    fn wrong_field_type_fails_deserialization() {
        let result: Result<DonationPledge, _> = serde_json::from_value(
            json!({"name": "A", "email": "a@x.com", "amount": "a lot"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn permissive_amounts_are_accepted() {
        for amount in [0.0, -5.0, 1_000_000.5] {
            let pledge: DonationPledge = serde_json::from_value(
                json!({"name": "A", "email": "a@x.com", "amount": amount}),
            )
            .unwrap();
            assert_eq!(pledge.amount, amount);
        }
    }

    #[test]
    fn document_serializes_internal_id_field() {
        let fields = full_volunteer().to_fields().unwrap();
        let doc = Document::new(DocumentId::new("abc123".to_string()), fields);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], json!("abc123"));
        assert!(value.get("id").is_none());
        assert_eq!(value["name"], json!("Ada"));
    }

    #[test]
    fn document_splits_into_id_and_fields() {
        let record = full_volunteer();
        let doc = Document::new(
            DocumentId::new("1".to_string()),
            record.to_fields().unwrap(),
        );
        assert_eq!(doc.get_field_value("email"), Some(&json!("ada@example.org")));
        let (id, fields) = doc.into_parts();
        assert_eq!(id.as_str(), "1");
        let restored: Volunteer = serde_json::from_value(Value::Object(fields)).unwrap();
        assert_eq!(restored, record);
    }
}
