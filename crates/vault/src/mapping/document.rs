//! Sealing and opening protected fields inside JSON documents.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::crypto::{CipherError, FieldCodec};

/// Errors produced by the mapping layer.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The codec rejected a protected field.
    #[error("protected field `{field}`: {source}")]
    Cipher {
        field: String,
        #[source]
        source: CipherError,
    },

    /// A protected slot held something other than a string or null.
    #[error("protected field `{0}` must hold a string or null")]
    NotAString(String),

    /// The document is not a JSON object, so its fields cannot be located.
    #[error("document must be a JSON object")]
    NotAnObject,

    /// The record could not be converted to or from its JSON document.
    #[error("record serialisation failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Which way a document is crossing the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Plaintext → blob, on the write path.
    Seal,
    /// Blob → plaintext, on the read path.
    Open,
}

/// Run the codec over one protected slot.
///
/// A null slot is handed to the codec as `None` and comes back unchanged.
fn transform_value(
    value: &mut Value,
    field: &str,
    codec: &FieldCodec,
    direction: Direction,
) -> Result<(), MappingError> {
    let current = match value {
        Value::Null => None,
        Value::String(s) => Some(s.as_str()),
        _ => return Err(MappingError::NotAString(field.to_owned())),
    };
    let transformed = match direction {
        Direction::Seal => codec.encrypt_optional(current),
        Direction::Open => codec
            .decrypt_optional(current)
            .map_err(|source| MappingError::Cipher {
                field: field.to_owned(),
                source,
            })?,
    };
    if let Some(transformed) = transformed {
        *value = Value::String(transformed);
    }
    Ok(())
}

/// Transform every protected top-level key present in `doc`.
///
/// Absent keys are skipped, so an unset optional field never reaches the codec.
fn transform_fields(
    doc: &mut Value,
    fields: &[&str],
    codec: &FieldCodec,
    direction: Direction,
) -> Result<(), MappingError> {
    let Value::Object(map) = doc else {
        return Err(MappingError::NotAnObject);
    };
    for field in fields {
        if let Some(value) = map.get_mut(*field) {
            transform_value(value, field, codec, direction)?;
        }
    }
    Ok(())
}

/// Encrypt every protected field present in `doc`, in place.
///
/// Call exactly once per logical write, on a document that holds plaintext.
pub fn seal_document(
    doc: &mut Value,
    fields: &[&str],
    codec: &FieldCodec,
) -> Result<(), MappingError> {
    transform_fields(doc, fields, codec, Direction::Seal)
}

/// Decrypt every protected field present in `doc`, in place.
///
/// # Errors
///
/// Fails on the first field whose blob does not decrypt; the document is then
/// partially opened and must be discarded.
pub fn open_document(
    doc: &mut Value,
    fields: &[&str],
    codec: &FieldCodec,
) -> Result<(), MappingError> {
    transform_fields(doc, fields, codec, Direction::Open)
}

/// Serialise a plaintext record into its storage document.
pub fn seal_record<T: Serialize>(
    record: &T,
    fields: &[&str],
    codec: &FieldCodec,
) -> Result<Value, MappingError> {
    let mut doc = serde_json::to_value(record)?;
    seal_document(&mut doc, fields, codec)?;
    Ok(doc)
}

/// Materialise a plaintext record from a storage document.
pub fn open_record<T: DeserializeOwned>(
    mut doc: Value,
    fields: &[&str],
    codec: &FieldCodec,
) -> Result<T, MappingError> {
    open_document(&mut doc, fields, codec)?;
    Ok(serde_json::from_value(doc)?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::crypto::FieldKey;

    fn codec() -> FieldCodec {
        FieldCodec::new(FieldKey::generate())
    }

    #[test]
    fn seal_then_open_flat_fields() {
        let codec = codec();
        let mut doc = json!({
            "customerName": "Acme Corp",
            "dealValue": "₹84,000",
            "status": "In Progress"
        });
        let fields = ["customerName", "dealValue"];
        seal_document(&mut doc, &fields, &codec).unwrap();

        let sealed = doc["customerName"].as_str().unwrap();
        assert_ne!(sealed, "Acme Corp");
        assert!(sealed.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(doc["status"], "In Progress");

        open_document(&mut doc, &fields, &codec).unwrap();
        assert_eq!(doc["customerName"], "Acme Corp");
        assert_eq!(doc["dealValue"], "₹84,000");
    }

    #[test]
    fn nested_values_are_not_searched() {
        let codec = codec();
        let mut doc = json!({"account": {"customerName": "Jane Smith"}});
        seal_document(&mut doc, &["customerName"], &codec).unwrap();
        assert_eq!(doc["account"]["customerName"], "Jane Smith");
    }

    #[test]
    fn non_object_document_rejected() {
        let codec = codec();
        let mut doc = json!(["Acme Corp"]);
        let err = seal_document(&mut doc, &["customerName"], &codec).unwrap_err();
        assert!(matches!(err, MappingError::NotAnObject));
    }

    #[test]
    fn null_and_missing_fields_pass_through() {
        let codec = codec();
        let mut doc = json!({"note": null});
        let fields = ["note", "customerName"];
        seal_document(&mut doc, &fields, &codec).unwrap();
        assert_eq!(doc, json!({"note": null}));
        open_document(&mut doc, &fields, &codec).unwrap();
        assert_eq!(doc, json!({"note": null}));
    }

    #[test]
    fn empty_string_is_encrypted_not_skipped() {
        let codec = codec();
        let mut doc = json!({"note": ""});
        seal_document(&mut doc, &["note"], &codec).unwrap();
        assert_eq!(doc["note"].as_str().unwrap().len(), 64);
        open_document(&mut doc, &["note"], &codec).unwrap();
        assert_eq!(doc["note"], "");
    }

    #[test]
    fn non_string_protected_value_rejected() {
        let codec = codec();
        let mut doc = json!({"dealValue": 95000});
        let err = seal_document(&mut doc, &["dealValue"], &codec).unwrap_err();
        assert!(matches!(err, MappingError::NotAString(ref p) if p == "dealValue"));
    }

    #[test]
    fn open_reports_failing_field() {
        let codec = codec();
        let mut doc = json!({"customerName": "not-a-blob"});
        let err = open_document(&mut doc, &["customerName"], &codec).unwrap_err();
        match err {
            MappingError::Cipher { field, source } => {
                assert_eq!(field, "customerName");
                assert!(matches!(source, CipherError::Decryption(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn open_with_other_key_fails() {
        let mut doc = json!({"customerName": "Tech Solutions"});
        seal_document(&mut doc, &["customerName"], &codec()).unwrap();
        assert!(open_document(&mut doc, &["customerName"], &codec()).is_err());
    }

    #[test]
    fn typed_record_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Contact {
            name: String,
            phone: Option<String>,
        }

        let codec = codec();
        let contact = Contact {
            name: "Jim Halpert".into(),
            phone: None,
        };
        let doc = seal_record(&contact, &["name", "phone"], &codec).unwrap();
        assert_ne!(doc["name"], "Jim Halpert");
        assert!(doc["phone"].is_null());

        let back: Contact = open_record(doc, &["name", "phone"], &codec).unwrap();
        assert_eq!(back, contact);
    }
}
