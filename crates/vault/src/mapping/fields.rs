//! Static registry of protected fields per entity type.
//!
//! The set of encrypted attributes is a property of the record type, never of
//! an individual document.

/// Top-level keys of the stored JSON document.
pub type ProtectedFields = &'static [&'static str];

const SALE_FIELDS: ProtectedFields = &[
    "customerName",
    "dealValue",
    "contactDate",
    "salesperson",
    "note",
];

const SALES_PERSON_FIELDS: ProtectedFields = &["name"];

/// Persisted record types known to the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Sale,
    SalesPerson,
}

impl EntityKind {
    /// Fields that are encrypted at rest for this entity.
    pub fn protected_fields(self) -> ProtectedFields {
        match self {
            EntityKind::Sale => SALE_FIELDS,
            EntityKind::SalesPerson => SALES_PERSON_FIELDS,
        }
    }

    /// Name used in log fields and error messages.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Sale => "sale",
            EntityKind::SalesPerson => "sales_person",
        }
    }

    /// Document store collection the entity lives in.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Sale => "sales",
            EntityKind::SalesPerson => "salespersons",
        }
    }
}
