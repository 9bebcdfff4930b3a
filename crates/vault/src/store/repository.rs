//! [`Repository`]: the persistence adapter for sales and salespeople.
//!
//! Every document that enters the [`DocumentStore`] is sealed here and every
//! document that leaves it is opened here; callers only ever see plaintext
//! records.

use chrono::Utc;
use common::{
    protocol::{NewSale, NewSalesPerson, SaleUpdate},
    Sale, SalesPerson, ServiceError,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::DocumentStore;
use crate::crypto::FieldCodec;
use crate::mapping::{open_record, seal_document, seal_record, EntityKind, MappingError};

const OWNER_FIELD: &str = "clerkUserId";
const ORGANIZATION_FIELD: &str = "organizationId";
const UPDATED_AT_FIELD: &str = "updatedAt";
const NAME_FIELD: &str = "name";

/// Errors produced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No document with that id exists for the caller.
    #[error("{} not found", .0.name())]
    NotFound(EntityKind),

    /// The owner already has a record with this name.
    #[error("{} name already exists", .0.name())]
    DuplicateName(EntityKind),

    /// Sealing or opening a document failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(kind) => {
                ServiceError::NotFound(format!("{} not found", kind.name()))
            }
            RepositoryError::DuplicateName(_) => {
                ServiceError::BadRequest("Name already exists".into())
            }
            RepositoryError::Mapping(MappingError::Serde(_)) => {
                ServiceError::Internal("record serialisation failed".into())
            }
            RepositoryError::Mapping(_) => {
                ServiceError::EncryptionFailure("failed to decrypt stored record".into())
            }
        }
    }
}

fn is_owned_by(doc: &Value, owner: &str) -> bool {
    doc.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner)
}

fn lacks_organization(doc: &Value) -> bool {
    match doc.get(ORGANIZATION_FIELD) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Owner-scoped access to sales and salespeople.
///
/// Cheap to clone; clones share the same store and codec.
#[derive(Clone, Debug)]
pub struct Repository {
    store: DocumentStore,
    codec: FieldCodec,
}

impl Repository {
    pub fn new(store: DocumentStore, codec: FieldCodec) -> Self {
        Self { store, codec }
    }

    /// The codec used at the storage boundary.
    pub fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    /// The underlying document store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn open<T: serde::de::DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: Uuid,
        doc: Value,
    ) -> Result<T, RepositoryError> {
        open_record(doc, kind.protected_fields(), &self.codec).map_err(|e| {
            // The id is safe to log; the field contents are not.
            warn!(entity = kind.name(), id = %id, error = %e, "failed to open stored record");
            RepositoryError::from(e)
        })
    }

    async fn get_owned(
        &self,
        kind: EntityKind,
        owner: &str,
        id: Uuid,
    ) -> Result<Value, RepositoryError> {
        self.store
            .get(kind.collection(), id)
            .await
            .filter(|doc| is_owned_by(doc, owner))
            .ok_or(RepositoryError::NotFound(kind))
    }

    async fn list_owned<T: serde::de::DeserializeOwned>(
        &self,
        kind: EntityKind,
        owner: &str,
    ) -> Result<Vec<T>, RepositoryError> {
        let docs = self
            .store
            .find(kind.collection(), |doc| is_owned_by(doc, owner))
            .await;
        // Newest first.
        docs.into_iter()
            .rev()
            .map(|(id, doc)| self.open(kind, id, doc))
            .collect()
    }

    async fn delete_owned(
        &self,
        kind: EntityKind,
        owner: &str,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        match self
            .store
            .remove_if(kind.collection(), id, |doc| is_owned_by(doc, owner))
            .await
        {
            Some(_) => {
                debug!(entity = kind.name(), id = %id, "record deleted");
                Ok(())
            }
            None => Err(RepositoryError::NotFound(kind)),
        }
    }

    fn ensure_unique_name(
        &self,
        existing: &[(Uuid, Value)],
        owner: &str,
        name: &str,
    ) -> Result<(), RepositoryError> {
        for (_, doc) in existing.iter().filter(|(_, doc)| is_owned_by(doc, owner)) {
            let stored = self
                .codec
                .decrypt_optional(doc.get(NAME_FIELD).and_then(Value::as_str))
                .map_err(|source| MappingError::Cipher {
                    field: NAME_FIELD.to_owned(),
                    source,
                })?;
            if stored.as_deref() == Some(name) {
                return Err(RepositoryError::DuplicateName(EntityKind::SalesPerson));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sales
    // -----------------------------------------------------------------------

    /// Store a new sale for `owner` and return it in plaintext.
    pub async fn create_sale(&self, owner: &str, new: NewSale) -> Result<Sale, RepositoryError> {
        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4(),
            clerk_user_id: owner.to_owned(),
            organization_id: new.organization_id,
            customer_name: new.customer_name,
            deal_value: new.deal_value,
            status: new.status,
            contact_date: new.contact_date,
            salesperson: new.salesperson,
            priority: new.priority,
            note: new.note,
            created_at: now,
            updated_at: now,
        };

        let doc = seal_record(&sale, EntityKind::Sale.protected_fields(), &self.codec)?;
        self.store
            .insert(EntityKind::Sale.collection(), sale.id, doc)
            .await;
        debug!(sale_id = %sale.id, "sale created");
        Ok(sale)
    }

    /// All of `owner`'s sales, newest first.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any stored sale does not decrypt.
    pub async fn list_sales(&self, owner: &str) -> Result<Vec<Sale>, RepositoryError> {
        self.list_owned(EntityKind::Sale, owner).await
    }

    pub async fn get_sale(&self, owner: &str, id: Uuid) -> Result<Sale, RepositoryError> {
        let doc = self.get_owned(EntityKind::Sale, owner, id).await?;
        self.open(EntityKind::Sale, id, doc)
    }

    /// Apply a partial update.
    ///
    /// Only the protected fields present in `update` are encrypted; every
    /// other stored blob is kept byte-for-byte.
    pub async fn update_sale(
        &self,
        owner: &str,
        id: Uuid,
        update: SaleUpdate,
    ) -> Result<Sale, RepositoryError> {
        let mut patch = serde_json::to_value(&update).map_err(MappingError::from)?;
        seal_document(&mut patch, EntityKind::Sale.protected_fields(), &self.codec)?;
        let updated_at = serde_json::to_value(Utc::now()).map_err(MappingError::from)?;

        let doc = self
            .store
            .modify(EntityKind::Sale.collection(), id, |doc| {
                if !is_owned_by(doc, owner) {
                    return false;
                }
                let (Value::Object(target), Value::Object(changes)) = (doc, patch) else {
                    return false;
                };
                target.extend(changes);
                target.insert(UPDATED_AT_FIELD.to_owned(), updated_at);
                true
            })
            .await
            .ok_or(RepositoryError::NotFound(EntityKind::Sale))?;

        debug!(sale_id = %id, "sale updated");
        self.open(EntityKind::Sale, id, doc)
    }

    pub async fn delete_sale(&self, owner: &str, id: Uuid) -> Result<(), RepositoryError> {
        self.delete_owned(EntityKind::Sale, owner, id).await
    }

    /// Number of sales owned by `owner`. Nothing is decrypted.
    pub async fn count_sales(&self, owner: &str) -> usize {
        self.store
            .count(EntityKind::Sale.collection(), |doc| is_owned_by(doc, owner))
            .await
    }

    /// Move every sale of `owner` that has no organisation into `organization_id`.
    ///
    /// Protected fields are not touched; their blobs stay exactly as stored.
    pub async fn assign_organization(&self, owner: &str, organization_id: &str) -> usize {
        let migrated = self
            .store
            .modify_all(EntityKind::Sale.collection(), |doc| {
                if !is_owned_by(doc, owner) || !lacks_organization(doc) {
                    return false;
                }
                match doc {
                    Value::Object(map) => {
                        map.insert(
                            ORGANIZATION_FIELD.to_owned(),
                            Value::String(organization_id.to_owned()),
                        );
                        true
                    }
                    _ => false,
                }
            })
            .await;
        debug!(migrated, "sales assigned to organization");
        migrated
    }

    // -----------------------------------------------------------------------
    // Salespeople
    // -----------------------------------------------------------------------

    /// Store a new salesperson for `owner`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::DuplicateName`] if `owner` already has a salesperson
    /// with exactly this name. Names are stored under random IVs, so each of
    /// the owner's existing names is decrypted and compared while the store's
    /// write lock is held.
    pub async fn create_sales_person(
        &self,
        owner: &str,
        new: NewSalesPerson,
    ) -> Result<SalesPerson, RepositoryError> {
        let person = SalesPerson {
            id: Uuid::new_v4(),
            clerk_user_id: owner.to_owned(),
            name: new.name,
        };
        let doc = seal_record(&person, EntityKind::SalesPerson.protected_fields(), &self.codec)?;
        self.store
            .insert_checked(EntityKind::SalesPerson.collection(), person.id, doc, |existing| {
                self.ensure_unique_name(existing, owner, &person.name)
            })
            .await?;
        debug!(sales_person_id = %person.id, "sales person created");
        Ok(person)
    }

    /// All of `owner`'s salespeople, newest first.
    pub async fn list_sales_persons(&self, owner: &str) -> Result<Vec<SalesPerson>, RepositoryError> {
        self.list_owned(EntityKind::SalesPerson, owner).await
    }

    pub async fn delete_sales_person(&self, owner: &str, id: Uuid) -> Result<(), RepositoryError> {
        self.delete_owned(EntityKind::SalesPerson, owner, id).await
    }
}
