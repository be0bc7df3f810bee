use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::events::CartEvent;
use crate::domain::party::{generate_join_code, keys, Party, PartyRecord};
use crate::domain::ports::{CatalogRepository, EphemeralStore, Notifier};

const JOIN_CODE_ATTEMPTS: usize = 8;

/// Shared carts for diners at one table, kept entirely in the ephemeral store.
///
/// Party records and the `table -> party` / `code -> party` indices never expire; only the
/// shared cart list does. Membership and cart edits are read-modify-write without any
/// version check, so concurrent edits are last-writer-wins.
pub struct PartyService {
    store: Arc<dyn EphemeralStore>,
    catalog: Arc<dyn CatalogRepository>,
    notifier: Arc<dyn Notifier>,
    cart_ttl: Duration,
}

impl PartyService {
    pub fn new(
        store: Arc<dyn EphemeralStore>,
        catalog: Arc<dyn CatalogRepository>,
        notifier: Arc<dyn Notifier>,
        cart_ttl: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            notifier,
            cart_ttl,
        }
    }

    pub fn create_party(&self, owner_id: Uuid, table_id: i32) -> Result<Party, DomainError> {
        let party_id = Uuid::new_v4();
        self.claim_table(table_id, party_id)?;

        let created = self
            .claim_code(party_id)
            .and_then(|code| {
                let record = PartyRecord::new(party_id, code, table_id, owner_id);
                self.store
                    .set(&keys::party(party_id), record.encode()?, None)?;
                Ok(record)
            });
        let record = match created {
            Ok(record) => record,
            Err(e) => {
                self.store.delete(&keys::party_by_table(table_id))?;
                return Err(e);
            }
        };

        log::info!(
            "Party {} ({}) opened at table {table_id} by {owner_id}",
            record.party_id,
            record.code
        );
        Ok(Party::from_record(record, Vec::new()))
    }

    pub fn join_party(&self, code: &str, user_id: Uuid) -> Result<String, DomainError> {
        let party_id = self
            .store
            .get(&keys::party_by_code(code))?
            .and_then(|id| Uuid::parse_str(&id).ok())
            .ok_or(DomainError::PartyNotFound)?;
        let mut record = self.load(party_id)?.ok_or(DomainError::PartyNotFound)?;

        record.add_member(user_id)?;
        self.save(&record)?;

        log::info!("User {user_id} joined party {party_id}");
        Ok(record.code)
    }

    /// Leaving is idempotent: `false` means there was nothing to leave (unknown party or
    /// not a member), which callers must not treat as a failure of the service.
    pub fn leave_party(&self, party_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let Some(mut record) = self.load(party_id)? else {
            log::debug!("Party {party_id} does not exist, nothing to leave");
            return Ok(false);
        };
        if !record.remove_member(user_id) {
            return Ok(false);
        }

        if record.is_empty() {
            self.dissolve(&record)?;
            log::info!("Party {party_id} dissolved after its last member left");
        } else {
            self.save(&record)?;
            log::info!("User {user_id} left party {party_id}");
        }
        Ok(true)
    }

    pub fn get_party(&self, party_id: Uuid) -> Result<Option<Party>, DomainError> {
        let Some(record) = self.load(party_id)? else {
            return Ok(None);
        };
        let cart = self.cart_ids(party_id)?;
        Ok(Some(Party::from_record(record, cart)))
    }

    pub fn add_product_to_party_cart(
        &self,
        party_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), DomainError> {
        self.require_party(party_id)?;
        let key = keys::party_cart(party_id);
        self.store.list_push(&key, product_id.to_string())?;
        self.store.expire(&key, self.cart_ttl)?;
        self.notifier.publish(CartEvent::PartyCartUpdated { party_id });
        Ok(())
    }

    /// Removes one occurrence. The TTL is refreshed only while the cart still holds items.
    pub fn remove_product_from_party_cart(
        &self,
        party_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), DomainError> {
        self.require_party(party_id)?;
        let key = keys::party_cart(party_id);
        if !self.store.exists(&key)? {
            return Err(DomainError::PartyCartNotFound(party_id));
        }

        self.store.list_remove(&key, &product_id.to_string(), 1)?;
        if self.store.list_len(&key)? > 0 {
            self.store.expire(&key, self.cart_ttl)?;
        }
        self.notifier.publish(CartEvent::PartyCartUpdated { party_id });
        Ok(())
    }

    /// Products currently in the shared cart. Ids that no longer resolve in the catalog are
    /// skipped.
    pub fn get_party_cart(&self, party_id: Uuid) -> Result<Vec<Product>, DomainError> {
        let ids = self.cart_ids(party_id)?;
        resolve_in_order(self.catalog.as_ref(), &ids)
    }

    pub fn clear_party_cart(&self, party_id: Uuid) -> Result<(), DomainError> {
        self.store.delete(&keys::party_cart(party_id))?;
        self.notifier.publish(CartEvent::PartyCartUpdated { party_id });
        Ok(())
    }

    fn claim_table(&self, table_id: i32, party_id: Uuid) -> Result<(), DomainError> {
        let key = keys::party_by_table(table_id);
        if self
            .store
            .set_if_absent(&key, party_id.to_string(), None)?
        {
            return Ok(());
        }

        // The index may point at a party whose record is gone; reclaim it then.
        let holder = self
            .store
            .get(&key)?
            .and_then(|id| Uuid::parse_str(&id).ok());
        let live = match holder {
            Some(id) => self.store.exists(&keys::party(id))?,
            None => false,
        };
        if live {
            log::warn!("Table {table_id} already hosts party {holder:?}");
            return Err(DomainError::TableAlreadyHasParty(table_id));
        }
        log::debug!("Reclaiming stale party index of table {table_id}");
        self.store.set(&key, party_id.to_string(), None)
    }

    fn claim_code(&self, party_id: Uuid) -> Result<String, DomainError> {
        let mut rng = rand::thread_rng();
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = generate_join_code(&mut rng);
            if self
                .store
                .set_if_absent(&keys::party_by_code(&code), party_id.to_string(), None)?
            {
                return Ok(code);
            }
        }
        Err(DomainError::Internal(
            "could not allocate a unique party code".to_string(),
        ))
    }

    fn load(&self, party_id: Uuid) -> Result<Option<PartyRecord>, DomainError> {
        self.store
            .get(&keys::party(party_id))?
            .map(|json| PartyRecord::decode(&json))
            .transpose()
    }

    fn save(&self, record: &PartyRecord) -> Result<(), DomainError> {
        self.store
            .set(&keys::party(record.party_id), record.encode()?, None)
    }

    fn require_party(&self, party_id: Uuid) -> Result<(), DomainError> {
        if self.store.exists(&keys::party(party_id))? {
            Ok(())
        } else {
            Err(DomainError::PartyNotFound)
        }
    }

    fn dissolve(&self, record: &PartyRecord) -> Result<(), DomainError> {
        self.store.delete(&keys::party(record.party_id))?;
        self.store.delete(&keys::party_by_code(&record.code))?;
        self.store.delete(&keys::party_cart(record.party_id))?;

        // Leave the table index alone if another party already took it over.
        let table_key = keys::party_by_table(record.table_id);
        if self.store.get(&table_key)?.as_deref() == Some(record.party_id.to_string().as_str()) {
            self.store.delete(&table_key)?;
        }
        Ok(())
    }

    fn cart_ids(&self, party_id: Uuid) -> Result<Vec<Uuid>, DomainError> {
        Ok(parse_ids(self.store.list_range(&keys::party_cart(party_id))?))
    }
}

pub(crate) fn parse_ids(raw: Vec<String>) -> Vec<Uuid> {
    raw.into_iter()
        .filter_map(|id| match Uuid::parse_str(&id) {
            Ok(id) => Some(id),
            Err(_) => {
                log::debug!("Skipping malformed cart entry '{id}'");
                None
            }
        })
        .collect()
}

/// Resolves cart entries against the catalog, keeping cart order and duplicates and
/// dropping entries whose product has disappeared.
pub(crate) fn resolve_in_order(
    catalog: &dyn CatalogRepository,
    ids: &[Uuid],
) -> Result<Vec<Product>, DomainError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let products: HashMap<Uuid, Product> = catalog
        .find_by_ids(ids)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    Ok(ids
        .iter()
        .filter_map(|id| {
            let product = products.get(id).cloned();
            if product.is_none() {
                log::debug!("Cart entry {id} no longer resolves, skipping");
            }
            product
        })
        .collect())
}
