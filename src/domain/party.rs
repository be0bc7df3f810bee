//! Party records live only in the ephemeral store. They are typed here so that a change to
//! the stored layout is a compile-time change, and they carry an explicit schema number so a
//! record written by an incompatible build is refused instead of half-parsed.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

pub const PARTY_RECORD_SCHEMA: u32 = 1;

pub const JOIN_CODE_LEN: usize = 6;

/// No 0/O or 1/I, so codes survive being read aloud across a table.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRecord {
    pub schema: u32,
    pub party_id: Uuid,
    pub code: String,
    pub table_id: i32,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl PartyRecord {
    pub fn new(party_id: Uuid, code: String, table_id: i32, owner_id: Uuid) -> Self {
        Self {
            schema: PARTY_RECORD_SCHEMA,
            party_id,
            code,
            table_id,
            owner_id,
            member_ids: vec![owner_id],
        }
    }

    pub fn decode(json: &str) -> Result<Self, DomainError> {
        let record: PartyRecord = serde_json::from_str(json)?;
        if record.schema != PARTY_RECORD_SCHEMA {
            return Err(DomainError::Internal(format!(
                "party record schema {} is not supported",
                record.schema
            )));
        }
        Ok(record)
    }

    pub fn encode(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    pub fn add_member(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        if self.is_member(user_id) {
            return Err(DomainError::AlreadyMember(user_id));
        }
        self.member_ids.push(user_id);
        Ok(())
    }

    /// Returns false when the user was not a member. The earliest remaining member
    /// inherits ownership when the owner leaves.
    pub fn remove_member(&mut self, user_id: Uuid) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|m| *m != user_id);
        if self.member_ids.len() == before {
            return false;
        }
        if self.owner_id == user_id {
            if let Some(next) = self.member_ids.first() {
                self.owner_id = *next;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}

/// A party as returned to callers, with the shared cart merged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub party_id: Uuid,
    pub code: String,
    pub table_id: i32,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub cart: Vec<Uuid>,
}

impl Party {
    pub fn from_record(record: PartyRecord, cart: Vec<Uuid>) -> Self {
        Self {
            party_id: record.party_id,
            code: record.code,
            table_id: record.table_id,
            owner_id: record.owner_id,
            member_ids: record.member_ids,
            cart,
        }
    }
}

pub fn generate_join_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..JOIN_CODE_LEN)
        .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Key layout in the ephemeral store.
pub mod keys {
    use uuid::Uuid;

    pub fn party(party_id: Uuid) -> String {
        format!("party:{party_id}")
    }

    pub fn party_by_table(table_id: i32) -> String {
        format!("party_table:{table_id}")
    }

    pub fn party_by_code(code: &str) -> String {
        format!("party_code:{}", code.to_ascii_uppercase())
    }

    pub fn party_cart(party_id: Uuid) -> String {
        format!("party_cart:{party_id}")
    }

    pub fn user_cart(user_id: Uuid) -> String {
        format!("cart:{user_id}")
    }

    pub fn user_cart_expiration(user_id: Uuid) -> String {
        format!("cart:{user_id}:expiration")
    }
}
