use serde::Serialize;
use uuid::Uuid;

/// Push notifications fanned out to connected clients after cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum CartEvent {
    CartUpdated { user_id: Uuid },
    PartyCartUpdated { party_id: Uuid },
}
