use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::{self, Bytes};
use actix_web::HttpResponse;
use futures::stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::domain::events::CartEvent;
use crate::state::AppState;

/// Narrows the stream to one user's cart and/or one party's cart. Without either, every
/// event is delivered.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub user_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
}

impl EventFilter {
    fn admits(&self, event: &CartEvent) -> bool {
        if self.user_id.is_none() && self.party_id.is_none() {
            return true;
        }
        match event {
            CartEvent::CartUpdated { user_id } => self.user_id == Some(*user_id),
            CartEvent::PartyCartUpdated { party_id } => self.party_id == Some(*party_id),
        }
    }
}

fn frame(event: &CartEvent) -> Result<Bytes, serde_json::Error> {
    let payload = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {payload}\n\n")))
}

/// GET /events
///
/// Server-sent stream of cart notifications, optionally scoped with `?user_id=` and
/// `?party_id=`. Subscribers that fall behind skip the events they missed.
#[utoipa::path(
    get,
    path = "/events",
    params(
        ("user_id" = Option<Uuid>, Query, description = "Only this user's cart events"),
        ("party_id" = Option<Uuid>, Query, description = "Only this party's cart events"),
    ),
    responses((status = 200, description = "text/event-stream of cart events")),
    tag = "events"
)]
pub async fn stream_events(
    state: web::Data<AppState>,
    filter: web::Query<EventFilter>,
) -> HttpResponse {
    let rx = state.notifier.subscribe();
    let filter = filter.into_inner();

    let events = stream::unfold((rx, filter), |(mut rx, filter)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if !filter.admits(&event) => continue,
                Ok(event) => match frame(&event) {
                    Ok(bytes) => {
                        return Some((Ok::<_, actix_web::Error>(bytes), (rx, filter)))
                    }
                    Err(e) => log::error!("Failed to encode {event:?}: {e}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Event subscriber lagged, {skipped} events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(events)
}
