// ── Object detail loader ──
//
// The detail row is mandatory; everything hanging off it (zones,
// contacts, recent events, transport test data) is best-effort and
// degrades to empty on failure.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use firedesk_store::{LegacyStore, StoreError};

use crate::convert::external_data;
use crate::error::CoreError;
use crate::model::{Contact, Event, ExternalData, Object, ObjectId, Zone};

/// Everything the detail pane shows for one object.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectDetails {
    pub object: Arc<Object>,
    pub zones: Vec<Zone>,
    /// Sorted by priority.
    pub contacts: Vec<Contact>,
    /// Newest first.
    pub events: Vec<Arc<Event>>,
    pub external: ExternalData,
}

fn or_empty<T: Default>(result: Result<T, StoreError>, what: &'static str, id: ObjectId) -> T {
    result.unwrap_or_else(|e| {
        warn!(error = %e, object = %id, what, "detail section unavailable");
        T::default()
    })
}

/// Load the detail view of `id`.
///
/// Returns `Ok(None)` when the object no longer exists, so a stale
/// selection simply produces no update.
pub async fn load_details(store: &dyn LegacyStore, id: ObjectId) -> Result<Option<ObjectDetails>, CoreError> {
    let number = id.get();
    let row = match store.object_detail(number).await {
        Ok(row) => row,
        Err(e) if e.is_not_found() => {
            debug!(object = %id, "object vanished before detail load");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let (zones, contacts, events, messages, control) = tokio::join!(
        store.object_zones(number),
        store.object_contacts(number),
        store.object_events(number),
        store.test_messages(number),
        store.test_control(number),
    );

    let zones: Vec<Zone> = or_empty(zones, "zones", id).into_iter().map(Zone::from).collect();
    let mut contacts: Vec<Contact> = or_empty(contacts, "contacts", id)
        .into_iter()
        .map(Contact::from)
        .collect();
    contacts.sort_by_key(|c| c.priority);
    let events: Vec<Arc<Event>> = or_empty(events, "events", id)
        .into_iter()
        .map(|r| Arc::new(Event::from(r)))
        .collect();
    let external = external_data(
        or_empty(messages, "test messages", id),
        or_empty(control, "test control", id),
    );

    Ok(Some(ObjectDetails {
        object: Arc::new(Object::from(row)),
        zones,
        contacts,
        events,
        external,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use firedesk_store::DemoStore;

    #[tokio::test]
    async fn demo_object_loads_with_sections() {
        let store = DemoStore::frozen();
        let details = load_details(&store, ObjectId(1003)).await.unwrap().unwrap();
        assert_eq!(details.object.id, ObjectId(1003));
        assert!(details.object.detail.is_some());
        assert!(!details.events.is_empty());
        assert!(details.events.windows(2).all(|w| w[0].id >= w[1].id));
    }

    #[tokio::test]
    async fn missing_object_is_not_an_error() {
        let store = DemoStore::frozen();
        assert!(load_details(&store, ObjectId(424_242)).await.unwrap().is_none());
    }
}
