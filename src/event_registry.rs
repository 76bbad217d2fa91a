use crate::error::StoreError;
use crate::models::{Event, NewEvent};
use crate::query::{eq_ignore_case, sort_events, EventFilter, SortField, SortOrder};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory events, keyed by id. Ids are handed out in insertion order,
/// so iterating the map yields storage order.
#[derive(Default)]
pub struct EventRegistry {
    events: RwLock<BTreeMap<u64, Event>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        // The write lock covers both the title check and the insert.
        let mut events = self.events.write().await;
        if events.values().any(|e| eq_ignore_case(&e.title, &new_event.title)) {
            debug!("rejecting duplicate event title {:?}", new_event.title);
            return Err(StoreError::Conflict(new_event.title));
        }

        let id = events.len() as u64 + 1;
        let event = Event {
            id,
            title: new_event.title,
            description: new_event.description,
            date: new_event.date,
            location: new_event.location,
            flyer_filename: new_event.flyer_filename,
            rsvps: Vec::new(),
        };
        events.insert(id, event.clone());
        info!("created event {} ({:?})", id, event.title);
        Ok(event)
    }

    pub async fn get_event(&self, event_id: u64) -> Result<Event, StoreError> {
        self.events
            .read()
            .await
            .get(&event_id)
            .cloned()
            .ok_or(StoreError::NotFound("Event"))
    }

    pub async fn list_events(
        &self,
        filter: &EventFilter,
        sort_by: Option<SortField>,
        order: SortOrder,
    ) -> Vec<Event> {
        let mut matched: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        sort_events(&mut matched, sort_by, order);
        matched
    }

    /// Records a guest against an event's rsvp list. Unknown events are ignored,
    /// since guests may reference events that do not exist.
    pub async fn attach_guest(&self, event_id: u64, guest_id: u64) {
        let mut events = self.events.write().await;
        if let Some(current) = events.get(&event_id) {
            let mut rsvps = current.rsvps.clone();
            rsvps.push(guest_id);
            let updated = Event {
                rsvps,
                ..current.clone()
            };
            events.insert(event_id, updated);
        }
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_event(title: &str, date: &str, location: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: String::new(),
            date: date.to_string(),
            location: location.to_string(),
            flyer_filename: None,
        }
    }

    async fn seeded() -> EventRegistry {
        let registry = EventRegistry::new();
        registry.create_event(new_event("A", "2025-01-01", "Lagos")).await.unwrap();
        registry.create_event(new_event("B", "2025-02-01", "Abuja")).await.unwrap();
        registry
    }

    fn ids(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e.id).collect()
    }

    #[tokio::test]
    async fn sorts_by_date_in_both_directions() {
        let registry = seeded().await;
        let filter = EventFilter::default();

        let asc = registry.list_events(&filter, Some(SortField::Date), SortOrder::Asc).await;
        assert_eq!(ids(&asc), vec![1, 2]);

        let desc = registry.list_events(&filter, Some(SortField::Date), SortOrder::Desc).await;
        assert_eq!(ids(&desc), vec![2, 1]);
    }

    #[tokio::test]
    async fn duplicate_title_is_case_insensitive_and_leaves_registry_alone() {
        let registry = seeded().await;
        let err = registry
            .create_event(new_event("a", "2025-03-01", "Kano"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict("a".into()));
        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.get_event(1).await.unwrap().date, "2025-01-01");
    }

    #[tokio::test]
    async fn ids_keep_counting_after_a_failed_create() {
        let registry = seeded().await;
        let _ = registry.create_event(new_event("B", "2025-01-01", "x")).await;
        let c = registry.create_event(new_event("C", "2025-01-01", "x")).await.unwrap();
        assert_eq!(c.id, 3);
        assert!(c.rsvps.is_empty());
    }

    #[tokio::test]
    async fn date_filter_is_exact() {
        let registry = seeded().await;
        registry.create_event(new_event("C", "2025-01-01", "Ibadan")).await.unwrap();
        let filter = EventFilter {
            date: Some("2025-01-01".into()),
            ..Default::default()
        };
        let found = registry.list_events(&filter, Some(SortField::Date), SortOrder::Asc).await;
        assert_eq!(ids(&found), vec![1, 3]);

        let all = registry.list_events(&EventFilter::default(), None, SortOrder::Asc).await;
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn attach_guest_appends_to_rsvps() {
        let registry = seeded().await;
        registry.attach_guest(2, 7).await;
        registry.attach_guest(2, 9).await;
        registry.attach_guest(42, 1).await;
        assert_eq!(registry.get_event(2).await.unwrap().rsvps, vec![7, 9]);
        assert!(registry.get_event(1).await.unwrap().rsvps.is_empty());
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.get_event(1).await, Err(StoreError::NotFound("Event")));
    }

    #[tokio::test]
    async fn concurrent_creates_with_the_same_title_admit_one() {
        let registry = std::sync::Arc::new(EventRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.create_event(new_event("Party", "2025-01-01", "x")).await
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(registry.len().await, 1);
    }
}
