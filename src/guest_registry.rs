use crate::error::StoreError;
use crate::models::{Guest, NewGuest, RsvpChoice, RsvpStatus};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

/// In-memory guests in registration order. The event a guest points at is
/// not checked here.
#[derive(Default)]
pub struct GuestRegistry {
    guests: RwLock<Vec<Guest>>,
}

impl GuestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_guest(&self, new_guest: NewGuest) -> Guest {
        let mut guests = self.guests.write().await;
        let guest = Guest {
            id: guests.len() as u64 + 1,
            name: new_guest.name,
            email: new_guest.email,
            rsvp_status: RsvpStatus::Pending,
            event_id: new_guest.event_id,
            user_id: new_guest.user_id,
            created_at: Utc::now(),
        };
        guests.push(guest.clone());
        info!("registered guest {} for event {}", guest.id, guest.event_id);
        guest
    }

    pub async fn get_guest(&self, guest_id: u64) -> Result<Guest, StoreError> {
        self.guests
            .read()
            .await
            .iter()
            .find(|g| g.id == guest_id)
            .cloned()
            .ok_or(StoreError::NotFound("Guest"))
    }

    /// Swaps in a copy of the guest with only `rsvp_status` changed.
    pub async fn update_rsvp_status(
        &self,
        guest_id: u64,
        choice: RsvpChoice,
    ) -> Result<Guest, StoreError> {
        let mut guests = self.guests.write().await;
        let position = guests
            .iter()
            .position(|g| g.id == guest_id)
            .ok_or(StoreError::NotFound("Guest"))?;

        let current = &guests[position];
        let updated = Guest {
            id: current.id,
            name: current.name.clone(),
            email: current.email.clone(),
            rsvp_status: choice.into(),
            event_id: current.event_id,
            user_id: current.user_id.clone(),
            created_at: current.created_at,
        };
        guests[position] = updated.clone();
        info!("guest {} rsvp is now {:?}", guest_id, updated.rsvp_status);
        Ok(updated)
    }

    pub async fn list_guests_by_event(&self, event_id: u64) -> Vec<Guest> {
        self.guests
            .read()
            .await
            .iter()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.guests.read().await.len()
    }
}
