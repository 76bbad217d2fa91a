use crate::event_registry::EventRegistry;
use crate::flyers::FlyerStore;
use crate::guest_registry::GuestRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventRegistry>,
    pub guests: Arc<GuestRegistry>,
    pub flyers: Arc<dyn FlyerStore>,
    pub require_existing_event: bool,
}

impl AppState {
    pub fn new(flyers: Arc<dyn FlyerStore>) -> Self {
        Self {
            events: Arc::new(EventRegistry::new()),
            guests: Arc::new(GuestRegistry::new()),
            flyers,
            require_existing_event: false,
        }
    }
}
