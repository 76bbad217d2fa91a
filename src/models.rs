use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub flyer_filename: Option<String>,
    pub rsvps: Vec<u64>,
}

/// Fields supplied by the caller when creating an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub flyer_filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Pending,
    Attending,
    NotAttending,
}

/// The statuses a guest may move to. `Pending` is only ever the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpChoice {
    Attending,
    NotAttending,
}

impl From<RsvpChoice> for RsvpStatus {
    fn from(choice: RsvpChoice) -> Self {
        match choice {
            RsvpChoice::Attending => RsvpStatus::Attending,
            RsvpChoice::NotAttending => RsvpStatus::NotAttending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guest {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub rsvp_status: RsvpStatus,
    pub event_id: u64,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGuest {
    pub name: String,
    pub email: String,
    pub event_id: u64,
    pub user_id: Option<String>,
}
