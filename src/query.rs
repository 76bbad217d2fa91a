use crate::models::Event;
use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct EventFilter {
    pub date: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(date) = &self.date {
            if event.date != *date {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ignore_case(&event.location, location) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !contains_ignore_case(&event.title, search)
                && !contains_ignore_case(&event.description, search)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Date,
    Location,
}

impl SortField {
    /// Returns `None` for names outside the recognized set.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(SortField::Title),
            "date" => Some(SortField::Date),
            "location" => Some(SortField::Location),
            _ => None,
        }
    }

    pub fn compare(self, a: &Event, b: &Event) -> Ordering {
        match self {
            SortField::Title => a.title.cmp(&b.title),
            // ISO dates order chronologically as plain text
            SortField::Date => a.date.cmp(&b.date),
            SortField::Location => a.location.cmp(&b.location),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Sorts in place. With no recognized field the slice keeps its order,
/// including for `Desc`.
pub fn sort_events(events: &mut [Event], field: Option<SortField>, order: SortOrder) {
    let Some(field) = field else {
        return;
    };
    events.sort_by(|a, b| field.compare(a, b));
    if order == SortOrder::Desc {
        events.reverse();
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
