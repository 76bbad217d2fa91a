use crate::{
    error::{AppError, StoreError},
    flyers::StagedFlyer,
    models::{Event, Guest, NewEvent, NewGuest, RsvpChoice, RsvpStatus},
    query::{EventFilter, SortField, SortOrder},
    state::AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

/// Body of every create-event reply. A duplicate title is reported here
/// with `has_error` set rather than through the status code.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    message: Option<String>,
    has_error: bool,
    error_message: Option<String>,
    data: Option<Event>,
}

#[derive(Default)]
struct EventForm {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    location: Option<String>,
    flyer: Option<StagedFlyer>,
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Unprocessable(format!("field `{name}` is required")))
}

/// Like `required`, but an empty value is accepted.
fn present(value: Option<String>, name: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Unprocessable(format!("field `{name}` is required")))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

async fn read_event_form(
    app_state: &AppState,
    multipart: &mut Multipart,
    form: &mut EventForm,
) -> Result<(), AppError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "flyer" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    continue;
                }
                let staged = app_state.flyers.stage(&filename, &mut field).await?;
                if let Some(previous) = form.flyer.replace(staged) {
                    app_state.flyers.discard(previous).await;
                }
            }
            "title" | "description" | "date" | "location" => {
                let value = field.text().await.map_err(multipart_error)?;
                match name.as_str() {
                    "title" => form.title = Some(value),
                    "description" => form.description = Some(value),
                    "date" => form.date = Some(value),
                    _ => form.location = Some(value),
                }
            }
            other => debug!("ignoring unknown form field {:?}", other),
        }
    }
    Ok(())
}

fn validate_event_form(form: &mut EventForm) -> Result<NewEvent, AppError> {
    let date = required(form.date.take(), "date")?;
    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Unprocessable(format!("date {date:?} is not YYYY-MM-DD")))?;

    Ok(NewEvent {
        title: required(form.title.take(), "title")?,
        description: present(form.description.take(), "description")?,
        date,
        location: required(form.location.take(), "location")?,
        flyer_filename: form.flyer.as_ref().map(|f| f.name.clone()),
    })
}

/// The flyer is staged while the form is read and only committed once the
/// event exists; every other outcome discards it.
pub async fn create_event_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EventResponse>, AppError> {
    let mut form = EventForm::default();
    let created = match read_event_form(&app_state, &mut multipart, &mut form).await {
        Ok(()) => match validate_event_form(&mut form) {
            Ok(new_event) => app_state.events.create_event(new_event).await.map_err(AppError::from),
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    let event = match created {
        Ok(event) => event,
        Err(err) => {
            if let Some(staged) = form.flyer.take() {
                app_state.flyers.discard(staged).await;
            }
            return match err {
                AppError::Store(conflict @ StoreError::Conflict(_)) => {
                    warn!("event not created: {}", conflict);
                    Ok(Json(EventResponse {
                        message: None,
                        has_error: true,
                        error_message: Some(conflict.to_string()),
                        data: None,
                    }))
                }
                other => Err(other),
            };
        }
    };

    if let Some(staged) = form.flyer.take() {
        app_state.flyers.commit(staged).await?;
    }
    Ok(Json(EventResponse {
        message: Some("Event created successfully".to_string()),
        has_error: false,
        error_message: None,
        data: Some(event),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    date: Option<String>,
    location: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
}

pub async fn get_events(
    State(app_state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Json<Vec<Event>> {
    let filter = EventFilter {
        date: query.date,
        location: query.location,
        search: query.search,
    };
    let sort_by = SortField::parse(query.sort_by.as_deref().unwrap_or("date"));
    let order = query.order.as_deref().map(SortOrder::parse).unwrap_or_default();
    Json(app_state.events.list_events(&filter, sort_by, order).await)
}

pub async fn get_event(
    State(app_state): State<AppState>,
    Path(event_id): Path<u64>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(app_state.events.get_event(event_id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGuestPayload {
    #[validate(length(min = 1))]
    name: String,
    #[validate(email)]
    email: String,
    event_id: u64,
    user_id: Option<String>,
}

pub async fn create_guest_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateGuestPayload>,
) -> Result<(StatusCode, Json<Guest>), AppError> {
    payload.validate()?;
    if app_state.require_existing_event {
        app_state.events.get_event(payload.event_id).await?;
    }

    let guest = app_state
        .guests
        .create_guest(NewGuest {
            name: payload.name,
            email: payload.email,
            event_id: payload.event_id,
            user_id: payload.user_id,
        })
        .await;
    app_state.events.attach_guest(guest.event_id, guest.id).await;
    Ok((StatusCode::CREATED, Json(guest)))
}

pub async fn get_guest(
    State(app_state): State<AppState>,
    Path(guest_id): Path<u64>,
) -> Result<Json<Guest>, AppError> {
    Ok(Json(app_state.guests.get_guest(guest_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RsvpQuery {
    rsvp_status: RsvpChoice,
}

#[derive(Debug, Serialize)]
pub struct RsvpResponse {
    guest_id: u64,
    rsvp_status: RsvpStatus,
    message: String,
}

pub async fn update_rsvp(
    State(app_state): State<AppState>,
    Path(guest_id): Path<u64>,
    Query(query): Query<RsvpQuery>,
) -> Result<Json<RsvpResponse>, AppError> {
    let guest = app_state
        .guests
        .update_rsvp_status(guest_id, query.rsvp_status)
        .await?;
    Ok(Json(RsvpResponse {
        guest_id: guest.id,
        rsvp_status: guest.rsvp_status,
        message: "RSVP status updated successfully".to_string(),
    }))
}

pub async fn get_event_guests(
    State(app_state): State<AppState>,
    Path(event_id): Path<u64>,
) -> Json<Vec<Guest>> {
    Json(app_state.guests.list_guests_by_event(event_id).await)
}

pub async fn health() -> &'static str {
    "ok"
}
