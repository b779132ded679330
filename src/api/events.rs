use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_body, validate_event_time, validate_id, validate_required};
use super::{ApiError, ApiResponse, AppState, EventDto, EventEnvelope, EventsDto};
use crate::db::{EventInput, EventPatch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_time: String,
    #[serde(default)]
    pub event_speaker: String,
    #[serde(default)]
    pub event_location: String,
    /// Base64 image, optionally as a `data:` URL.
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub event_name: Option<String>,
    pub description: Option<String>,
    pub event_time: Option<String>,
    pub event_speaker: Option<String>,
    pub event_location: Option<String>,
    /// Replaces the stored image when present.
    pub image: Option<String>,
}

/// GET /events
/// All events, newest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EventsDto>>, ApiError> {
    let events = state.store().list_events().await?;
    if events.is_empty() {
        return Err(ApiError::NotFound("No events found".to_string()));
    }

    Ok(Json(ApiResponse::success(EventsDto {
        events: events.into_iter().map(EventDto::from).collect(),
    })))
}

/// GET /events/{id}
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<EventEnvelope>>, ApiError> {
    let id = validate_id(id, "event")?;
    let event = state
        .store()
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event", id))?;

    Ok(Json(ApiResponse::success(EventEnvelope {
        event: event.into(),
    })))
}

/// POST /events
/// Uploads the image first, then stores the event with its hosted URL
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<EventEnvelope>>), ApiError> {
    let payload = parse_body(payload)?;

    let event_name = validate_required("eventName", &payload.event_name)?.to_string();
    let description = validate_required("description", &payload.description)?.to_string();
    let event_time = validate_event_time(&payload.event_time)?;
    let event_speaker = validate_required("eventSpeaker", &payload.event_speaker)?.to_string();
    let event_location = validate_required("eventLocation", &payload.event_location)?.to_string();
    let image = validate_required("image", &payload.image)?;

    let image_url = state.image_host().upload(image).await?;

    let event = state
        .store()
        .add_event(EventInput {
            event_name,
            description,
            event_time,
            event_speaker,
            event_location,
            image_url,
        })
        .await?;

    tracing::info!(event_id = event.id, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Event created",
            EventEnvelope {
                event: event.into(),
            },
        )),
    ))
}

/// PUT /events/{id}
/// Partial update; omitted fields keep their stored values
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EventEnvelope>>, ApiError> {
    let payload = parse_body(payload)?;

    let id = validate_id(id, "event")?;

    if state.store().get_event(id).await?.is_none() {
        return Err(ApiError::not_found("Event", id));
    }

    let event_time = payload
        .event_time
        .as_deref()
        .map(validate_event_time)
        .transpose()?;

    let image_url = match payload.image.as_deref().map(str::trim) {
        Some(image) if !image.is_empty() => Some(state.image_host().upload(image).await?),
        _ => None,
    };

    let patch = EventPatch {
        event_name: non_empty(payload.event_name),
        description: non_empty(payload.description),
        event_time,
        event_speaker: non_empty(payload.event_speaker),
        event_location: non_empty(payload.event_location),
        image_url,
    };

    let event = state
        .store()
        .update_event(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Event", id))?;

    Ok(Json(ApiResponse::with_message(
        "Event updated",
        EventEnvelope {
            event: event.into(),
        },
    )))
}

/// DELETE /events/{id}
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_id(id, "event")?;
    if !state.store().delete_event(id).await? {
        return Err(ApiError::not_found("Event", id));
    }
    Ok(Json(ApiResponse::ack("Event deleted")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
