use crate::db::timestamp;
use crate::entities::{events, prelude::*};
use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

pub use crate::entities::events::Model as Event;

#[derive(Debug, Clone)]
pub struct EventInput {
    pub event_name: String,
    pub description: String,
    pub event_time: String,
    pub event_speaker: String,
    pub event_location: String,
    pub image_url: String,
}

/// Partial update; `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub event_name: Option<String>,
    pub description: Option<String>,
    pub event_time: Option<String>,
    pub event_speaker: Option<String>,
    pub event_location: Option<String>,
    pub image_url: Option<String>,
}

pub struct EventRepository {
    conn: DatabaseConnection,
}

impl EventRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, input: EventInput) -> Result<Event> {
        let active = events::ActiveModel {
            event_name: Set(input.event_name),
            description: Set(input.description),
            event_time: Set(input.event_time),
            event_speaker: Set(input.event_speaker),
            event_location: Set(input.event_location),
            image_url: Set(input.image_url),
            created_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert event")
    }

    pub async fn get(&self, id: i32) -> Result<Option<Event>> {
        Events::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query event")
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Event>> {
        Events::find()
            .order_by_desc(events::Column::CreatedAt)
            .order_by_desc(events::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list events")
    }

    pub async fn update(&self, id: i32, patch: EventPatch) -> Result<Option<Event>> {
        let Some(existing) = Events::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: events::ActiveModel = existing.into();
        if let Some(v) = patch.event_name {
            active.event_name = Set(v);
        }
        if let Some(v) = patch.description {
            active.description = Set(v);
        }
        if let Some(v) = patch.event_time {
            active.event_time = Set(v);
        }
        if let Some(v) = patch.event_speaker {
            active.event_speaker = Set(v);
        }
        if let Some(v) = patch.event_location {
            active.event_location = Set(v);
        }
        if let Some(v) = patch.image_url {
            active.image_url = Set(v);
        }

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update event")?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Events::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete event")?;

        Ok(result.rows_affected > 0)
    }
}
