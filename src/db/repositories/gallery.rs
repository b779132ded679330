use crate::db::timestamp;
use crate::entities::{gallery_images, prelude::*};
use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

pub use crate::entities::gallery_images::Model as GalleryImage;

pub struct GalleryRepository {
    conn: DatabaseConnection,
}

impl GalleryRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, url: &str, content_type: Option<&str>) -> Result<GalleryImage> {
        let active = gallery_images::ActiveModel {
            url: Set(url.to_string()),
            content_type: Set(content_type.map(ToString::to_string)),
            created_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to record gallery image")
    }

    pub async fn list(&self) -> Result<Vec<GalleryImage>> {
        GalleryImages::find()
            .order_by_desc(gallery_images::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list gallery images")
    }
}
