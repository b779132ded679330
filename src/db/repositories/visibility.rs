use crate::db::timestamp;
use crate::entities::{prelude::*, year_visibility};
use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

pub use crate::entities::year_visibility::Model as YearVisibilityRow;

pub struct VisibilityRepository {
    conn: DatabaseConnection,
}

impl VisibilityRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, year_range: &str) -> Result<Option<YearVisibilityRow>> {
        let row = YearVisibility::find()
            .filter(year_visibility::Column::YearRange.eq(year_range))
            .one(&self.conn)
            .await
            .context("Failed to query year visibility")?;

        Ok(row)
    }

    /// Upserts the hidden flag, leaving `show_toggle_delete` untouched on existing rows.
    pub async fn set_hidden(&self, year_range: &str, hidden: bool) -> Result<()> {
        let active = year_visibility::ActiveModel {
            year_range: Set(year_range.to_string()),
            hidden: Set(hidden),
            show_toggle_delete: Set(true),
            updated_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        YearVisibility::insert(active)
            .on_conflict(
                OnConflict::column(year_visibility::Column::YearRange)
                    .update_columns([
                        year_visibility::Column::Hidden,
                        year_visibility::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to upsert year visibility")?;

        Ok(())
    }

    /// Hides the year and retires its delete toggle.
    pub async fn hide_toggle_delete(&self, year_range: &str) -> Result<()> {
        let active = year_visibility::ActiveModel {
            year_range: Set(year_range.to_string()),
            hidden: Set(true),
            show_toggle_delete: Set(false),
            updated_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        YearVisibility::insert(active)
            .on_conflict(
                OnConflict::column(year_visibility::Column::YearRange)
                    .update_columns([
                        year_visibility::Column::Hidden,
                        year_visibility::Column::ShowToggleDelete,
                        year_visibility::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to hide delete toggle")?;

        Ok(())
    }

    pub async fn list_hidden(&self) -> Result<Vec<YearVisibilityRow>> {
        let rows = YearVisibility::find()
            .filter(year_visibility::Column::Hidden.eq(true))
            .order_by_asc(year_visibility::Column::YearRange)
            .all(&self.conn)
            .await
            .context("Failed to list hidden years")?;

        Ok(rows)
    }
}
