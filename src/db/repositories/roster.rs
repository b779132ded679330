use crate::db::timestamp;
use crate::entities::{prelude::*, roster_members};
use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;

pub use crate::entities::roster_members::Model as RosterMember;

/// Fields of a member row before it is stored.
#[derive(Debug, Clone)]
pub struct RosterMemberInput {
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub profile_link: String,
    pub image_url: String,
    pub year_range: String,
}

/// Repository for roster member rows
pub struct RosterRepository {
    conn: DatabaseConnection,
}

impl RosterRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, input: RosterMemberInput) -> Result<RosterMember> {
        let active = roster_members::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            role: Set(input.role),
            department: Set(input.department),
            profile_link: Set(input.profile_link),
            image_url: Set(input.image_url),
            year_range: Set(input.year_range),
            created_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert roster member")?;
        info!(id = model.id, year_range = %model.year_range, "Added roster member");
        Ok(model)
    }

    /// Every distinct `year_range` present in the roster, unordered.
    pub async fn distinct_year_ranges(&self) -> Result<Vec<String>> {
        let ranges = RosterMembers::find()
            .select_only()
            .column(roster_members::Column::YearRange)
            .distinct()
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to query distinct year ranges")?;

        Ok(ranges)
    }

    /// Members of a single year, in insertion order.
    pub async fn list_by_year(&self, year_range: &str) -> Result<Vec<RosterMember>> {
        let rows = RosterMembers::find()
            .filter(roster_members::Column::YearRange.eq(year_range))
            .order_by_asc(roster_members::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list roster members")?;

        Ok(rows)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = RosterMembers::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete roster member")?;

        Ok(result.rows_affected > 0)
    }
}
