use crate::entities::{prelude::*, role_ranks};
use anyhow::Result;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::collections::HashMap;

pub use crate::entities::role_ranks::Model as RoleRank;

pub struct RoleRankRepository {
    conn: DatabaseConnection,
}

impl RoleRankRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a role. A duplicate name surfaces as a unique-constraint `DbErr`.
    pub async fn add(&self, role_name: &str, rank: i32) -> Result<RoleRank> {
        let active = role_ranks::ActiveModel {
            role_name: Set(role_name.to_string()),
            rank: Set(rank),
            ..Default::default()
        };

        Ok(active.insert(&self.conn).await?)
    }

    pub async fn list(&self) -> Result<Vec<RoleRank>> {
        let rows = RoleRanks::find()
            .order_by_asc(role_ranks::Column::Rank)
            .order_by_asc(role_ranks::Column::RoleName)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    /// Role name to rank, for ordering roster members.
    pub async fn rank_map(&self) -> Result<HashMap<String, i32>> {
        let rows = RoleRanks::find().all(&self.conn).await?;
        Ok(rows.into_iter().map(|r| (r.role_name, r.rank)).collect())
    }
}
