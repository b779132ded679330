//! Domain service for the year-partitioned team roster.

use std::collections::HashMap;
use thiserror::Error;

use crate::db::{RoleRank, RosterMember, YearVisibilityRow};
use crate::services::image_host::ImageHostError;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    ImageHost(#[from] ImageHostError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RosterError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RosterError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Members of one year plus that year's stored flags.
#[derive(Debug, Clone)]
pub struct RosterView {
    pub year_range: String,
    pub hidden: bool,
    pub show_toggle_delete: bool,
    pub members: Vec<RankedMember>,
}

#[derive(Debug, Clone)]
pub struct RankedMember {
    pub member: RosterMember,
    pub rank: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub profile_link: String,
    pub year_range: String,
    /// Base64 image payload, uploaded before the row is stored.
    pub image: String,
}

/// Orders members by role rank, unranked roles last.
///
/// The sort is stable, so members sharing a rank keep the order they arrived in.
#[must_use]
pub fn order_by_rank(
    members: Vec<RosterMember>,
    ranks: &HashMap<String, i32>,
) -> Vec<RankedMember> {
    let mut ranked: Vec<RankedMember> = members
        .into_iter()
        .map(|member| RankedMember {
            rank: ranks.get(&member.role).copied(),
            member,
        })
        .collect();

    ranked.sort_by_key(|m| (m.rank.is_none(), m.rank.unwrap_or(0)));
    ranked
}

/// First range of an already sorted list.
#[must_use]
pub fn select_default_range(ranges: &[String]) -> Option<String> {
    ranges.first().cloned()
}

#[async_trait::async_trait]
pub trait RosterService: Send + Sync {
    /// Distinct year ranges, newest first.
    async fn list_year_ranges(&self) -> Result<Vec<String>, RosterError>;

    /// Rank-ordered members of `year_range` with its visibility flags.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::ValidationFailed`] for a malformed year range.
    async fn list_members(&self, year_range: &str) -> Result<RosterView, RosterError>;

    async fn set_year_hidden(&self, year_range: &str, hidden: bool) -> Result<(), RosterError>;

    async fn hide_toggle_delete(&self, year_range: &str) -> Result<(), RosterError>;

    async fn hidden_years(&self) -> Result<Vec<YearVisibilityRow>, RosterError>;

    /// Validates, uploads the image, then stores the member.
    ///
    /// # Errors
    ///
    /// [`RosterError::ValidationFailed`] leaves nothing stored and makes no upload.
    async fn insert_member(&self, new: NewMember) -> Result<RosterMember, RosterError>;

    async fn delete_member(&self, id: i32) -> Result<(), RosterError>;

    async fn add_role(&self, role_name: &str, rank: i32) -> Result<RoleRank, RosterError>;

    async fn list_roles(&self) -> Result<Vec<RoleRank>, RosterError>;
}
