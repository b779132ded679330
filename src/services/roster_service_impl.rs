//! `SeaORM` implementation of the `RosterService` trait.

use std::sync::Arc;

use crate::db::{
    RoleRank, RosterMember, RosterMemberInput, Store, YearVisibilityRow, unique_violation,
};
use crate::domain::{YearRange, sort_year_ranges};
use crate::services::image_host::ImageHost;
use crate::services::roster_service::{
    NewMember, RosterError, RosterService, RosterView, order_by_rank,
};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmRosterService {
    store: Store,
    image_host: Arc<dyn ImageHost>,
}

impl SeaOrmRosterService {
    #[must_use]
    pub fn new(store: Store, image_host: Arc<dyn ImageHost>) -> Self {
        Self { store, image_host }
    }
}

fn parse_year(year_range: &str) -> Result<YearRange, RosterError> {
    year_range
        .trim()
        .parse::<YearRange>()
        .map_err(|e| RosterError::ValidationFailed(e.to_string()))
}

fn require(field: &str, value: &str) -> Result<(), RosterError> {
    if value.trim().is_empty() {
        return Err(RosterError::ValidationFailed(format!("{field} is required")));
    }
    Ok(())
}

#[async_trait]
impl RosterService for SeaOrmRosterService {
    async fn list_year_ranges(&self) -> Result<Vec<String>, RosterError> {
        let ranges = self.store.distinct_year_ranges().await?;
        Ok(sort_year_ranges(ranges))
    }

    async fn list_members(&self, year_range: &str) -> Result<RosterView, RosterError> {
        let year = parse_year(year_range)?;

        let members = self.store.list_roster_members(year.as_str()).await?;
        let ranks = self.store.role_rank_map().await?;
        let visibility = self.store.get_year_visibility(year.as_str()).await?;

        Ok(RosterView {
            year_range: year.to_string(),
            hidden: visibility.as_ref().is_some_and(|v| v.hidden),
            show_toggle_delete: visibility.as_ref().is_none_or(|v| v.show_toggle_delete),
            members: order_by_rank(members, &ranks),
        })
    }

    async fn set_year_hidden(&self, year_range: &str, hidden: bool) -> Result<(), RosterError> {
        let year = parse_year(year_range)?;
        self.store.set_year_hidden(year.as_str(), hidden).await?;
        info!(year_range = %year, hidden, "Year visibility updated");
        Ok(())
    }

    async fn hide_toggle_delete(&self, year_range: &str) -> Result<(), RosterError> {
        let year = parse_year(year_range)?;
        self.store.hide_toggle_delete(year.as_str()).await?;
        info!(year_range = %year, "Year hidden and delete toggle retired");
        Ok(())
    }

    async fn hidden_years(&self) -> Result<Vec<YearVisibilityRow>, RosterError> {
        Ok(self.store.list_hidden_years().await?)
    }

    async fn insert_member(&self, new: NewMember) -> Result<RosterMember, RosterError> {
        require("name", &new.name)?;
        require("email", &new.email)?;
        require("role", &new.role)?;
        require("department", &new.department)?;
        require("profileLink", &new.profile_link)?;
        require("image", &new.image)?;
        let year = parse_year(&new.year_range)?;

        let image_url = self.image_host.upload(&new.image).await?;

        let member = self
            .store
            .add_roster_member(RosterMemberInput {
                name: new.name.trim().to_string(),
                email: new.email.trim().to_string(),
                role: new.role.trim().to_string(),
                department: new.department.trim().to_string(),
                profile_link: new.profile_link.trim().to_string(),
                image_url,
                year_range: year.to_string(),
            })
            .await?;

        Ok(member)
    }

    async fn delete_member(&self, id: i32) -> Result<(), RosterError> {
        if self.store.delete_roster_member(id).await? {
            info!(member_id = id, "Roster member deleted");
            Ok(())
        } else {
            Err(RosterError::NotFound(format!("Roster member {id}")))
        }
    }

    async fn add_role(&self, role_name: &str, rank: i32) -> Result<RoleRank, RosterError> {
        let role_name = role_name.trim();
        require("roleName", role_name)?;
        if rank < 0 {
            return Err(RosterError::ValidationFailed(
                "rank must not be negative".to_string(),
            ));
        }

        match self.store.add_role_rank(role_name, rank).await {
            Ok(role) => {
                info!(role = %role.role_name, rank = role.rank, "Role added");
                Ok(role)
            }
            Err(e) if unique_violation(&e).is_some() => Err(RosterError::Conflict(format!(
                "Role '{role_name}' already exists"
            ))),
            Err(e) => Err(RosterError::Database(e.to_string())),
        }
    }

    async fn list_roles(&self) -> Result<Vec<RoleRank>, RosterError> {
        Ok(self.store.list_role_ranks().await?)
    }
}
